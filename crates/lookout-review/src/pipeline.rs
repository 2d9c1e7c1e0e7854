use lookout_core::{LookoutError, PullRequest, ReviewOutput};

use crate::agent::{AgentClient, AgentRun, RunState};
use crate::prompt;

/// A generated review, ready for the confirmation gate.
#[derive(Debug, Clone)]
pub struct GeneratedReview {
    /// The review text to show the operator and, on `send`, post.
    pub review_comment: String,
    /// Model identifier that produced the review.
    pub model_used: String,
}

/// Review orchestrator: builds the task, runs the agent once, and enforces
/// the run-state contract.
pub struct ReviewPipeline {
    agent: AgentClient,
}

impl ReviewPipeline {
    /// Create a pipeline from an agent client.
    pub fn new(agent: AgentClient) -> Self {
        Self { agent }
    }

    /// Generate a review for already-fetched PR metadata and diff.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Agent`] if the generation call fails or the
    /// run ends in a non-complete state, [`LookoutError::Quota`] on
    /// classified quota exhaustion.
    pub async fn generate(
        &self,
        pr: &PullRequest,
        diff: &str,
    ) -> Result<GeneratedReview, LookoutError> {
        let task = prompt::build_review_task(pr, diff);
        let run = self.agent.generate(&task).await?;
        let output = ensure_complete(run)?;
        Ok(GeneratedReview {
            review_comment: output.review_comment,
            model_used: self.agent.model().to_string(),
        })
    }
}

/// Enforce the run-state contract: anything but a complete run with an
/// output aborts the workflow.
fn ensure_complete(run: AgentRun) -> Result<ReviewOutput, LookoutError> {
    match run.state {
        RunState::Complete => run
            .output
            .ok_or_else(|| LookoutError::Agent("run completed without a review output".into())),
        RunState::Incomplete(reason) => Err(LookoutError::Agent(format!(
            "generation run ended in state {reason} instead of COMPLETE"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_run_yields_output() {
        let run = AgentRun {
            state: RunState::Complete,
            output: Some(ReviewOutput {
                review_comment: "Ship it.".into(),
            }),
        };
        let output = ensure_complete(run).unwrap();
        assert_eq!(output.review_comment, "Ship it.");
    }

    #[test]
    fn incomplete_run_is_fatal_and_names_state() {
        let run = AgentRun {
            state: RunState::Incomplete("SAFETY".into()),
            output: None,
        };
        let err = ensure_complete(run).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn complete_run_without_output_is_fatal() {
        let run = AgentRun {
            state: RunState::Complete,
            output: None,
        };
        assert!(ensure_complete(run).is_err());
    }
}
