use std::fmt;

use serde::{Deserialize, Serialize};

/// Coordinates of the pull request under review.
///
/// The number is carried as text end to end: a non-numeric value is
/// interpolated into the URL and fails at the HTTP layer with the GitHub
/// error body instead of being rejected up front.
///
/// # Examples
///
/// ```
/// use lookout_core::PrTarget;
///
/// let target = PrTarget::new("rust-lang", "rust", "12345");
/// assert_eq!(target.to_string(), "rust-lang/rust#12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrTarget {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number, as entered.
    pub number: String,
}

impl PrTarget {
    /// Create a target from its components.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for PrTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Pull request metadata from the GitHub API.
///
/// Only the fields the workflow reads are deserialized: the title and body
/// feed the review task, the head SHA feeds the review-object fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// PR title, absent on some API responses.
    pub title: Option<String>,
    /// PR description, commonly null.
    pub body: Option<String>,
    /// Head ref of the PR branch.
    pub head: HeadRef,
}

/// Head ref of a pull request; only the commit SHA is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    /// Commit SHA the PR branch points at.
    pub sha: String,
}

/// Structured output of one review generation.
///
/// The single field the agent must return; it is both the response schema
/// sent to the provider and the parsed result.
///
/// # Examples
///
/// ```
/// use lookout_core::ReviewOutput;
///
/// let output: ReviewOutput =
///     serde_json::from_str(r#"{"review_comment": "LGTM"}"#).unwrap();
/// assert_eq!(output.review_comment, "LGTM");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// The review comment to be posted to the GitHub PR.
    pub review_comment: String,
}
