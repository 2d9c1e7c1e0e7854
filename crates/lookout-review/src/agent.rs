use std::fmt;
use std::time::Duration;

use lookout_core::{AgentConfig, LookoutError, ReviewOutput};
use serde_json::{json, Value};

use crate::prompt;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Completion status of one generation run.
///
/// # Examples
///
/// ```
/// use lookout_review::agent::RunState;
///
/// let state = RunState::Incomplete("MAX_TOKENS".into());
/// assert_ne!(state, RunState::Complete);
/// assert_eq!(state.to_string(), "MAX_TOKENS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// The model finished normally and produced a full response.
    Complete,
    /// The run ended early; carries the provider's finish reason.
    Incomplete(String),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Complete => write!(f, "COMPLETE"),
            RunState::Incomplete(reason) => write!(f, "{reason}"),
        }
    }
}

/// Result of one generation request against the agent runtime.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Completion status reported by the provider.
    pub state: RunState,
    /// Parsed structured output, present only on complete runs.
    pub output: Option<ReviewOutput>,
}

/// Gemini `generateContent` client.
///
/// Each request constrains the response to the one-field review schema via
/// `responseMimeType` + `responseSchema`, so the model answers with a JSON
/// object matching [`ReviewOutput`].
pub struct AgentClient {
    http: reqwest::Client,
    config: AgentConfig,
    api_key: String,
}

impl AgentClient {
    /// Create a new agent client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] if no API key is available, or
    /// [`LookoutError::Agent`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, LookoutError> {
        let api_key = config.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LookoutError::Agent(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            config: config.clone(),
            api_key,
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one generation request and return the run result.
    ///
    /// The call blocks until the provider answers. A non-success status is
    /// classified before being returned, so quota exhaustion surfaces as
    /// [`LookoutError::Quota`].
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Agent`] on transport or response-shape
    /// failures, [`LookoutError::Quota`] on classified quota errors.
    pub async fn generate(&self, task: &str) -> Result<AgentRun, LookoutError> {
        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!(
            "{base_url}/v1beta/models/{}:generateContent",
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&build_request_body(task))
            .send()
            .await
            .map_err(|e| LookoutError::Agent(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body_text));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| LookoutError::Agent(format!("failed to parse response: {e}")))?;

        parse_run(&response_body)
    }
}

/// Build the `generateContent` request with the structured-output schema.
fn build_request_body(task: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": task }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "review_comment": {
                        "type": "STRING",
                        "description": "The review comment to be posted to the GitHub PR",
                    },
                },
                "required": ["review_comment"],
            },
        },
    })
}

/// Map a `generateContent` response onto an [`AgentRun`].
///
/// `finishReason: STOP` is the complete state; any other reason (MAX_TOKENS,
/// SAFETY, ...) yields an incomplete run that the pipeline treats as fatal.
fn parse_run(body: &Value) -> Result<AgentRun, LookoutError> {
    let Some(candidate) = body.get("candidates").and_then(|c| c.get(0)) else {
        return Err(LookoutError::Agent(format!(
            "no candidates in response: {body}"
        )));
    };

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|r| r.as_str())
        .unwrap_or("UNKNOWN");
    if finish_reason != "STOP" {
        return Ok(AgentRun {
            state: RunState::Incomplete(finish_reason.to_string()),
            output: None,
        });
    }

    let text = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| LookoutError::Agent(format!("unexpected response structure: {body}")))?;

    let output = prompt::parse_review_output(text)?;
    Ok(AgentRun {
        state: RunState::Complete,
        output: Some(output),
    })
}

/// Classify a non-success agent response.
///
/// The structured signal wins: HTTP 429 or an error body whose
/// `error.status` is `RESOURCE_EXHAUSTED` is a quota error. Substring
/// matching on the raw text is kept only as the fallback for bodies that
/// are not JSON.
fn classify_error(status: u16, body: &str) -> LookoutError {
    let detail = format!("agent API error {status}: {body}");

    if status == 429 {
        return LookoutError::Quota(detail);
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        let error_status = parsed
            .get("error")
            .and_then(|e| e.get("status"))
            .and_then(|s| s.as_str());
        if error_status == Some("RESOURCE_EXHAUSTED") {
            return LookoutError::Quota(detail);
        }
    }
    if body.contains("ResourceExhausted") || body.contains("quota") {
        return LookoutError::Quota(detail);
    }

    LookoutError::Agent(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_requires_api_key_or_env() {
        let config = AgentConfig {
            api_key: Some("test-key".into()),
            ..AgentConfig::default()
        };
        let client = AgentClient::new(&config).unwrap();
        assert_eq!(client.model(), "gemini-1.5-flash-latest");
    }

    #[test]
    fn request_body_carries_schema() {
        let body = build_request_body("review this");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "review this");
        let schema = &body["generationConfig"]["responseSchema"];
        assert_eq!(schema["required"][0], "review_comment");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn parse_run_complete() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": r#"{"review_comment": "Nice work"}"# }],
                    "role": "model",
                },
                "finishReason": "STOP",
            }],
        });
        let run = parse_run(&body).unwrap();
        assert_eq!(run.state, RunState::Complete);
        assert_eq!(run.output.unwrap().review_comment, "Nice work");
    }

    #[test]
    fn parse_run_incomplete_carries_reason() {
        let body = json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }],
        });
        let run = parse_run(&body).unwrap();
        assert_eq!(run.state, RunState::Incomplete("MAX_TOKENS".into()));
        assert!(run.output.is_none());
    }

    #[test]
    fn parse_run_without_candidates_is_error() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(parse_run(&body).is_err());
    }

    #[test]
    fn classify_429_as_quota() {
        let err = classify_error(429, "Too Many Requests");
        assert!(matches!(err, LookoutError::Quota(_)));
    }

    #[test]
    fn classify_structured_resource_exhausted_as_quota() {
        let body = r#"{"error":{"code":403,"message":"limit","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify_error(403, body);
        assert!(matches!(err, LookoutError::Quota(_)));
    }

    #[test]
    fn classify_substring_fallback_as_quota() {
        let err = classify_error(500, "internal: quota exceeded for project");
        assert!(matches!(err, LookoutError::Quota(_)));
        let err = classify_error(500, "ResourceExhausted: slow down");
        assert!(matches!(err, LookoutError::Quota(_)));
    }

    #[test]
    fn classify_other_errors_as_agent() {
        let err = classify_error(500, "internal server error");
        assert!(matches!(err, LookoutError::Agent(_)));
        assert!(err.to_string().contains("500"));
    }
}
