use lookout_core::{LookoutError, PullRequest, ReviewOutput};

/// Compose the review task embedding the PR title, body, and full diff.
///
/// A missing title or body degrades to `N/A` rather than failing; the diff
/// is embedded verbatim.
///
/// # Examples
///
/// ```
/// use lookout_core::{HeadRef, PullRequest};
/// use lookout_review::prompt::build_review_task;
///
/// let pr = PullRequest {
///     title: Some("Fix widget".into()),
///     body: None,
///     head: HeadRef { sha: "abc".into() },
/// };
/// let task = build_review_task(&pr, "+added line");
/// assert!(task.contains("Fix widget"));
/// assert!(task.contains("PR Body: N/A"));
/// ```
pub fn build_review_task(pr: &PullRequest, diff: &str) -> String {
    let title = pr.title.as_deref().unwrap_or("N/A");
    let body = pr.body.as_deref().unwrap_or("N/A");
    format!(
        "Analyze the following GitHub pull request:\n\n\
         PR Title: {title}\n\n\
         PR Body: {body}\n\n\
         Code Diff:\n```\n{diff}\n```\n\n\
         Please provide a comprehensive review including:\n\
         1. Potential issues or problems\n\
         2. Suggestions for improvement\n\
         3. Positive feedback on good practices\n\
         4. Overall assessment\n\n\
         The review should be well-structured and helpful for the PR author."
    )
}

/// Parse the agent's JSON response into a [`ReviewOutput`].
///
/// Handles markdown code fences around the JSON. A response that does not
/// match the one-field schema is an agent contract violation, not a
/// serialization bug.
///
/// # Errors
///
/// Returns [`LookoutError::Agent`] when the response does not match the
/// review schema.
pub fn parse_review_output(response: &str) -> Result<ReviewOutput, LookoutError> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str(cleaned)
        .map_err(|e| LookoutError::Agent(format!("response did not match the review schema: {e}")))
}

fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::HeadRef;

    fn make_pr(title: Option<&str>, body: Option<&str>) -> PullRequest {
        PullRequest {
            title: title.map(str::to_string),
            body: body.map(str::to_string),
            head: HeadRef { sha: "abc123".into() },
        }
    }

    #[test]
    fn task_embeds_title_body_and_diff() {
        let pr = make_pr(Some("Add caching"), Some("Speeds up lookups"));
        let task = build_review_task(&pr, "+let cache = Cache::new();");
        assert!(task.contains("PR Title: Add caching"));
        assert!(task.contains("PR Body: Speeds up lookups"));
        assert!(task.contains("+let cache = Cache::new();"));
    }

    #[test]
    fn task_contains_review_rubric() {
        let pr = make_pr(None, None);
        let task = build_review_task(&pr, "");
        assert!(task.contains("Potential issues or problems"));
        assert!(task.contains("Suggestions for improvement"));
        assert!(task.contains("Positive feedback on good practices"));
        assert!(task.contains("Overall assessment"));
    }

    #[test]
    fn task_substitutes_missing_fields() {
        let pr = make_pr(None, None);
        let task = build_review_task(&pr, "diff");
        assert!(task.contains("PR Title: N/A"));
        assert!(task.contains("PR Body: N/A"));
    }

    #[test]
    fn parse_valid_output() {
        let output = parse_review_output(r#"{"review_comment": "Looks solid."}"#).unwrap();
        assert_eq!(output.review_comment, "Looks solid.");
    }

    #[test]
    fn parse_output_with_code_fences() {
        let fenced = "```json\n{\"review_comment\": \"ok\"}\n```";
        let output = parse_review_output(fenced).unwrap();
        assert_eq!(output.review_comment, "ok");
    }

    #[test]
    fn parse_output_with_bare_fences() {
        let fenced = "```\n{\"review_comment\": \"ok\"}\n```";
        let output = parse_review_output(fenced).unwrap();
        assert_eq!(output.review_comment, "ok");
    }

    #[test]
    fn parse_missing_field_is_error() {
        let result = parse_review_output(r#"{"verdict": "approve"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn parse_garbage_is_error() {
        let result = parse_review_output("this is not json");
        assert!(result.is_err());
    }
}
