use std::fmt;

use lookout_core::{LookoutError, PrTarget};

use crate::github::GitHubClient;

/// Terminal success states of the publish protocol.
///
/// # Examples
///
/// ```
/// use lookout_review::publish::PostOutcome;
///
/// let outcome = PostOutcome::IssueComment { url: None };
/// assert_eq!(outcome.to_string(), "issue comment");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    /// Posted as a plain issue comment.
    IssueComment {
        /// `html_url` of the created comment, when GitHub returned one.
        url: Option<String>,
    },
    /// Posted as a formal pull request review object.
    PullRequestReview {
        /// `html_url` of the created review, when GitHub returned one.
        url: Option<String>,
    },
}

impl PostOutcome {
    /// Web URL of whatever was created, if the API reported one.
    pub fn url(&self) -> Option<&str> {
        match self {
            PostOutcome::IssueComment { url } | PostOutcome::PullRequestReview { url } => {
                url.as_deref()
            }
        }
    }
}

impl fmt::Display for PostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostOutcome::IssueComment { .. } => write!(f, "issue comment"),
            PostOutcome::PullRequestReview { .. } => write!(f, "pull request review"),
        }
    }
}

/// Protocol states of the two-step publisher.
#[derive(Debug)]
enum Attempt {
    /// POST the review as a plain issue comment (expects 201).
    SimpleComment,
    /// POST a formal review object against the head commit (expects 200).
    FormalReview,
}

/// Publish a review using the two-step protocol: try a plain issue comment
/// first, fall back to a formal review object if GitHub rejects it.
///
/// The first attempt's failure is surfaced as a warning line rather than
/// swallowed, so the fallback trigger stays visible to the operator. There
/// is no idempotency guard: re-running after a success posts a duplicate.
///
/// # Errors
///
/// Returns [`LookoutError::GitHub`] if the fallback's metadata re-fetch or
/// review POST fails.
pub async fn publish_review(
    github: &GitHubClient,
    target: &PrTarget,
    review: &str,
) -> Result<PostOutcome, LookoutError> {
    let mut attempt = Attempt::SimpleComment;
    loop {
        match attempt {
            Attempt::SimpleComment => match github.post_issue_comment(target, review).await {
                Ok(created) => {
                    return Ok(PostOutcome::IssueComment {
                        url: extract_html_url(&created),
                    });
                }
                Err(first_failure) => {
                    eprintln!(
                        "warning: issue comment post failed ({first_failure}); \
                         falling back to a pull request review"
                    );
                    attempt = Attempt::FormalReview;
                }
            },
            Attempt::FormalReview => {
                // The metadata fetched before generation was discarded; the
                // head may also have moved since, so re-fetch for the SHA.
                let pr = github.get_pr(target).await?;
                let created = github.post_pr_review(target, &pr.head.sha, review).await?;
                return Ok(PostOutcome::PullRequestReview {
                    url: extract_html_url(&created),
                });
            }
        }
    }
}

fn extract_html_url(value: &serde_json::Value) -> Option<String> {
    value
        .get("html_url")
        .and_then(|u| u.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_html_url_when_present() {
        let created = json!({
            "id": 1,
            "html_url": "https://github.com/o/r/pull/1#issuecomment-1",
        });
        assert_eq!(
            extract_html_url(&created).as_deref(),
            Some("https://github.com/o/r/pull/1#issuecomment-1")
        );
    }

    #[test]
    fn missing_html_url_is_none() {
        let created = json!({ "id": 1 });
        assert!(extract_html_url(&created).is_none());
    }

    #[test]
    fn outcome_display_names_both_terminals() {
        let comment = PostOutcome::IssueComment { url: None };
        let review = PostOutcome::PullRequestReview {
            url: Some("https://example.com".into()),
        };
        assert_eq!(comment.to_string(), "issue comment");
        assert_eq!(review.to_string(), "pull request review");
        assert_eq!(review.url(), Some("https://example.com"));
    }
}
