use lookout_core::{GitHubConfig, LookoutError, PrTarget, PullRequest};

const USER_AGENT: &str = "lookout";
const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_DIFF: &str = "application/vnd.github.v3.diff";

/// GitHub pull request client for fetching metadata and diffs and posting
/// reviews.
///
/// All four calls go through the raw REST surface because the publish
/// protocol branches on exact status codes (201 for comments, 200 for
/// review objects).
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    /// Create a client from the GitHub configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] if no token is available.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::GitHubConfig;
    /// use lookout_review::github::GitHubClient;
    ///
    /// let config = GitHubConfig {
    ///     token: Some("ghp_xxxx".into()),
    ///     ..GitHubConfig::default()
    /// };
    /// let client = GitHubClient::new(&config).unwrap();
    /// ```
    pub fn new(config: &GitHubConfig) -> Result<Self, LookoutError> {
        let token = config.resolve_token()?;
        Ok(Self {
            http: reqwest::Client::new(),
            token,
            api_base: config.api_base.clone(),
        })
    }

    fn pulls_url(&self, target: &PrTarget) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, target.owner, target.repo, target.number
        )
    }

    /// Fetch pull request metadata (title, body, head SHA).
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] with the status and body on any
    /// non-200 response.
    pub async fn get_pr(&self, target: &PrTarget) -> Result<PullRequest, LookoutError> {
        let response = self
            .http
            .get(self.pulls_url(target))
            .header("Accept", ACCEPT_JSON)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to fetch PR: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json::<PullRequest>()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to parse PR metadata: {e}")))
    }

    /// Fetch the unified diff for a pull request.
    ///
    /// Same endpoint as [`Self::get_pr`]; only the `Accept` header differs.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] with the status and body on any
    /// non-200 response.
    pub async fn get_pr_diff(&self, target: &PrTarget) -> Result<String, LookoutError> {
        let response = self
            .http
            .get(self.pulls_url(target))
            .header("Accept", ACCEPT_DIFF)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to fetch PR diff: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .text()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to read diff response: {e}")))
    }

    /// Post the review text as a plain issue comment. GitHub answers 201
    /// on creation; anything else is an error carrying status and body.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] on transport failure or a non-201
    /// status.
    pub async fn post_issue_comment(
        &self,
        target: &PrTarget,
        body_text: &str,
    ) -> Result<serde_json::Value, LookoutError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_base, target.owner, target.repo, target.number
        );

        let response = self
            .http
            .post(url)
            .header("Accept", ACCEPT_JSON)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({ "body": body_text }))
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to post comment: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to parse comment response: {e}")))
    }

    /// Post the review as a formal pull request review object against
    /// `commit_id` with a `COMMENT` event. GitHub answers 200 on creation.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::GitHub`] on transport failure or a non-200
    /// status.
    pub async fn post_pr_review(
        &self,
        target: &PrTarget,
        commit_id: &str,
        body_text: &str,
    ) -> Result<serde_json::Value, LookoutError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/reviews",
            self.api_base, target.owner, target.repo, target.number
        );

        let response = self
            .http
            .post(url)
            .header("Accept", ACCEPT_JSON)
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({
                "commit_id": commit_id,
                "body": body_text,
                "event": "COMMENT",
            }))
            .send()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to post review: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| LookoutError::GitHub(format!("failed to parse review response: {e}")))
    }
}

fn api_error(status: u16, body: &str) -> LookoutError {
    LookoutError::GitHub(format!("GitHub API error {status}: {body}"))
}

/// Parse a PR reference string (`owner/repo#number`) into a target.
///
/// Only the structure is validated; the number part is kept as text and a
/// non-numeric value fails later at the HTTP layer.
///
/// # Errors
///
/// Returns [`LookoutError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use lookout_review::github::parse_pr_reference;
///
/// let target = parse_pr_reference("rust-lang/rust#12345").unwrap();
/// assert_eq!(target.owner, "rust-lang");
/// assert_eq!(target.repo, "rust");
/// assert_eq!(target.number, "12345");
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<PrTarget, LookoutError> {
    let Some((owner_repo, number)) = pr_ref.split_once('#') else {
        return Err(LookoutError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let Some((owner, repo)) = owner_repo.split_once('/') else {
        return Err(LookoutError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    if owner.is_empty() || repo.is_empty() || number.is_empty() {
        return Err(LookoutError::Config(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    }
    Ok(PrTarget::new(owner, repo, number))
}
