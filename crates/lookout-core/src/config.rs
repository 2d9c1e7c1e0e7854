use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LookoutError;

/// Top-level configuration loaded from `.lookout.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// The binary loads this once at startup and passes it down explicitly; no
/// code below `main` reads ambient environment state.
///
/// # Examples
///
/// ```
/// use lookout_core::LookoutConfig;
///
/// let config = LookoutConfig::default();
/// assert_eq!(config.agent.model, "gemini-1.5-flash-latest");
/// assert_eq!(config.github.api_base, "https://api.github.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookoutConfig {
    /// Agent runtime (LLM provider) settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// GitHub API settings and optional review target.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl LookoutConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Io`] if the file cannot be read, or
    /// [`LookoutError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use lookout_core::LookoutConfig;
    /// use std::path::Path;
    ///
    /// let config = LookoutConfig::from_file(Path::new(".lookout.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, LookoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use lookout_core::LookoutConfig;
    ///
    /// let toml = r#"
    /// [agent]
    /// model = "gemini-1.5-pro"
    /// "#;
    /// let config = LookoutConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.agent.model, "gemini-1.5-pro");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, LookoutError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Agent runtime configuration.
///
/// # Examples
///
/// ```
/// use lookout_core::AgentConfig;
///
/// let config = AgentConfig::default();
/// assert_eq!(config.provider, "google");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Provider name (only `"google"` is currently wired up).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
}

impl AgentConfig {
    /// Effective API key: the configured value, then `GOOGLE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] naming the missing variable when
    /// neither source is set.
    pub fn resolve_api_key(&self) -> Result<String, LookoutError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var("GOOGLE_API_KEY").map_err(|_| {
            LookoutError::Config(
                "GOOGLE_API_KEY is not set. Export it or set api_key in .lookout.toml under [agent]"
                    .into(),
            )
        })
    }
}

fn default_provider() -> String {
    "google".into()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

/// GitHub API configuration and optional pre-seeded review target.
///
/// The target fields mirror the `GITHUB_REPO_OWNER` / `GITHUB_REPO_NAME` /
/// `GITHUB_PR_NUMBER` environment variables; anything still missing is asked
/// for interactively. `pr_number` is text on purpose: a non-numeric value is
/// passed through and fails at the HTTP layer.
///
/// # Examples
///
/// ```
/// use lookout_core::GitHubConfig;
///
/// let config = GitHubConfig::default();
/// assert_eq!(config.api_base, "https://api.github.com");
/// assert!(config.owner.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API token for GitHub.
    pub token: Option<String>,
    /// Base URL for API requests (override for GitHub Enterprise).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Repository owner of the pull request to review.
    pub owner: Option<String>,
    /// Repository name of the pull request to review.
    pub repo: Option<String>,
    /// Pull request number to review.
    pub pr_number: Option<String>,
}

impl GitHubConfig {
    /// Effective token: the configured value, then `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::Config`] naming the missing variable when
    /// neither source is set.
    pub fn resolve_token(&self) -> Result<String, LookoutError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        std::env::var("GITHUB_TOKEN").map_err(|_| {
            LookoutError::Config(
                "GITHUB_TOKEN is not set. Export it or set token in .lookout.toml under [github]"
                    .into(),
            )
        })
    }
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            owner: None,
            repo: None,
            pr_number: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = LookoutConfig::default();
        assert_eq!(config.agent.provider, "google");
        assert_eq!(config.agent.model, "gemini-1.5-flash-latest");
        assert!(config.agent.api_key.is_none());
        assert!(config.agent.base_url.is_none());
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert!(config.github.pr_number.is_none());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[agent]
model = "gemini-1.5-pro"
"#;
        let config = LookoutConfig::from_toml(toml).unwrap();
        assert_eq!(config.agent.model, "gemini-1.5-pro");
        assert_eq!(config.agent.provider, "google");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[agent]
provider = "google"
model = "gemini-2.0-flash"
base_url = "https://generativelanguage.googleapis.com"

[github]
api_base = "https://github.example.com/api/v3"
owner = "octocat"
repo = "hello-world"
pr_number = "42"
"#;
        let config = LookoutConfig::from_toml(toml).unwrap();
        assert_eq!(config.agent.model, "gemini-2.0-flash");
        assert_eq!(
            config.agent.base_url.as_deref(),
            Some("https://generativelanguage.googleapis.com")
        );
        assert_eq!(config.github.api_base, "https://github.example.com/api/v3");
        assert_eq!(config.github.owner.as_deref(), Some("octocat"));
        assert_eq!(config.github.pr_number.as_deref(), Some("42"));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = LookoutConfig::from_toml("").unwrap();
        assert_eq!(config.agent.model, "gemini-1.5-flash-latest");
        assert_eq!(config.github.api_base, "https://api.github.com");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = LookoutConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn configured_api_key_wins_over_env() {
        let config = AgentConfig {
            api_key: Some("config-key".into()),
            ..AgentConfig::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "config-key");
    }

    #[test]
    fn configured_token_wins_over_env() {
        let config = GitHubConfig {
            token: Some("ghp_config".into()),
            ..GitHubConfig::default()
        };
        assert_eq!(config.resolve_token().unwrap(), "ghp_config");
    }

    #[test]
    fn pr_number_stays_text() {
        let toml = r#"
[github]
pr_number = "not-a-number"
"#;
        let config = LookoutConfig::from_toml(toml).unwrap();
        assert_eq!(config.github.pr_number.as_deref(), Some("not-a-number"));
    }
}
