/// Errors that can occur across the Lookout workflow.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate renders it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use lookout_core::LookoutError;
///
/// let err = LookoutError::Config("missing API key".into());
/// assert!(err.to_string().contains("missing API key"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LookoutError {
    /// Console or filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// GitHub API failure, carrying the response status and body.
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Agent runtime failure: transport errors, malformed responses, or a
    /// generation run that ended in a non-complete state.
    #[error("agent error: {0}")]
    Agent(String),

    /// Agent provider quota exhaustion. Kept separate from [`Self::Agent`]
    /// so the binary can render the dedicated remedy text.
    #[error("agent quota exhausted: {0}")]
    Quota(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LookoutError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = LookoutError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn github_error_keeps_status_text() {
        let err = LookoutError::GitHub("GitHub API error 404: Not Found".into());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn quota_is_distinct_from_agent() {
        let err = LookoutError::Quota("429".into());
        assert!(matches!(err, LookoutError::Quota(_)));
        assert!(err.to_string().contains("quota exhausted"));
    }
}
