//! Error types for EventLens.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed request parameters. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure talking to the language-model endpoint.
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Reply had no balanced JSON span, or the span did not decode.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Relevance ranking for a tag or query could not be computed.
    #[error("Ranking failed for '{subject}': {reason}")]
    RankingFailed { subject: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a retry loop may try the same call again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Llm(_) | Error::Timeout { .. } | Error::Parse(_) | Error::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Timeout { timeout_ms: 8000 }.is_transient());
        assert!(Error::Parse("no json".into()).is_transient());
        assert!(!Error::InvalidRequest("no tag".into()).is_transient());
    }

    #[test]
    fn test_ranking_failed_message_echoes_subject() {
        let err = Error::RankingFailed {
            subject: "rust".into(),
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Ranking failed for 'rust': timeout");
    }
}
