use std::time::Duration;

use repolens_core::engine::EngineError;
use repolens_core::repo_ref::RepoUrlError;
use repolens_core::source::SourceError;
use thiserror::Error;

/// Action an error belongs to. Recording an error replaces only the
/// previous error of the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorScope {
    Repository,
    File,
    Analysis,
    Snippet,
}

impl ErrorScope {
    pub fn label(self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::File => "file",
            Self::Analysis => "analysis",
            Self::Snippet => "snippet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("superseded by a newer request")]
    Superseded,
    #[error("{0}")]
    SourceUnavailable(String),
    #[error("unusable analysis output: {0}")]
    EmptyOrMalformedOutput(String),
}

impl SessionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn timed_out(limit: Duration) -> Self {
        Self::SourceUnavailable(format!("request timed out after {limit:?}"))
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

impl From<RepoUrlError> for SessionError {
    fn from(error: RepoUrlError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}

impl From<SourceError> for SessionError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Cancelled => Self::Superseded,
            other => Self::SourceUnavailable(other.to_string()),
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Cancelled => Self::Superseded,
            EngineError::EmptyResponse | EngineError::MalformedStructuredOutput(_) => {
                Self::EmptyOrMalformedOutput(error.to_string())
            }
            other => Self::SourceUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_maps_to_superseded() {
        assert!(SessionError::from(SourceError::Cancelled).is_superseded());
        assert!(SessionError::from(EngineError::Cancelled).is_superseded());
    }

    #[test]
    fn transport_and_output_failures_stay_distinct() {
        let transport = SessionError::from(EngineError::Network("connection reset".to_string()));
        let malformed =
            SessionError::from(EngineError::MalformedStructuredOutput("expected value".to_string()));

        assert!(matches!(transport, SessionError::SourceUnavailable(_)));
        assert!(matches!(malformed, SessionError::EmptyOrMalformedOutput(_)));
        assert!(matches!(
            SessionError::from(EngineError::EmptyResponse),
            SessionError::EmptyOrMalformedOutput(_)
        ));
    }

    #[test]
    fn source_failures_are_unavailable_with_message() {
        let error = SessionError::from(SourceError::RateLimited);
        assert!(matches!(error, SessionError::SourceUnavailable(_)));
        assert!(error.to_string().contains("rate limited"));
    }

    #[test]
    fn bad_url_is_invalid_input() {
        let error = SessionError::from(RepoUrlError::Empty);
        assert_eq!(error.to_string(), "invalid input: repository url is empty");
    }

    #[test]
    fn timeout_message_names_the_limit() {
        assert_eq!(
            SessionError::timed_out(Duration::from_secs(60)).to_string(),
            "request timed out after 60s"
        );
    }
}
