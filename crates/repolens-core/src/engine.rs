use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Shape the caller expects back from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    Text,
    Structured,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineReply {
    Text(String),
    Structured(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("analysis engine rejected the credentials: {0}")]
    Unauthenticated(String),
    #[error("network failure talking to the analysis engine: {0}")]
    Network(String),
    #[error("analysis engine returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("analysis engine returned an empty or invalid response")]
    EmptyResponse,
    #[error("analysis engine returned malformed JSON: {0}")]
    MalformedStructuredOutput(String),
    #[error("analysis request was cancelled")]
    Cancelled,
}

/// Generative backend that turns a prompt into text or a JSON value.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    async fn infer(
        &self,
        prompt: &str,
        shape: ReplyShape,
        cancel: &CancellationToken,
    ) -> Result<EngineReply, EngineError>;
}

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|javascript|python|typescript)?\n").expect("invalid fence regex")
});

/// Strips markdown code fences from a raw reply and trims it.
pub fn clean_reply(raw: &str) -> String {
    FENCE_OPEN.replace_all(raw, "").replace("```", "").trim().to_string()
}

/// Converts raw reply text into the requested shape.
pub fn shape_reply(raw: &str, shape: ReplyShape) -> Result<EngineReply, EngineError> {
    let cleaned = clean_reply(raw);
    if cleaned.is_empty() {
        return Err(EngineError::EmptyResponse);
    }

    match shape {
        ReplyShape::Text => Ok(EngineReply::Text(cleaned)),
        ReplyShape::Structured => serde_json::from_str(&cleaned)
            .map(EngineReply::Structured)
            .map_err(|error| EngineError::MalformedStructuredOutput(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn clean_reply_removes_language_fences() {
        let raw = "```json\n{\"a\": 1}\n```\n";
        assert_eq!(clean_reply(raw), "{\"a\": 1}");
    }

    #[test]
    fn clean_reply_removes_bare_fences_and_whitespace() {
        let raw = "  ```\nfn main() {}\n```  ";
        assert_eq!(clean_reply(raw), "fn main() {}");
    }

    #[test]
    fn clean_reply_keeps_unknown_language_tag_text() {
        let raw = "```rust\nfn main() {}\n```";
        assert_eq!(clean_reply(raw), "rust\nfn main() {}");
    }

    #[test]
    fn shape_reply_parses_structured_json() {
        let reply = shape_reply("```json\n[{\"line\": 3}]\n```", ReplyShape::Structured)
            .expect("valid json");
        assert_eq!(reply, EngineReply::Structured(json!([{ "line": 3 }])));
    }

    #[test]
    fn shape_reply_reports_malformed_json() {
        let error = shape_reply("here is your json: {", ReplyShape::Structured)
            .expect_err("malformed");
        assert!(matches!(error, EngineError::MalformedStructuredOutput(_)));
    }

    #[test]
    fn shape_reply_rejects_reply_that_is_only_fences() {
        let error = shape_reply("```\n```", ReplyShape::Text).expect_err("empty");
        assert_eq!(error, EngineError::EmptyResponse);
    }
}
