use std::future::Future;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub(crate) const USER_AGENT: &str = concat!("repolens/", env!("CARGO_PKG_VERSION"));

/// Resolves to `None` as soon as `cancel` fires, without polling `work` further.
pub(crate) async fn until_cancelled<F, T>(cancel: &CancellationToken, work: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        value = work => Some(value),
    }
}

#[derive(Deserialize)]
struct FlatMessage {
    message: Option<String>,
}

#[derive(Deserialize)]
struct NestedMessage {
    error: Option<FlatMessage>,
}

/// Pulls a human-readable message out of an API error body.
///
/// Accepts `{"message": ...}` and `{"error": {"message": ...}}`; falls back to
/// the trimmed body text.
pub(crate) fn api_error_message(body: &str) -> String {
    if let Ok(NestedMessage {
        error: Some(FlatMessage {
            message: Some(message),
        }),
    }) = serde_json::from_str::<NestedMessage>(body)
    {
        return message;
    }

    if let Ok(FlatMessage {
        message: Some(message),
    }) = serde_json::from_str::<FlatMessage>(body)
    {
        return message;
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no error details".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::{api_error_message, until_cancelled};

    #[test]
    fn api_error_message_reads_nested_and_flat_shapes() {
        assert_eq!(
            api_error_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#),
            "API key not valid"
        );
        assert_eq!(api_error_message(r#"{"message":"Not Found"}"#), "Not Found");
        assert_eq!(api_error_message("  upstream exploded \n"), "upstream exploded");
        assert_eq!(api_error_message(""), "no error details");
    }

    #[tokio::test]
    async fn until_cancelled_short_circuits_pending_work() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = until_cancelled(&cancel, std::future::pending::<u8>()).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn until_cancelled_returns_completed_work() {
        let cancel = CancellationToken::new();
        let result = until_cancelled(&cancel, async { 7 }).await;
        assert_eq!(result, Some(7));
    }
}
