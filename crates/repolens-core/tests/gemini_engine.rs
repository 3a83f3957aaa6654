use pretty_assertions::assert_eq;
use repolens_core::engine::{AnalysisEngine, EngineError, EngineReply, ReplyShape};
use repolens_core::gemini::GeminiEngine;
use secrecy::SecretBox;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn key() -> Option<SecretBox<String>> {
    Some(SecretBox::new(Box::new("test-key".to_string())))
}

fn reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            {"content": {"role": "model", "parts": [{"text": text}]}}
        ]
    })
}

async fn mount_reply(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(text)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn text_reply_is_cleaned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({"contents": [{"parts": [{"text": "explain"}]}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(
            "```python\ndef add(a, b):\n    return a + b\n```\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let reply = engine
        .infer("explain", ReplyShape::Text, &CancellationToken::new())
        .await
        .expect("reply");

    assert_eq!(
        reply,
        EngineReply::Text("def add(a, b):\n    return a + b".to_string())
    );
}

#[tokio::test]
async fn structured_reply_is_parsed_as_json() {
    let server = MockServer::start().await;
    mount_reply(&server, "```json\n{\"name\": \"main.rs\", \"type\": \"file\"}\n```").await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let reply = engine
        .infer("map", ReplyShape::Structured, &CancellationToken::new())
        .await
        .expect("reply");

    assert_eq!(
        reply,
        EngineReply::Structured(json!({"name": "main.rs", "type": "file"}))
    );
}

#[tokio::test]
async fn prose_for_structured_request_is_malformed() {
    let server = MockServer::start().await;
    mount_reply(&server, "Here is your mind map: it has a root.").await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let error = engine
        .infer("map", ReplyShape::Structured, &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert!(
        matches!(error, EngineError::MalformedStructuredOutput(_)),
        "{error:?}"
    );
}

#[tokio::test]
async fn missing_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let error = engine
        .infer("x", ReplyShape::Text, &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(error, EngineError::EmptyResponse);
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", None).expect("engine");
    let error = engine
        .infer("x", ReplyShape::Text, &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert!(matches!(error, EngineError::Unauthenticated(_)), "{error:?}");
}

#[tokio::test]
async fn rejected_key_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let error = engine
        .infer("x", ReplyShape::Text, &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(
        error,
        EngineError::Unauthenticated("API key not valid".to_string())
    );
}

#[tokio::test]
async fn server_error_keeps_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded."}
        })))
        .mount(&server)
        .await;

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let error = engine
        .infer("x", ReplyShape::Text, &CancellationToken::new())
        .await
        .expect_err("should fail");

    assert_eq!(
        error,
        EngineError::Api {
            status: 503,
            message: "The model is overloaded.".to_string(),
        }
    );
}

#[tokio::test]
async fn cancelled_token_returns_cancelled() {
    let server = MockServer::start().await;
    mount_reply(&server, "late").await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let engine = GeminiEngine::new(&server.uri(), "gemini-test", key()).expect("engine");
    let error = engine
        .infer("x", ReplyShape::Text, &cancel)
        .await
        .expect_err("should be cancelled");

    assert_eq!(error, EngineError::Cancelled);
}
