//! HTTP contract tests for the classification providers
//!
//! Each backend is exercised against a wiremock server: request shape, answer
//! extraction, and the mapping of HTTP failures into the error taxonomy.

use quire_config::ProviderId;
use quire_core::{
    ClassificationProvider, ClassificationRequest, ClassifyError, TransportKind,
};
use quire_llm::{AnthropicClassifier, OllamaClassifier, OpenAIClassifier};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helper Functions
// ============================================================================

fn create_test_request() -> ClassificationRequest {
    ClassificationRequest {
        trimmed_text: "Negroni: equal parts gin, Campari, vermouth.".to_string(),
        allowed_slugs: vec![
            "cocktails".to_string(),
            "other".to_string(),
            "recipes".to_string(),
        ],
        suggestions_count: 3,
        suggest_tags: false,
        tags_max_count: 5,
        prompt_version: "v1".to_string(),
        system_prompt: "Respond ONLY with a JSON object, no prose.".to_string(),
        user_prompt: "Classify: Negroni".to_string(),
    }
}

fn openai_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

const COCKTAILS_ANSWER: &str =
    r#"{"category_slug": "cocktails", "confidence": 0.9, "reasons": "gin drink", "suggestions": ["recipes"]}"#;

async fn openai_server(status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn openai_provider(server: &MockServer) -> OpenAIClassifier {
    OpenAIClassifier::new(
        "sk-test".to_string(),
        Some(server.uri()),
        "gpt-4o-mini".to_string(),
        5,
    )
}

// ============================================================================
// TEST: OpenAI
// ============================================================================

#[tokio::test]
async fn test_openai_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body(COCKTAILS_ANSWER)))
        .expect(1)
        .mount(&server)
        .await;

    let result = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .expect("classification should succeed");

    assert_eq!(result.category_slug.as_deref(), Some("cocktails"));
    assert_eq!(result.confidence, 0.9);
    assert_eq!(result.suggestions, vec!["recipes"]);
}

#[tokio::test]
async fn test_openai_code_fenced_answer() {
    let fenced = format!("```json\n{COCKTAILS_ANSWER}\n```");
    let server = openai_server(200, openai_body(&fenced)).await;

    let result = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap();

    assert_eq!(result.category_slug.as_deref(), Some("cocktails"));
}

#[tokio::test]
async fn test_openai_rate_limited_is_retryable() {
    let server = openai_server(429, json!({"error": {"message": "slow down"}})).await;

    let err = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::Transport { kind: TransportKind::RateLimited, .. }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_server_error_is_retryable() {
    let server = openai_server(503, json!({"error": "unavailable"})).await;

    let err = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::Transport { kind: TransportKind::Server(503), .. }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_unauthorized_is_configuration_error() {
    let server = openai_server(401, json!({"error": {"message": "invalid api key"}})).await;

    let err = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap_err();

    assert!(matches!(err, ClassifyError::Configuration(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_openai_malformed_envelope_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap_err();

    assert!(err.is_parse());
}

#[tokio::test]
async fn test_openai_non_json_answer_is_parse_error() {
    let server = openai_server(200, openai_body("I think this is about cocktails.")).await;

    let err = openai_provider(&server)
        .classify(&create_test_request())
        .await
        .unwrap_err();

    assert!(err.is_parse());
}

#[tokio::test]
async fn test_openai_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_body(COCKTAILS_ANSWER))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = OpenAIClassifier::new(
        "sk-test".to_string(),
        Some(server.uri()),
        "gpt-4o-mini".to_string(),
        1,
    );
    let err = provider.classify(&create_test_request()).await.unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::Transport { kind: TransportKind::Timeout, .. }
    ));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let provider = OllamaClassifier::new("http://127.0.0.1:1".to_string(), "llama3.2".to_string(), 2);

    let err = provider.classify(&create_test_request()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::Transport { .. }));
    assert!(err.is_retryable());
}

// ============================================================================
// TEST: OpenAI-compatible gateway
// ============================================================================

#[tokio::test]
async fn test_compatible_gateway_without_key() {
    let server = openai_server(200, openai_body(COCKTAILS_ANSWER)).await;

    let provider = OpenAIClassifier::compatible(None, server.uri(), "local-model".to_string(), 5);
    let result = provider.classify(&create_test_request()).await.unwrap();

    assert_eq!(provider.provider_id(), ProviderId::OpenAICompatible);
    assert_eq!(result.category_slug.as_deref(), Some("cocktails"));

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("response_format").is_none());
}

// ============================================================================
// TEST: Anthropic
// ============================================================================

#[tokio::test]
async fn test_anthropic_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                { "type": "text", "text": "```json\n" },
                { "type": "text", "text": COCKTAILS_ANSWER },
                { "type": "text", "text": "\n```" }
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicClassifier::new(
        "sk-ant-test".to_string(),
        Some(server.uri()),
        "claude-3-5-haiku-latest".to_string(),
        5,
    );
    let result = provider.classify(&create_test_request()).await.unwrap();

    assert_eq!(result.category_slug.as_deref(), Some("cocktails"));
    assert_eq!(result.reasons, "gin drink");
}

#[tokio::test]
async fn test_anthropic_forbidden_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let provider = AnthropicClassifier::new(
        "sk-ant-test".to_string(),
        Some(server.uri()),
        "claude-3-5-haiku-latest".to_string(),
        5,
    );
    let err = provider.classify(&create_test_request()).await.unwrap_err();

    assert!(matches!(err, ClassifyError::Configuration(_)));
}

// ============================================================================
// TEST: Ollama
// ============================================================================

#[tokio::test]
async fn test_ollama_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "format": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "message": { "role": "assistant", "content": COCKTAILS_ANSWER },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaClassifier::new(server.uri(), "llama3.2".to_string(), 5);
    let result = provider.classify(&create_test_request()).await.unwrap();

    assert_eq!(result.category_slug.as_deref(), Some("cocktails"));
}

#[tokio::test]
async fn test_ollama_bad_request_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "model not found"})))
        .mount(&server)
        .await;

    let provider = OllamaClassifier::new(server.uri(), "missing".to_string(), 5);
    let err = provider.classify(&create_test_request()).await.unwrap_err();

    assert!(matches!(
        err,
        ClassifyError::Transport { kind: TransportKind::Rejected(404), .. }
    ));
    assert!(err.is_fatal());
}
