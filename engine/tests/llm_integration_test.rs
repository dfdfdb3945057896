//! Integration tests for the completion client
//!
//! A wiremock server stands in for the hosted endpoint.

use serde_json::json;
use solver_engine::config::LLMConfig;
use solver_engine::llm::{gemini::GeminiProvider, LLMError, LLMProvider, Message};
use solver_engine::secrets::SecretString;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ENDPOINT: &str = "/models/gemini-2.0-flash:generateContent";

fn provider_for(server: &MockServer) -> GeminiProvider {
    let config = LLMConfig {
        base_url: server.uri(),
        ..LLMConfig::default()
    };
    GeminiProvider::new(&config, SecretString::new("test-token-123")).unwrap()
}

fn messages() -> Vec<Message> {
    vec![Message::system("Answer tersely."), Message::user("What is 6 x 7?")]
}

#[tokio::test]
async fn test_generate_sends_bearer_and_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("authorization", "Bearer test-token-123"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "What is 6 x 7?"}]}],
            "systemInstruction": {"parts": [{"text": "Answer tersely."}]},
            "generationConfig": {"temperature": 0},
            "tools": [{"google_search": {}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "42"}]}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = provider_for(&server).generate(&messages()).await.unwrap();
    assert_eq!(answer, "42");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&messages()).await.unwrap_err();
    assert!(matches!(err, LLMError::AuthenticationFailed(ref m) if m == "bad token"));
}

#[tokio::test]
async fn test_rate_limit_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&messages()).await.unwrap_err();
    assert!(matches!(err, LLMError::RateLimitExceeded));
}

#[tokio::test]
async fn test_server_error_maps_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&messages()).await.unwrap_err();
    match err {
        LLMError::ProviderUnavailable(msg) => assert!(msg.contains("overloaded")),
        other => panic!("Expected ProviderUnavailable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_response_without_candidates_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate(&messages()).await.unwrap_err();
    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let config = LLMConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..LLMConfig::default()
    };
    let provider = GeminiProvider::new(&config, SecretString::new("t")).unwrap();

    let err = provider.generate(&messages()).await.unwrap_err();
    assert!(matches!(err, LLMError::NetworkError(_) | LLMError::Timeout));
}

#[test]
fn test_provider_disabled_without_token() {
    let config = LLMConfig {
        api_key_env: "SOLVER_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
        ..LLMConfig::default()
    };
    assert!(GeminiProvider::from_config(&config).unwrap().is_none());
}
