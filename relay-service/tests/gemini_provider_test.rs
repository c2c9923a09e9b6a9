//! Gemini client against a stubbed REST API.

mod common;

use axum::http::StatusCode;
use relay_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use relay_service::services::providers::{ProviderError, TextProvider};
use relay_service::services::{HistoryStore, MemoryHistoryStore, HISTORY_LIMIT};
use relay_service::{build_router, AppState};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

fn provider_for(server: &MockServer) -> GeminiTextProvider {
    let mut config = GeminiConfig::new("test-api-key", "gemini-pro");
    config.api_base = format!("{}/v1beta", server.uri());
    GeminiTextProvider::new(config).expect("Failed to build provider")
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 1, "candidatesTokenCount": 1 }
    }))
}

#[tokio::test]
async fn sends_prompt_and_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-api-key"))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }]
        })))
        .respond_with(text_response("world"))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider_for(&server).generate("hello").await.unwrap();

    assert_eq!(response.text, "world");
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate("hello").await.unwrap_err();

    assert!(matches!(err, ProviderError::RateLimited));
}

#[tokio::test]
async fn server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = provider_for(&server).generate("hello").await.unwrap_err();

    match err {
        ProviderError::ApiError(message) => assert!(message.contains("overloaded")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_api_is_network_error() {
    let mut config = GeminiConfig::new("test-api-key", "gemini-pro");
    config.api_base = "http://127.0.0.1:9/v1beta".to_string();
    let provider = GeminiTextProvider::new(config).unwrap();

    let err = provider.generate("hello").await.unwrap_err();

    assert!(matches!(err, ProviderError::NetworkError(_)));
    assert!(!err.to_string().contains("test-api-key"));
}

#[tokio::test]
async fn generate_route_relays_gemini_output_into_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("Paris"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryHistoryStore::new());
    let router = build_router(AppState::new(
        Arc::new(provider_for(&server)),
        store.clone(),
    ));

    let response = common::send(&router, common::generate_request("Capital of France?")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!("Paris"));

    let records = store.recent(HISTORY_LIMIT).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "Capital of France?");
    assert_eq!(records[0].response, "Paris");
}
