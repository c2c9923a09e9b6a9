#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use relay_service::services::providers::mock::MockTextProvider;
use relay_service::services::MemoryHistoryStore;
use relay_service::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("Response body is not UTF-8")
    }
}

/// Router wired to a scripted provider and an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub provider: Arc<MockTextProvider>,
    pub store: Arc<MemoryHistoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_provider(MockTextProvider::echo())
    }

    pub fn with_provider(provider: MockTextProvider) -> Self {
        let provider = Arc::new(provider);
        let store = Arc::new(MemoryHistoryStore::new());
        let router = build_router(AppState::new(provider.clone(), store.clone()));

        Self {
            router,
            provider,
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn generate(&self, prompt: &str) -> TestResponse {
        self.send(generate_request(prompt)).await
    }
}

/// Drive `router` in-process and collect the whole response.
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn generate_request(prompt: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "prompt": prompt }).to_string()))
        .unwrap()
}
