use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

/// Liveness check; reports store connectivity.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.history.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "relay-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "relay-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness check: ready once the store answers.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.history.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(anyhow::anyhow!("No route for {}", uri.path()))
}
