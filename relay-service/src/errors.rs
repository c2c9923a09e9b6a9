//! Route-level failures for the relay endpoints.
//!
//! The client only ever sees a generic message; the underlying cause is
//! logged where the failure happens.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Generation or persistence failed during `POST /generate`.
    #[error("Failed to generate content")]
    Generate(#[source] anyhow::Error),

    /// Reading history failed during `GET /history`.
    #[error("Failed to fetch history")]
    FetchHistory(#[source] anyhow::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
