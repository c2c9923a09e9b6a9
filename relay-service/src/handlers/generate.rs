use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::dtos::GenerateRequest;
use crate::errors::RelayError;
use crate::models::HistoryRecord;
use crate::services::metrics::record_generation;
use crate::services::providers::ProviderError;
use crate::startup::AppState;

/// `POST /generate`: ask the provider for a completion, record the exchange,
/// and return the generated text as a JSON string.
///
/// Nothing is stored unless generation succeeds. A failed write still fails
/// the request, even though text was generated.
///
/// A body sent without a JSON content type is not parsed and counts as a
/// request with no prompt. Malformed JSON is rejected with a 4xx.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(JsonRejection::MissingJsonContentType(_)) => GenerateRequest::default(),
        Err(rejection) => return rejection.into_response(),
    };

    relay(&state, payload).await.into_response()
}

async fn relay(state: &AppState, payload: GenerateRequest) -> Result<Json<String>, RelayError> {
    let prompt = payload.prompt.ok_or_else(|| {
        generation_failed(ProviderError::InvalidRequest(
            "prompt is required".to_string(),
        ))
    })?;

    let generated = state
        .text_provider
        .generate(&prompt)
        .await
        .map_err(generation_failed)?;

    tracing::info!(
        model = %state.text_provider.model(),
        prompt_len = prompt.len(),
        input_tokens = generated.input_tokens,
        output_tokens = generated.output_tokens,
        "Generated content"
    );

    let record = state
        .history
        .append(HistoryRecord::new(prompt, generated.text))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, stage = "persist", "Error generating content");
            record_generation("persist_failed");
            RelayError::Generate(e.into())
        })?;

    record_generation("success");
    Ok(Json(record.response))
}

fn generation_failed(err: ProviderError) -> RelayError {
    tracing::error!(error = %err, kind = err.kind(), stage = "generate", "Error generating content");
    record_generation("generation_failed");
    RelayError::Generate(err.into())
}
