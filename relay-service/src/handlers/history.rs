use axum::{extract::State, Json};

use crate::dtos::HistoryEntryResponse;
use crate::errors::RelayError;
use crate::services::metrics::record_history_read;
use crate::services::HISTORY_LIMIT;
use crate::startup::AppState;

/// `GET /history`: the most recent exchanges, newest first.
pub async fn history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntryResponse>>, RelayError> {
    let records = state.history.recent(HISTORY_LIMIT).await.map_err(|e| {
        tracing::error!(error = %e, "Error fetching history");
        record_history_read("failed");
        RelayError::FetchHistory(e.into())
    })?;

    tracing::debug!(record_count = records.len(), "Fetched history");
    record_history_read("success");

    Ok(Json(
        records.into_iter().map(HistoryEntryResponse::from).collect(),
    ))
}
