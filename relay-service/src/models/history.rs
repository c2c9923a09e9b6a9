//! Prompt/response history persisted after each successful generation.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A single prompt and the text the provider produced for it.
///
/// Records are append-only: created once per successful generation and never
/// updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Store-assigned id; `None` until the record has been inserted.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub prompt: String,

    pub response: String,

    /// Creation time, stored as a BSON datetime.
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

impl HistoryRecord {
    /// Create a record stamped with the current time.
    pub fn new(prompt: impl Into<String>, response: impl Into<String>) -> Self {
        Self::at(prompt, response, Utc::now())
    }

    /// Create a record with an explicit creation time.
    pub fn at(prompt: impl Into<String>, response: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            prompt: prompt.into(),
            response: response.into(),
            // BSON datetimes only hold milliseconds.
            date: truncate_to_millis(date),
        }
    }
}

fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(date.timestamp_millis()).unwrap_or(date)
}
