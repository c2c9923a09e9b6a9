use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::models::HistoryRecord;

/// One element of the `GET /history` array.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryResponse {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub prompt: String,
    pub response: String,
    #[serde(serialize_with = "serialize_millis")]
    pub date: DateTime<Utc>,
}

/// `2024-05-01T12:00:00.000Z`: always three fractional digits, `Z` suffix.
fn serialize_millis<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl From<HistoryRecord> for HistoryEntryResponse {
    fn from(record: HistoryRecord) -> Self {
        Self {
            id: record.id.map(|oid| oid.to_hex()),
            prompt: record.prompt,
            response: record.response,
            date: record.date,
        }
    }
}
