//! Persistence seam for prompt/response history.

use crate::models::HistoryRecord;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Number of records `GET /history` returns.
pub const HISTORY_LIMIT: i64 = 10;

/// Append-only, time-ordered store of [`HistoryRecord`]s.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist `record` and return it with its assigned id.
    async fn append(&self, record: HistoryRecord) -> Result<HistoryRecord, AppError>;

    /// Up to `limit` records, newest `date` first; ties newest insert first.
    async fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;

    /// Verify the store is reachable and create whatever it needs
    /// (indexes). Safe to repeat.
    async fn prepare(&self) -> Result<(), AppError>;
}

/// In-process store backing the router tests. No configuration selects it;
/// the service binary always runs against MongoDB.
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
    unavailable: AtomicBool,
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "memory store marked unavailable"
            )));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<HistoryRecord>>, AppError> {
        self.records
            .lock()
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Memory store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, mut record: HistoryRecord) -> Result<HistoryRecord, AppError> {
        self.ensure_available()?;
        record.id = Some(ObjectId::new());
        self.lock()?.push(record.clone());
        Ok(record)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<HistoryRecord>, AppError> {
        self.ensure_available()?;
        let mut records: Vec<HistoryRecord> = self.lock()?.iter().rev().cloned().collect();
        // Stable sort keeps reverse insertion order among equal dates.
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.ensure_available()
    }

    async fn prepare(&self) -> Result<(), AppError> {
        self.ensure_available()
    }
}
