pub mod database;
pub mod history_store;
pub mod metrics;
pub mod providers;

pub use database::HistoryDb;
pub use history_store::{HistoryStore, MemoryHistoryStore, HISTORY_LIMIT};
pub use self::metrics::{get_metrics, init_metrics};
