//! Domain models for the relay service.

pub mod history;

pub use history::HistoryRecord;
