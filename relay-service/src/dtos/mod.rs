//! Request and response bodies for the HTTP API.

pub mod generate;
pub mod history;

pub use generate::GenerateRequest;
pub use history::HistoryEntryResponse;
