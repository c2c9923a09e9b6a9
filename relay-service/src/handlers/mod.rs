//! HTTP handlers for the relay service.

pub mod generate;
pub mod health;
pub mod history;
pub mod metrics;

pub use generate::generate;
pub use health::{health_check, not_found, readiness_check};
pub use history::history;
pub use self::metrics::metrics_endpoint;
