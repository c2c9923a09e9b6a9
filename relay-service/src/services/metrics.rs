//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics recorder and renders the /metrics payload.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Safe to call more than once; only the first call installs a recorder.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if let Err(e) = metrics::set_global_recorder(recorder) {
            tracing::warn!("Global metrics recorder already set: {}", e);
        }
        handle
    });
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Count a `/generate` outcome: `success`, `generation_failed` or `persist_failed`.
pub fn record_generation(outcome: &'static str) {
    counter!("relay_generations_total", "outcome" => outcome).increment(1);
}

/// Count a `/history` outcome: `success` or `failed`.
pub fn record_history_read(outcome: &'static str) {
    counter!("relay_history_reads_total", "outcome" => outcome).increment(1);
}
