//! Prometheus metrics for the consumer pool
//!
//! Provides observability into delivery throughput and worker health.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize Prometheus metrics
///
/// Call this once at startup. Subsequent calls are no-ops.
pub fn init_metrics() {
    let _ = PROMETHEUS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");
        info!("Prometheus metrics initialized");
        handle
    });
}

/// Get the Prometheus handle for rendering metrics
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render metrics in Prometheus format
pub fn render_metrics() -> String {
    prometheus_handle().map(|h| h.render()).unwrap_or_default()
}

/// Record a delivery processed and acknowledged
pub fn record_processed(processor: &str) {
    counter!(
        "amqp_worker_deliveries_total",
        "processor" => processor.to_string(),
        "outcome" => "acked"
    )
    .increment(1);
}

/// Record a delivery rejected for a content failure
pub fn record_rejected(processor: &str) {
    counter!(
        "amqp_worker_deliveries_total",
        "processor" => processor.to_string(),
        "outcome" => "rejected"
    )
    .increment(1);
}

/// Record a worker entering backoff after a recoverable failure
pub fn record_retry(worker_id: usize) {
    counter!(
        "amqp_worker_retries_total",
        "worker" => worker_id.to_string()
    )
    .increment(1);
}

/// Record a worker giving up after exhausting retries
pub fn record_worker_failed(worker_id: usize) {
    counter!(
        "amqp_worker_failures_total",
        "worker" => worker_id.to_string()
    )
    .increment(1);
}

/// Update the count of live workers in the pool
pub fn set_active_workers(count: usize) {
    gauge!("amqp_worker_active_workers").set(count as f64);
}
