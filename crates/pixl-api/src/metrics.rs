//! Prometheus metrics for the API server.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const TRANSFORMS_TOTAL: &str = "pixl_transforms_total";
    pub const TRANSFORM_DURATION_SECONDS: &str = "pixl_transform_duration_seconds";
}

/// Record a completed transform.
pub fn record_transform(kind: &'static str, cached: bool, duration_secs: f64) {
    let labels = [
        ("kind", kind.to_string()),
        ("cached", cached.to_string()),
    ];
    counter!(names::TRANSFORMS_TOTAL, &labels).increment(1);
    histogram!(names::TRANSFORM_DURATION_SECONDS, &labels).record(duration_secs);
}
