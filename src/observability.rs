//! Prometheus exposition of the process-wide `metrics` recorder.
//!
//! # Counters
//!
//! - `urls_created_total` - short URLs created
//! - `urls_redirected_total` - successful redirects
//! - `urls_not_found_total` - lookups of unknown or expired codes
//! - `rate_limited_total` - requests rejected by the rate limiter

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::warn;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Returns the handle used to render `/metrics`, installing the Prometheus
/// recorder on first call.
///
/// Safe to call any number of times; every caller shares one recorder.
pub fn prometheus_handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();

            if let Err(e) = metrics::set_global_recorder(recorder) {
                warn!("Another metrics recorder is installed, /metrics stays empty: {}", e);
            }
            describe();

            handle
        })
        .clone()
}

fn describe() {
    metrics::describe_counter!("urls_created_total", "Short URLs created");
    metrics::describe_counter!("urls_redirected_total", "Successful redirects");
    metrics::describe_counter!(
        "urls_not_found_total",
        "Lookups of unknown or expired short codes"
    );
    metrics::describe_counter!("rate_limited_total", "Requests rejected by the rate limiter");
}
