use std::sync::Arc;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::services::{RateLimiter, UrlRegistry};
use crate::config::Config;
use crate::domain::repositories::KvStore;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<UrlRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
    pub store: Arc<dyn KvStore>,
    /// Public origin used to build `short_url`, without trailing slash.
    pub base_url: String,
    pub behind_proxy: bool,
    /// Renders `/metrics`; `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires the services on top of `store` as described by `config`.
    pub fn new(store: Arc<dyn KvStore>, config: &Config) -> Self {
        let registry = UrlRegistry::new(store.clone(), config.registry_settings());
        let rate_limiter = RateLimiter::new(
            store.clone(),
            config.rate_limit_requests,
            config.rate_limit_window(),
        );

        Self {
            registry: Arc::new(registry),
            rate_limiter: Arc::new(rate_limiter),
            store,
            base_url: config.base_url.clone(),
            behind_proxy: config.behind_proxy,
            metrics: config
                .metrics_enabled
                .then(crate::observability::prometheus_handle),
            started_at: Instant::now(),
        }
    }
}
