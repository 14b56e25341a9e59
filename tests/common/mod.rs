#![allow(dead_code)]

use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use snapurl::config::Config;
use snapurl::domain::entities::UrlRecord;
use snapurl::domain::repositories::{KvStore, SetMode, clicks_key, record_key};
use snapurl::infrastructure::store::MemoryStore;
use snapurl::routes::router;
use snapurl::state::AppState;
use snapurl::utils::code_generator::Alphabet;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub fn test_config() -> Config {
    Config {
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: "https://sho.rt".to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        metrics_enabled: true,
        short_code_length: 7,
        short_code_alphabet: Alphabet::Alphanumeric,
        url_ttl_seconds: 2_592_000,
        custom_code_min_length: 4,
        custom_code_max_length: 20,
        max_collision_retries: 5,
        rate_limit_requests: 1000,
        rate_limit_window_seconds: 60,
        store_timeout_ms: 2000,
        store_max_retries: 3,
    }
}

pub fn create_test_state(config: &Config) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), config);
    (state, store)
}

/// Full application router as seen from `peer`.
pub fn create_test_server_from(config: &Config, peer: &str) -> (TestServer, Arc<MemoryStore>) {
    let (state, store) = create_test_state(config);
    let app: Router = router(state).layer(MockConnectInfoLayer::new(peer));
    (TestServer::new(app).unwrap(), store)
}

pub fn create_test_server() -> (TestServer, Arc<MemoryStore>) {
    create_test_server_from(&test_config(), "127.0.0.1:12345")
}

pub async fn insert_record(store: &MemoryStore, code: &str, url: &str, clicks: u64) {
    let record = UrlRecord::new(code.to_string(), url.to_string(), Utc::now(), 3600).unwrap();
    write_record(store, &record, clicks).await;
}

/// Stores a record whose logical expiry has passed but which the store
/// still holds.
pub async fn insert_expired_record(store: &MemoryStore, code: &str, url: &str) {
    let record = UrlRecord::new(
        code.to_string(),
        url.to_string(),
        Utc::now() - Duration::hours(2),
        3600,
    )
    .unwrap();
    write_record(store, &record, 5).await;
}

async fn write_record(store: &MemoryStore, record: &UrlRecord, clicks: u64) {
    let value = serde_json::to_vec(record).unwrap();
    store
        .set_with_ttl(
            &record_key(&record.short_code),
            &value,
            None,
            SetMode::Overwrite,
        )
        .await
        .unwrap();
    store
        .set_with_ttl(
            &clicks_key(&record.short_code),
            clicks.to_string().as_bytes(),
            None,
            SetMode::Overwrite,
        )
        .await
        .unwrap();
}

#[derive(Clone)]
pub struct MockConnectInfoLayer {
    addr: SocketAddr,
}

impl MockConnectInfoLayer {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.parse().unwrap(),
        }
    }
}

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService {
            inner,
            addr: self.addr,
        }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
    addr: SocketAddr,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(ConnectInfo(self.addr));
        self.inner.call(req)
    }
}
