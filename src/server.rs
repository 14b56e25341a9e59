//! HTTP server initialization and runtime setup.
//!
//! Handles store selection, background maintenance, and the Axum server lifecycle.

use crate::config::Config;
use crate::domain::repositories::KvStore;
use crate::infrastructure::store::{MemoryStore, RedisStore};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How often the in-process store drops expired entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Redis store (or the in-process store when Redis is not configured)
/// - Axum HTTP server with graceful shutdown on Ctrl+C / SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Redis is configured but unreachable
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let store = connect_store(&config).await?;

    let state = AppState::new(store, &config);

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Picks the store backend.
///
/// A configured Redis that cannot be reached is fatal: silently falling back
/// to process-local state would split data between instances.
async fn connect_store(config: &Config) -> Result<Arc<dyn KvStore>> {
    if let Some(redis_url) = &config.redis_url {
        let store = RedisStore::connect(
            redis_url,
            config.store_timeout(),
            config.store_max_retries,
        )
        .await
        .context("Failed to connect to Redis")?;

        return Ok(Arc::new(store));
    }

    tracing::warn!(
        "REDIS_URL is not set: using the in-process store. Data is lost on restart \
         and limits are not shared between instances."
    );

    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn KvStore> = memory.clone();
    tokio::spawn(purge_loop(memory));

    Ok(store)
}

async fn purge_loop(store: Arc<MemoryStore>) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let purged = store.purge_expired();
        if purged > 0 {
            tracing::debug!("Purged {} expired entries", purged);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
