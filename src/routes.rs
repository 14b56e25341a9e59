//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET    /{short_code}`               - Redirect to the original URL
//! - `GET    /health`                     - Store connectivity check (never rate limited)
//! - `GET    /metrics`                    - Prometheus counters (never rate limited)
//! - `POST   /api/v1/shorten`             - Create a short URL
//! - `GET    /api/v1/stats/{short_code}`  - Click statistics
//! - `DELETE /api/v1/urls/{short_code}`   - Delete a short URL
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-client fixed window shared through the store
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, metrics_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// Whether the client address is taken from proxy headers is decided by
/// `state.behind_proxy`; enable it only behind a trusted reverse proxy.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
pub fn router(state: AppState) -> Router {
    let limited = Router::new()
        .route("/{short_code}", get(redirect_handler))
        .nest("/api/v1", api::routes::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::layer,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(limited)
        .with_state(state)
        .layer(tracing::layer())
}
