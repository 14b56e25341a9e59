//! Handler for the Prometheus scrape endpoint.

use axum::{extract::State, http::header, response::IntoResponse};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Renders all counters in the Prometheus text format.
///
/// # Endpoint
///
/// `GET /metrics`
///
/// Not rate limited, so scrapers are never turned away.
///
/// # Errors
///
/// Returns 404 Not Found when `METRICS_ENABLED` is off.
pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| AppError::not_found("Metrics disabled", json!({})))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
