//! Handler for URL statistics.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click count and metadata of a short code.
///
/// # Endpoint
///
/// `GET /api/v1/stats/{short_code}`
///
/// Reading statistics does not count as a click.
///
/// # Response
///
/// ```json
/// {
///   "short_code": "abc1234",
///   "original_url": "https://example.com",
///   "clicks": 42,
///   "created_at": "2025-01-01T12:00:00Z",
///   "expires_at": null
/// }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist or has expired.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let record = state.registry.stats(&short_code).await?;

    Ok(Json(record.into()))
}
