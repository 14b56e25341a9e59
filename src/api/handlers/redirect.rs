//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{short_code}`
///
/// # Request Flow
///
/// 1. Load the record, rejecting unknown and expired codes
/// 2. Atomically increment the click counter
/// 3. Return 301 Moved Permanently
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist or has expired.
/// Returns 503 Service Unavailable if the store is unreachable.
pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let original_url = state.registry.resolve(&short_code).await?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, original_url)]))
}
