//! Handler for URL deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::error::AppError;
use crate::state::AppState;

/// Deletes a short code together with its click counter.
///
/// # Endpoint
///
/// `DELETE /api/v1/urls/{short_code}`
///
/// # Response
///
/// `204 No Content`
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist or has expired.
pub async fn delete_url_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.delete(&short_code).await?;

    Ok(StatusCode::NO_CONTENT)
}
