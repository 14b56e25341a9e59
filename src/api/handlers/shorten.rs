//! Handler for the shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL.
///
/// # Endpoint
///
/// `POST /api/v1/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_code": "my-link",  // optional
///   "ttl": 86400               // optional, seconds
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "short_code": "my-link",
///   "short_url": "http://localhost:3000/my-link",
///   "original_url": "https://example.com/some/long/path",
///   "created_at": "2025-01-01T12:00:00Z",
///   "expires_at": "2025-01-02T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request for an unparseable body, invalid URL, invalid custom code or ttl.
/// Returns 409 Conflict if the custom code is bound to another URL.
/// Returns 500 Internal Server Error if no free code could be generated.
/// Returns 503 Service Unavailable if the store is unreachable.
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(
            "Malformed request body",
            json!({ "reason": rejection.body_text() }),
        )
    })?;

    payload.validate()?;

    let record = state
        .registry
        .shorten(payload.url, payload.custom_code, payload.ttl)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse::from_record(record, &state.base_url)),
    ))
}
