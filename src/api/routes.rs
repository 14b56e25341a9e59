//! API route configuration.

use crate::api::handlers::{delete_url_handler, shorten_handler, stats_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Versioned JSON API routes.
///
/// # Endpoints
///
/// - `POST   /shorten`              - Create a short URL
/// - `GET    /stats/{short_code}`   - Click statistics for a short URL
/// - `DELETE /urls/{short_code}`    - Delete a short URL
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/stats/{short_code}", get(stats_handler))
        .route("/urls/{short_code}", delete(delete_url_handler))
}
