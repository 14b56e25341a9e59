//! Fixed-window rate limiting middleware backed by the shared store.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;

use crate::domain::entities::RateDecision;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_identity;

pub const X_RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const X_RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Admits or rejects a request based on the client's current window.
///
/// # Key Extraction
///
/// The identity is the socket peer address, or the forwarded client address
/// when the service is configured to run behind a trusted proxy. See
/// [`client_identity`].
///
/// # Headers
///
/// Every response passing through carries:
///
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: requests left in the current window
/// - `X-RateLimit-Reset`: Unix time (seconds) at which the window closes
///
/// Rejected requests get `429 Too Many Requests` with `Retry-After`, which is
/// relative: the number of seconds left in the window.
///
/// # Errors
///
/// Returns `503 Service Unavailable` if the store cannot be reached.
///
/// # Example
///
/// ```rust,ignore
/// let limited = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(peer)) => client_identity(req.headers(), *peer, st.behind_proxy),
        None => "unknown".to_string(),
    };

    let decision = st.rate_limiter.allow(&identity).await?;

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        AppError::RateLimited {
            retry_after_secs: decision.retry_after_secs(),
            limit: decision.limit,
        }
        .into_response()
    };

    apply_headers(response.headers_mut(), &decision, Utc::now());

    Ok(response)
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateDecision, now: DateTime<Utc>) {
    let reset_at = now
        .timestamp()
        .saturating_add_unsigned(decision.retry_after_secs());

    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(reset_at));
}
