//! DTOs for the shortening endpoint.

use crate::domain::entities::UrlRecord;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

/// Compiled regex for custom code validation.
static CUSTOM_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Request to shorten a single URL.
///
/// Field checks here reject obviously malformed input early. Length bounds
/// of custom codes are configurable and enforced by the registry.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten (must be valid HTTP/HTTPS).
    #[validate(length(max = 2048, message = "URL too long"))]
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional custom short code.
    #[validate(regex(
        path = "*CUSTOM_CODE_REGEX",
        message = "Custom code can only contain letters, digits, hyphens and underscores"
    ))]
    pub custom_code: Option<String>,

    /// Optional lifetime in seconds, overriding the configured default.
    #[validate(range(min = 1, max = 31_536_000))]
    pub ttl: Option<u64>,
}

/// A freshly created (or idempotently returned) short URL.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortenResponse {
    pub fn from_record(record: UrlRecord, base_url: &str) -> Self {
        Self {
            short_url: format!("{}/{}", base_url.trim_end_matches('/'), record.short_code),
            short_code: record.short_code,
            original_url: record.original_url,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}
