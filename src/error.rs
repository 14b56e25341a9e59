//! Application error taxonomy and its HTTP mapping.
//!
//! Every failure of the core surfaces as exactly one [`AppError`] variant.
//! The API layer never inspects messages: the variant alone decides the
//! status code and the machine-readable `code` field of the error body.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidUrl { message: String, details: Value },

    #[error("{message}")]
    InvalidCode { message: String, details: Value },

    /// Request-shape problems that are neither URL nor code related.
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("Short code '{code}' is already taken")]
    CodeAlreadyExists { code: String },

    #[error("Failed to generate a unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64, limit: u64 },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn invalid_url(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidUrl {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_code(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidCode {
            message: message.into(),
            details,
        }
    }

    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl { .. } | Self::InvalidCode { .. } | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::CodeAlreadyExists { .. } => StatusCode::CONFLICT,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CodeSpaceExhausted { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::InvalidCode { .. } => "invalid_code",
            Self::Validation { .. } => "validation_error",
            Self::CodeAlreadyExists { .. } => "code_already_exists",
            Self::CodeSpaceExhausted { .. } => "code_space_exhausted",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Converts the error into the serializable payload sent to clients.
    pub fn to_error_info(&self) -> ErrorInfo {
        let details = match self {
            Self::InvalidUrl { details, .. }
            | Self::InvalidCode { details, .. }
            | Self::Validation { details, .. }
            | Self::NotFound { details, .. }
            | Self::Internal { details, .. } => details.clone(),
            Self::CodeAlreadyExists { code } => json!({ "code": code }),
            Self::CodeSpaceExhausted { attempts } => json!({ "attempts": attempts }),
            Self::RateLimited {
                retry_after_secs,
                limit,
            } => json!({ "retry_after": retry_after_secs, "limit": limit }),
            // Backend details stay in the logs.
            Self::StorageUnavailable(_) => json!({}),
        };

        let message = match self {
            Self::StorageUnavailable(_) => "Storage backend is unavailable".to_string(),
            other => other.to_string(),
        };

        ErrorInfo {
            code: self.code(),
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let Self::StorageUnavailable(reason) = &self {
            tracing::error!("Storage unavailable: {}", reason);
        } else if let Self::Internal { message, details } = &self {
            tracing::error!("Internal error: {} ({})", message, details);
        }

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs.max(1)),
            );
        }

        response
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Connection(_) | StoreError::Timeout(_) => {
                Self::StorageUnavailable(e.to_string())
            }
            StoreError::Operation(reason) => {
                Self::internal("Unexpected storage reply", json!({ "reason": reason }))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();

        if field_errors.contains_key("url") {
            return Self::invalid_url("Invalid URL format", json!(errors));
        }
        if field_errors.contains_key("custom_code") {
            return Self::invalid_code("Invalid custom code", json!(errors));
        }

        Self::bad_request("Request validation failed", json!(errors))
    }
}
