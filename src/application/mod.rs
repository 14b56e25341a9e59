//! Application layer services implementing business logic.
//!
//! Services own the rules of the system and talk to storage only through the
//! [`KvStore`](crate::domain::repositories::KvStore) trait. HTTP handlers and
//! the admin CLI are thin callers on top of them.
//!
//! # Available Services
//!
//! - [`services::url_registry::UrlRegistry`] - Short URL creation, lookup, stats and deletion
//! - [`services::rate_limiter::RateLimiter`] - Per-client fixed-window admission

pub mod services;
