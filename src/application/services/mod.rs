//! Business logic services for the application layer.

pub mod rate_limiter;
pub mod url_registry;

pub use rate_limiter::RateLimiter;
pub use url_registry::{RegistrySettings, UrlRegistry};
