//! # snapurl
//!
//! A URL shortening service built with Axum on top of a shared key-value store.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Core entities and the storage trait
//! - **Application Layer** ([`application`]) - URL registry and rate limiter
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-process stores
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Deterministic short codes with bounded collision retries
//! - Custom codes with idempotent re-creation
//! - Per-record expiry and atomic click counting
//! - Per-client rate limiting shared by all instances
//! - Prometheus counters on `/metrics`
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379"  # Optional, in-process store otherwise
//! export BASE_URL="https://sho.rt"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod observability;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{RateLimiter, RegistrySettings, UrlRegistry};
    pub use crate::domain::entities::{RateDecision, UrlRecord};
    pub use crate::domain::repositories::KvStore;
    pub use crate::error::AppError;
    pub use crate::infrastructure::store::{MemoryStore, RedisStore};
    pub use crate::state::AppState;
}
