//! Storage trait definitions for the domain layer.
//!
//! The core never talks to a concrete backend. It depends on the
//! [`KvStore`] contract defined here, which the infrastructure layer
//! implements for Redis and for an in-process map.
//!
//! # Key Layout
//!
//! ```text
//! url:{code}             -> UrlRecord JSON (expires with the record)
//! clicks:{code}          -> click counter (same lifetime as the record)
//! ratelimit:{identity}   -> request counter (expires with the window)
//! ```
//!
//! # Testing
//!
//! A `mockall` mock ([`MockKvStore`]) is generated under `cfg(test)`.

pub mod kv_store;

pub use kv_store::{Counter, KvStore, SetMode, SetOutcome, StoreError, StoreResult};

#[cfg(test)]
pub use kv_store::MockKvStore;

/// Key holding the serialized record for `code`.
pub fn record_key(code: &str) -> String {
    format!("url:{}", code)
}

/// Key holding the click counter for `code`.
pub fn clicks_key(code: &str) -> String {
    format!("clicks:{}", code)
}

/// Key holding the rate-limit window for `identity`.
pub fn rate_limit_key(identity: &str) -> String {
    format!("ratelimit:{}", identity)
}
