//! Key-value store backends.
//!
//! Provides two [`crate::domain::repositories::KvStore`] implementations:
//! - [`RedisStore`] - Production backend shared by all service instances
//! - [`MemoryStore`] - In-process backend for tests and single-node development

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
