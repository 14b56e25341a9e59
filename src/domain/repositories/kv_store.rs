//! Key-value store contract consumed by the core.

use async_trait::async_trait;
use std::time::Duration;

/// Errors raised by a [`KvStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or dropped the connection.
    #[error("store connection error: {0}")]
    Connection(String),

    /// The operation did not complete within the configured bound.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered, but with something the caller cannot use.
    #[error("store operation error: {0}")]
    Operation(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// How [`KvStore::set_with_ttl`] treats an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Overwrite,
    IfAbsent,
}

/// Outcome of a write that may be conditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Stored,
    AlreadyExists,
}

/// Counter state returned by [`KvStore::increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// Value after the increment.
    pub value: i64,
    /// Remaining lifetime of the counter key, `None` if it never expires.
    pub ttl: Option<Duration>,
}

/// Storage interface for every piece of shared state: URL records, click
/// counters and rate-limit windows.
///
/// All cross-request state lives behind this trait so that any number of
/// service instances can share one backend. Implementations must make
/// [`increment`](KvStore::increment),
/// [`create_record`](KvStore::create_record) and
/// [`delete_if_value`](KvStore::delete_if_value) indivisible.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis backend
/// - [`crate::infrastructure::store::MemoryStore`] - in-process backend
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Stores `value` under `key` with an optional TTL.
    ///
    /// With [`SetMode::IfAbsent`] nothing is written when the key already
    /// exists and [`SetOutcome::AlreadyExists`] is returned.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
        mode: SetMode,
    ) -> StoreResult<SetOutcome>;

    /// Stores `value` under `key` only if `key` is absent and, in the same
    /// atomic step, sets `counter_key` to `0`. Both keys share `ttl`.
    ///
    /// When `key` already exists neither key is touched.
    async fn create_record(
        &self,
        key: &str,
        value: &[u8],
        counter_key: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<SetOutcome>;

    /// Atomically increments the integer under `key`, creating it at `0`
    /// first if absent. `ttl_if_new` is applied only when the key is created
    /// by this call; an existing key keeps its lifetime.
    async fn increment(&self, key: &str, ttl_if_new: Option<Duration>) -> StoreResult<Counter>;

    /// Removes all `keys` at once and returns how many existed.
    async fn delete(&self, keys: &[String]) -> StoreResult<u64>;

    /// Removes `keys` only if `key` still holds exactly `expected`, checked
    /// and applied in one atomic step. Returns whether the keys were removed.
    ///
    /// Used to clear a stale record without racing another writer that has
    /// already replaced it.
    async fn delete_if_value(
        &self,
        key: &str,
        expected: &[u8],
        keys: &[String],
    ) -> StoreResult<bool>;

    /// Returns whether `key` is present.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Checks that the backend answers.
    async fn ping(&self) -> StoreResult<()>;
}
