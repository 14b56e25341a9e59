//! Fixed-window request admission per client identity.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::entities::RateDecision;
use crate::domain::repositories::{KvStore, rate_limit_key};
use crate::error::AppError;

/// Counts requests per identity in fixed windows kept in the [`KvStore`].
///
/// The first request of a window creates the counter and arms its expiry;
/// later requests only increment it. Because the counter lives in the
/// shared store, every service instance enforces the same limit.
///
/// If the store cannot be reached the request is refused with
/// [`AppError::StorageUnavailable`] rather than admitted unchecked.
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Counts one request for `identity` and reports whether it is admitted.
    ///
    /// Denied requests still count, so hammering a closed window does not
    /// shorten it.
    pub async fn allow(&self, identity: &str) -> Result<RateDecision, AppError> {
        let counter = self
            .store
            .increment(&rate_limit_key(identity), Some(self.window))
            .await?;

        let count = u64::try_from(counter.value).unwrap_or(0);
        let allowed = count <= self.limit;

        if !allowed {
            warn!("Rate limit exceeded for {} ({} requests)", identity, count);
            metrics::counter!("rate_limited_total").increment(1);
        }

        Ok(RateDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(count),
            reset_after: counter.ttl.unwrap_or(self.window),
        })
    }
}
