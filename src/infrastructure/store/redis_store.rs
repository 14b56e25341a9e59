//! Redis-backed store implementation.

use crate::domain::repositories::{Counter, KvStore, SetMode, SetOutcome, StoreError, StoreResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisError, Script, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

/// Sets the record only if absent and zeroes its counter in the same step.
///
/// KEYS[1] record, KEYS[2] counter, ARGV[1] value, ARGV[2] ttl in ms (0 = none).
const CREATE_RECORD_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return 0
end
local ttl = tonumber(ARGV[2])
if ttl > 0 then
    redis.call('SET', KEYS[1], ARGV[1], 'PX', ttl)
    redis.call('SET', KEYS[2], 0, 'PX', ttl)
else
    redis.call('SET', KEYS[1], ARGV[1])
    redis.call('SET', KEYS[2], 0)
end
return 1
"#;

/// INCR that applies a TTL only to a key it creates.
///
/// KEYS[1] counter, ARGV[1] ttl in ms (0 = none). Returns {value, pttl}.
const INCREMENT_SCRIPT: &str = r#"
local existed = redis.call('EXISTS', KEYS[1])
local value = redis.call('INCR', KEYS[1])
local ttl = tonumber(ARGV[1])
if existed == 0 and ttl > 0 then
    redis.call('PEXPIRE', KEYS[1], ttl)
end
return {value, redis.call('PTTL', KEYS[1])}
"#;

/// Deletes every key only while KEYS[1] still holds ARGV[1].
///
/// KEYS[1] guard key, KEYS[2..] further keys, ARGV[1] expected value.
const DELETE_IF_VALUE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', unpack(KEYS))
end
return 0
"#;

/// Redis store shared by every service instance.
///
/// Uses `ConnectionManager` for automatic reconnection. Every command is
/// bounded by `op_timeout`; idempotent commands are retried on transient
/// failures with jittered exponential backoff, while increments are sent
/// at most once so a lost reply can never double count.
pub struct RedisStore {
    client: ConnectionManager,
    op_timeout: Duration,
    max_retries: usize,
    create_record_script: Script,
    increment_script: Script,
    delete_if_value_script: Script,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `op_timeout` - Upper bound for each command, including the initial connect
    /// - `max_retries` - Extra attempts for idempotent commands on transient errors
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING fails. Returns [`StoreError::Timeout`] if any
    /// of this takes longer than `op_timeout`.
    pub async fn connect(
        redis_url: &str,
        op_timeout: Duration,
        max_retries: usize,
    ) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(op_timeout))?
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let store = Self {
            client: manager,
            op_timeout,
            max_retries,
            create_record_script: Script::new(CREATE_RECORD_SCRIPT),
            increment_script: Script::new(INCREMENT_SCRIPT),
            delete_if_value_script: Script::new(DELETE_IF_VALUE_SCRIPT),
        };

        store.ping().await?;
        info!("✓ Connected to Redis");

        Ok(store)
    }

    /// Runs one Redis call under the operation timeout.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T, RedisError>>) -> StoreResult<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }

    /// Retries an idempotent call on connection errors and timeouts.
    async fn with_retry<T, A, F>(&self, command: &'static str, action: A) -> StoreResult<T>
    where
        A: FnMut() -> F,
        F: Future<Output = StoreResult<T>>,
    {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_millis(250))
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(strategy, action, |e: &StoreError| {
            let transient = matches!(e, StoreError::Connection(_) | StoreError::Timeout(_));
            if transient {
                warn!("Redis {} failed, retrying: {}", command, e);
            }
            transient
        })
        .await
    }
}

fn classify(e: RedisError) -> StoreError {
    if e.is_timeout()
        || e.is_io_error()
        || e.is_connection_dropped()
        || e.is_connection_refusal()
    {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

fn ttl_millis(ttl: Option<Duration>) -> u64 {
    ttl.map(|ttl| (ttl.as_millis() as u64).max(1)).unwrap_or(0)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.with_retry("GET", || {
            let mut conn = self.client.clone();
            self.bounded(async move { conn.get::<_, Option<Vec<u8>>>(key).await })
        })
        .await
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
        mode: SetMode,
    ) -> StoreResult<SetOutcome> {
        let reply: Option<String> = self
            .with_retry("SET", || {
                let mut conn = self.client.clone();
                let mut cmd = redis::cmd("SET");
                cmd.arg(key).arg(value);
                if ttl.is_some() {
                    cmd.arg("PX").arg(ttl_millis(ttl));
                }
                if mode == SetMode::IfAbsent {
                    cmd.arg("NX");
                }
                self.bounded(async move { cmd.query_async(&mut conn).await })
            })
            .await?;

        Ok(match reply {
            Some(_) => SetOutcome::Stored,
            None => SetOutcome::AlreadyExists,
        })
    }

    async fn create_record(
        &self,
        key: &str,
        value: &[u8],
        counter_key: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<SetOutcome> {
        let created: i64 = self
            .with_retry("CREATE", || {
                let mut conn = self.client.clone();
                let mut invocation = self.create_record_script.prepare_invoke();
                invocation
                    .key(key)
                    .key(counter_key)
                    .arg(value)
                    .arg(ttl_millis(ttl));
                self.bounded(async move { invocation.invoke_async(&mut conn).await })
            })
            .await?;

        debug!("Redis CREATE {} -> {}", key, created);

        Ok(if created == 1 {
            SetOutcome::Stored
        } else {
            SetOutcome::AlreadyExists
        })
    }

    async fn increment(&self, key: &str, ttl_if_new: Option<Duration>) -> StoreResult<Counter> {
        let mut conn = self.client.clone();
        let mut invocation = self.increment_script.prepare_invoke();
        invocation.key(key).arg(ttl_millis(ttl_if_new));

        let (value, pttl): (i64, i64) = self
            .bounded(async move { invocation.invoke_async(&mut conn).await })
            .await?;

        let ttl = u64::try_from(pttl).ok().map(Duration::from_millis);
        Ok(Counter { value, ttl })
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        self.with_retry("DEL", || {
            let mut conn = self.client.clone();
            self.bounded(async move { conn.del::<_, u64>(keys).await })
        })
        .await
    }

    async fn delete_if_value(
        &self,
        key: &str,
        expected: &[u8],
        keys: &[String],
    ) -> StoreResult<bool> {
        // A retry after a lost reply finds the guard gone and reports false,
        // which callers treat the same as losing the race.
        let removed: u64 = self
            .with_retry("DEL_IF", || {
                let mut conn = self.client.clone();
                let mut invocation = self.delete_if_value_script.prepare_invoke();
                invocation.key(key);
                for extra in keys.iter().filter(|k| k.as_str() != key) {
                    invocation.key(extra.as_str());
                }
                invocation.arg(expected);
                self.bounded(async move { invocation.invoke_async(&mut conn).await })
            })
            .await?;

        debug!("Redis DEL_IF {} -> {}", key, removed);
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.with_retry("EXISTS", || {
            let mut conn = self.client.clone();
            self.bounded(async move { conn.exists::<_, bool>(key).await })
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.with_retry("PING", || {
            let mut conn = self.client.clone();
            self.bounded(async move { conn.ping::<()>().await })
        })
        .await
    }
}
