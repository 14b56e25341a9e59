//! In-process store for tests and single-node development.

use crate::domain::repositories::{Counter, KvStore, SetMode, SetOutcome, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// A [`KvStore`] kept in a single mutex-guarded map.
///
/// Every operation runs under one lock, which makes the compound operations
/// trivially atomic. Expiry follows the tokio clock, so tests can drive it
/// with a paused runtime. State is private to the process: run exactly one
/// instance of the service against it.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        debug!("Using MemoryStore (state is local to this process)");
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_counter(raw: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Operation("value is not an integer".to_string()))
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut entries = self.entries.lock();
        Ok(Self::live_entry(&mut entries, key, Instant::now()).map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
        mode: SetMode,
    ) -> StoreResult<SetOutcome> {
        let mut entries = self.entries.lock();

        if mode == SetMode::IfAbsent && Self::live_entry(&mut entries, key, Instant::now()).is_some()
        {
            return Ok(SetOutcome::AlreadyExists);
        }

        entries.insert(key.to_string(), Entry::new(value.to_vec(), ttl));
        Ok(SetOutcome::Stored)
    }

    async fn create_record(
        &self,
        key: &str,
        value: &[u8],
        counter_key: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<SetOutcome> {
        let mut entries = self.entries.lock();

        if Self::live_entry(&mut entries, key, Instant::now()).is_some() {
            return Ok(SetOutcome::AlreadyExists);
        }

        entries.insert(key.to_string(), Entry::new(value.to_vec(), ttl));
        entries.insert(counter_key.to_string(), Entry::new(b"0".to_vec(), ttl));
        Ok(SetOutcome::Stored)
    }

    async fn increment(&self, key: &str, ttl_if_new: Option<Duration>) -> StoreResult<Counter> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let value = match Self::live_entry(&mut entries, key, now) {
            Some(entry) => {
                let value = parse_counter(&entry.value)? + 1;
                entry.value = value.to_string().into_bytes();
                value
            }
            None => {
                entries.insert(key.to_string(), Entry::new(b"1".to_vec(), ttl_if_new));
                1
            }
        };

        let ttl = entries.get(key).and_then(|entry| entry.remaining(now));
        Ok(Counter { value, ttl })
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| entry.is_live(now))
            .count();

        Ok(removed as u64)
    }

    async fn delete_if_value(
        &self,
        key: &str,
        expected: &[u8],
        keys: &[String],
    ) -> StoreResult<bool> {
        let mut entries = self.entries.lock();

        let matches = Self::live_entry(&mut entries, key, Instant::now())
            .is_some_and(|entry| entry.value == expected);
        if !matches {
            return Ok(false);
        }

        entries.remove(key);
        for other in keys {
            entries.remove(other);
        }
        Ok(true)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.lock();
        Ok(Self::live_entry(&mut entries, key, Instant::now()).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
