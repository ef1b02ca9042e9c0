//! Timed cache
//!
//! A persistent key/value cache with a single TTL per cache instance. Entries
//! live in [`ClientStorage`] under `<prefix><key>` as
//! `{"value": ..., "storedAt": <epoch ms>}`. An entry is valid while
//! `now - storedAt < ttl`; anything older is a miss and is never returned.
//!
//! Failures are never cached: when the fetch closure passed to
//! [`TimedCache::get_or_fetch`] errors, the error reaches the caller and the
//! next call fetches again.

use crate::error::Result;
use crate::storage::ClientStorage;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

pub mod clock;
pub use clock::{Clock, ManualClock, SystemClock};

/// Default time-to-live for every cache entry.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Persisted form of one cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    pub value: V,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
}

/// Expiring cache over client storage
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fintrip::cache::TimedCache;
/// use fintrip::storage::MemoryStorage;
///
/// let cache: TimedCache<String> = TimedCache::new(Arc::new(MemoryStorage::new()), "geo_");
/// cache.set("hanoi", &"21.03,105.85".to_string()).unwrap();
/// assert_eq!(cache.get("hanoi").as_deref(), Some("21.03,105.85"));
/// assert!(cache.get("paris").is_none());
/// ```
pub struct TimedCache<V> {
    storage: Arc<dyn ClientStorage>,
    prefix: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    _value: PhantomData<fn() -> V>,
}

impl<V> TimedCache<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Create a cache with the default 24 hour TTL and the system clock.
    pub fn new(storage: Arc<dyn ClientStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            clock: Arc::new(SystemClock),
            _value: PhantomData,
        }
    }

    /// Replace the TTL for every entry of this cache.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(stored_at) < self.ttl
    }

    fn read_entry(&self, storage_key: &str) -> Option<CacheEntry<V>> {
        let raw = match self.storage.get_item(storage_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!("cache read failed for {}: {}", storage_key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("discarding unreadable cache entry {}: {}", storage_key, e);
                None
            }
        }
    }

    /// Return the cached value for `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let storage_key = self.storage_key(key);
        let entry = self.read_entry(&storage_key)?;

        if self.is_fresh(entry.stored_at, self.clock.now()) {
            tracing::debug!("cache hit: {}", storage_key);
            Some(entry.value)
        } else {
            tracing::debug!("cache expired: {}", storage_key);
            None
        }
    }

    /// Store `value` under `key` with the current time, replacing any entry.
    pub fn set(&self, key: &str, value: &V) -> Result<()> {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        let json = serde_json::to_string(&entry)?;
        self.storage.set_item(&self.storage_key(key), &json)
    }

    /// Return the cached value, or run `fetch`, cache its result and return it.
    ///
    /// # Errors
    ///
    /// Whatever `fetch` returns. Nothing is stored in that case.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        tracing::debug!("cache miss: {}", self.storage_key(key));
        let value = fetch().await?;

        if let Err(e) = self.set(key, &value) {
            tracing::warn!("failed to write cache entry {}: {}", self.storage_key(key), e);
        }

        Ok(value)
    }

    /// Remove every expired entry under this cache's prefix.
    ///
    /// Returns the number of entries removed. Entries that cannot be parsed
    /// are removed as well.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for storage_key in self.storage.keys()? {
            if !storage_key.starts_with(&self.prefix) {
                continue;
            }

            let stale = match self.read_entry(&storage_key) {
                Some(entry) => !self.is_fresh(entry.stored_at, now),
                None => true,
            };

            if stale {
                self.storage.remove_item(&storage_key)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!("purged {} expired entries under {}", removed, self.prefix);
        }

        Ok(removed)
    }
}
