//! In-memory response cache with per-entry TTL
//!
//! Provides a `CacheStore` that maps request fingerprints to decoded response
//! payloads. Entries expire on read: an expired entry is evicted the next time
//! it is looked up and is never returned.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::stats::UsageCounters;

/// A cached response payload
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached payload
    value: Value,
    /// When the payload was cached
    inserted_at: Instant,
    /// How long the payload stays fresh
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }
}

/// Thread-safe cache of tracker responses
///
/// Every lookup is counted as a hit or a miss in the shared `UsageCounters`.
#[derive(Debug)]
pub struct CacheStore {
    /// Cached entries keyed by request fingerprint
    entries: Mutex<HashMap<String, CacheEntry>>,
    /// Shared usage counters for hit/miss accounting
    counters: Arc<UsageCounters>,
}

impl CacheStore {
    /// Creates an empty cache reporting into `counters`
    pub fn new(counters: Arc<UsageCounters>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            counters,
        }
    }

    /// Reads a payload from the cache
    ///
    /// Returns `None` if the key is unknown or the entry has expired. Expired
    /// entries are removed as part of the lookup.
    ///
    /// # Arguments
    /// * `key` - The request fingerprint
    pub fn lookup(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.counters.record_hit();
                debug!(key, "cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
            debug!(key, "cache entry expired");
        }

        self.counters.record_miss();
        debug!(key, "cache miss");
        None
    }

    /// Stores a payload, replacing any previous entry under the same key
    ///
    /// # Arguments
    /// * `key` - The request fingerprint
    /// * `value` - The decoded response payload
    /// * `ttl` - How long the entry should be considered fresh
    pub fn insert(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of entries currently held, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_cache() -> (CacheStore, Arc<UsageCounters>) {
        let counters = Arc::new(UsageCounters::new());
        (CacheStore::new(Arc::clone(&counters)), counters)
    }

    #[test]
    fn test_lookup_returns_none_for_missing_key() {
        let (cache, counters) = create_test_cache();

        assert!(cache.lookup("nonexistent_key").is_none());
        assert_eq!(counters.snapshot(0).cache_misses, 1);
    }

    #[test]
    fn test_insert_then_lookup_returns_value() {
        let (cache, counters) = create_test_cache();
        let value = json!({"id": 42, "name": "Login works"});

        cache.insert("item_42", value.clone(), Duration::from_secs(300));

        assert_eq!(cache.lookup("item_42"), Some(value));
        assert_eq!(counters.snapshot(0).cache_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_is_fresh_just_before_ttl() {
        let (cache, _counters) = create_test_cache();
        cache.insert("fresh_key", json!([1, 2, 3]), Duration::from_secs(10));

        tokio::time::advance(Duration::from_millis(9_999)).await;

        assert_eq!(cache.lookup("fresh_key"), Some(json!([1, 2, 3])));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_lookup() {
        let (cache, counters) = create_test_cache();
        cache.insert("expired_key", json!({"stale": true}), Duration::from_secs(10));

        tokio::time::advance(Duration::from_millis(10_001)).await;

        assert!(cache.lookup("expired_key").is_none());
        assert!(cache.is_empty(), "Expired entry should be evicted");
        assert_eq!(counters.snapshot(0).cache_misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reinsert_resets_timestamp() {
        let (cache, _counters) = create_test_cache();
        cache.insert("key", json!(1), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert("key", json!(2), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.lookup("key"), Some(json!(2)));
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let (cache, _counters) = create_test_cache();

        cache.insert("overwrite_key", json!("first"), Duration::from_secs(60));
        cache.insert("overwrite_key", json!("second"), Duration::from_secs(60));

        assert_eq!(cache.lookup("overwrite_key"), Some(json!("second")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_makes_every_lookup_miss() {
        let (cache, _counters) = create_test_cache();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.lookup("a").is_none());
        assert!(cache.lookup("b").is_none());
    }

    #[test]
    fn test_null_payload_is_cached() {
        let (cache, _counters) = create_test_cache();
        cache.insert("empty_body", Value::Null, Duration::from_secs(60));

        assert_eq!(cache.lookup("empty_body"), Some(Value::Null));
    }
}
