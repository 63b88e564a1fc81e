//! Usage accounting for the tracker client
//!
//! Counters are shared between the dispatcher (network calls) and the cache
//! store (hits and misses). Callers only ever see a `UsageStats` snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters, zeroed when a client is constructed
#[derive(Debug)]
pub struct UsageCounters {
    api_calls: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    since: DateTime<Utc>,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageCounters {
    pub fn new() -> Self {
        Self {
            api_calls: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            since: Utc::now(),
        }
    }

    pub(crate) fn record_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of the counters
    ///
    /// # Arguments
    /// * `cache_size` - Current number of cache entries, reported alongside
    pub fn snapshot(&self, cache_size: usize) -> UsageStats {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);

        UsageStats {
            api_calls: self.api_calls.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            cache_hit_rate: hit_rate(cache_hits, cache_misses),
            cache_size,
            since: self.since,
        }
    }
}

/// Fraction of cache lookups that were hits, or 0.0 before any lookup
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Point-in-time usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageStats {
    /// Network calls made, fallback attempts included
    pub api_calls: u64,
    /// Cache lookups that returned a payload
    pub cache_hits: u64,
    /// Cache lookups that found nothing fresh
    pub cache_misses: u64,
    /// `cache_hits / (cache_hits + cache_misses)`
    pub cache_hit_rate: f64,
    /// Entries currently held by the cache
    pub cache_size: usize,
    /// When the counters were zeroed
    pub since: DateTime<Utc>,
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "api_calls={} cache_hits={} cache_misses={} cache_hit_rate={:.2}% cache_size={}",
            self.api_calls,
            self.cache_hits,
            self.cache_misses,
            self.cache_hit_rate * 100.0,
            self.cache_size
        )
    }
}
