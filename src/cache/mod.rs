//! Cache module for tracker API responses
//!
//! This module provides an in-memory cache keyed by request fingerprints, with
//! a TTL per entry. Only idempotent reads are stored; the dispatcher decides
//! what is cacheable. Nothing is persisted across restarts.

mod fingerprint;
mod store;

pub use fingerprint::fingerprint;
pub use store::CacheStore;
