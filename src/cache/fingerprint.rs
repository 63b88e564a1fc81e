//! Deterministic cache keys for tracker requests
//!
//! A fingerprint is derived from the normalized endpoint path and its query
//! parameters. Parameters are canonicalized (sorted) before hashing so the
//! order in which a caller inserted them never changes the key.

use sha2::{Digest, Sha256};

/// Computes the cache key for an endpoint and its query parameters
///
/// # Arguments
/// * `path` - Normalized endpoint path (e.g., "/v3/items/42")
/// * `params` - Query parameters in any order
///
/// # Returns
/// A 64 character lowercase hex SHA-256 digest
pub fn fingerprint(path: &str, params: &[(String, String)]) -> String {
    let mut canonical: Vec<(&str, &str)> = params
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    canonical.sort_unstable();

    // Serializing a Vec of string pairs cannot fail
    let encoded = serde_json::to_string(&canonical).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(b":");
    hasher.update(encoded.as_bytes());
    hex::encode(hasher.finalize())
}
