//! TTL response cache.
//!
//! Entries expire lazily: a stale entry is ignored on read and overwritten by
//! the next successful response, but never swept.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::trace;

use crate::lock;

struct CacheEntry {
    data: Value,
    expires_at: Instant,
}

/// Process-scoped cache of successful GET payloads.
#[derive(Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payload stored under `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = lock(&self.entries);
        let entry = entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.data.clone())
        } else {
            trace!(key = %key, "Cache entry expired");
            None
        }
    }

    /// Stores `data` under `key` for `ttl`.
    pub fn insert(&self, key: impl Into<String>, data: Value, ttl: Duration) {
        let entry = CacheEntry {
            data,
            expires_at: Instant::now() + ttl,
        };
        lock(&self.entries).insert(key.into(), entry);
    }

    /// Drops the entry under `key`. Returns true if one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        lock(&self.entries).remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_hit_before_expiry() {
        let cache = ResponseCache::new();
        cache.insert("GET:/api/topics:null", json!([1, 2]), Duration::from_secs(5));

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert_eq!(cache.get("GET:/api/topics:null"), Some(json!([1, 2])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry_keeps_entry() {
        let cache = ResponseCache::new();
        cache.insert("k", json!("v"), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_expiry() {
        let cache = ResponseCache::new();
        cache.insert("k", json!(1), Duration::from_secs(1));
        tokio::time::advance(Duration::from_secs(2)).await;

        cache.insert("k", json!(2), Duration::from_secs(1));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = ResponseCache::new();
        cache.insert("a", json!(1), Duration::from_secs(60));
        cache.insert("b", json!(2), Duration::from_secs(60));

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("b"), Some(json!(2)));

        cache.clear();
        assert!(cache.is_empty());
    }
}
