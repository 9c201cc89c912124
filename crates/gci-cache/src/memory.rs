//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gci_core::{HttpCache, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache entry with timestamp for TTL-based freshness checks.
#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(body: String) -> Self {
        Self {
            body,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Simple in-memory cache for testing and development.
///
/// Entries live in a `RwLock`-protected `HashMap` and are lost when the
/// cache is dropped.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpCache for MemoryCache {
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_stale(ttl) => {
                debug!(key, "cache hit");
                Ok(Some(entry.body.clone()))
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_stale(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).map(|e| e.body.clone()))
    }

    async fn put(&self, key: &str, body: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_and_stale_reads() {
        let cache = MemoryCache::new();
        cache.put("k", "v").await.unwrap();

        assert_eq!(
            cache.get("k", Duration::from_secs(60)).await.unwrap().as_deref(),
            Some("v")
        );
        assert!(cache.get("k", Duration::ZERO).await.unwrap().is_none());
        assert_eq!(cache.get_stale("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let cache = MemoryCache::new();
        cache.put("k", "old").await.unwrap();
        cache.put("k", "new").await.unwrap();
        assert_eq!(cache.get_stale("k").await.unwrap().as_deref(), Some("new"));
    }
}
