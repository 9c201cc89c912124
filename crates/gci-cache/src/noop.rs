//! No-op cache implementation.

use async_trait::async_trait;
use gci_core::{HttpCache, Result};
use std::time::Duration;

/// Cache that stores nothing and never returns a hit.
///
/// Useful when every fetch should go to the live host.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HttpCache for NoopCache {
    async fn get(&self, _key: &str, _ttl: Duration) -> Result<Option<String>> {
        Ok(None)
    }

    async fn get_stale(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_hits() {
        let cache = NoopCache::new();
        cache.put("k", "v").await.unwrap();
        assert!(cache.get("k", Duration::from_secs(60)).await.unwrap().is_none());
        assert!(cache.get_stale("k").await.unwrap().is_none());
    }
}
