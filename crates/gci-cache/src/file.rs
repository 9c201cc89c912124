//! On-disk cache implementation.

use async_trait::async_trait;
use gci_core::{GciError, HttpCache, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Persistent on-disk cache for upstream response bodies.
///
/// One file per key under a root directory. Freshness is judged from the
/// file's modification time, so entries need no sidecar metadata and
/// survive process restarts. [`HttpCache::get_stale`] ignores age
/// entirely, which is what lets a failed live fetch degrade to the last
/// known payload.
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| GciError::Cache(e.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are endpoint+identifier strings; anything outside a safe
        // charset collapses to '_' so a key can never escape the root.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(safe)
    }
}

#[async_trait]
impl HttpCache for FileCache {
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let meta = fs::metadata(&path).map_err(|e| GciError::Cache(e.to_string()))?;
        let modified = meta.modified().map_err(|e| GciError::Cache(e.to_string()))?;
        let age = modified.elapsed().unwrap_or(Duration::ZERO);
        if age > ttl {
            debug!(key, age_secs = age.as_secs(), "cache entry expired");
            return Ok(None);
        }
        let body = fs::read_to_string(&path).map_err(|e| GciError::Cache(e.to_string()))?;
        debug!(key, "cache hit");
        Ok(Some(body))
    }

    async fn get_stale(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let body = fs::read_to_string(&path).map_err(|e| GciError::Cache(e.to_string()))?;
        debug!(key, "stale cache hit");
        Ok(Some(body))
    }

    async fn put(&self, key: &str, body: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, body).map_err(|e| GciError::Cache(e.to_string()))?;
        Ok(())
    }
}
