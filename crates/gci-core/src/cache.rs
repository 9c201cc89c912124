//! Cache trait for fetched upstream payloads.
//!
//! This module defines the [`HttpCache`] trait used by the EDGAR client to
//! avoid repeated requests to the regulatory host. Entries are keyed by
//! endpoint + identifier (e.g. `submissions-0000320193.json`) and carry a
//! caller-supplied time-to-live. A stale read path exists so a failed live
//! fetch can still return an expired entry instead of failing outright.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Trait for caching raw upstream response bodies.
///
/// Implementations can store entries on disk (the default), in memory
/// (tests), or nowhere at all.
#[async_trait]
pub trait HttpCache: Send + Sync {
    /// Retrieves an entry no older than `ttl`.
    ///
    /// Returns `Ok(None)` when the entry is missing or expired.
    async fn get(&self, key: &str, ttl: Duration) -> Result<Option<String>>;

    /// Retrieves an entry regardless of its age.
    ///
    /// Used as the fallback when a live fetch fails.
    async fn get_stale(&self, key: &str) -> Result<Option<String>>;

    /// Stores an entry, replacing any previous body for the key.
    async fn put(&self, key: &str, body: &str) -> Result<()>;
}
