//! Error types for pipeline operations.
//!
//! This module defines [`GciError`] which covers all error cases that can
//! occur when locating filings, extracting guidance, aligning actuals, or
//! persisting results.

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Error, Debug)]
pub enum GciError {
    /// The requested ticker has no known regulatory identifier.
    ///
    /// Fails the current operation immediately; there is nothing to retry.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// The upstream host returned a non-success response.
    ///
    /// Callers with a cache fall back to a stale entry before propagating.
    #[error("Upstream error {status} for {url}")]
    Upstream {
        /// The URL that was requested.
        url: String,
        /// HTTP status code returned by the host.
        status: u16,
    },

    /// Network-level failures (connection errors, transport timeouts).
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed JSON, HTML, or PDF content.
    ///
    /// Per-document parse failures degrade to an empty result for that
    /// document; iteration continues with the next one.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading or writing the fetch cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Store write or query failure. Fatal for the current operation.
    #[error("Store error: {0}")]
    Store(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias using [`GciError`].
pub type Result<T> = std::result::Result<T, GciError>;
