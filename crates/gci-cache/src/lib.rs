#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for upstream fetches.
//!
//! This crate provides implementations of the [`HttpCache`] trait from
//! `gci-core`:
//!
//! - [`FileCache`] - persistent on-disk cache (default choice)
//! - [`MemoryCache`] - simple in-memory cache for testing
//! - [`NoopCache`] - no-op cache that doesn't store anything

/// On-disk cache implementation.
pub mod file;
/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use gci_core::HttpCache;

// Re-export implementations
pub use file::FileCache;
pub use memory::MemoryCache;
pub use noop::NoopCache;
