#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and traits for the guidance credibility pipeline.
//!
//! This crate provides the foundational abstractions shared by the rest of
//! the workspace:
//!
//! - [`Ticker`](types::Ticker) - uppercased trading symbol
//! - [`Metric`](types::Metric) - guided metrics and their XBRL tags
//! - [`PeriodKey`](types::PeriodKey) - NULL-safe fiscal period identity
//! - [`GuidanceStatement`](types::GuidanceStatement) - extracted guidance
//! - [`GciError`](error::GciError) - error taxonomy
//! - [`HttpCache`](cache::HttpCache) - read-through fetch cache

/// Cache trait for fetched upstream payloads.
pub mod cache;
/// Error types for pipeline operations.
pub mod error;
/// Core data types (Ticker, Metric, GuidanceStatement, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::HttpCache;
pub use error::{GciError, Result};
pub use types::{
    ActualValue, Badge, Basis, CredibilityScore, ExhibitDoc, FiscalPeriod, GuidanceStatement,
    LanguageMetrics, Metric, PeriodKey, SourceSection, Ticker, Units,
};
