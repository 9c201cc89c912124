#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Heuristic extraction of guidance statements from disclosure text.
//!
//! Parsing unstructured prose with regexes is inherently fragile, so each
//! pattern family lives behind a named matcher returning a typed
//! [`Option`], and the family priority order is explicit in
//! [`patterns::extract_from_sentence`]. The crate is pure text-in,
//! values-out; fetching and persistence live elsewhere.

/// Exhibit discovery and classification from filing index pages.
pub mod exhibits;
/// Hedging/uncertainty language metrics.
pub mod language;
/// Pattern families and sentence-level extraction.
pub mod patterns;
/// Text normalization, sentence splitting, and suppression checks.
pub mod text;

pub use exhibits::discover_exhibits;
pub use language::analyze_language;
pub use patterns::{detect_basis, extract_from_sentence, extract_statements, infer_period};
pub use text::{defers_to_call, has_guidance_keywords, normalize_text, split_sentences};
