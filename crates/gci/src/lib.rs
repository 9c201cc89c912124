#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Guidance credibility pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use gci::pipeline::{GciPipeline, PipelineConfig};
//! use gci::Ticker;
//!
//! #[tokio::main]
//! async fn main() -> gci::Result<()> {
//!     let pipeline = GciPipeline::new(&PipelineConfig {
//!         user_agent: "MyApp/1.0 (contact@example.com)".to_string(),
//!         cache_dir: ".cache/sec".into(),
//!         db_path: "data/gci.db".into(),
//!     })?;
//!
//!     let tickers = [Ticker::new("AAPL")];
//!     pipeline.import_filings(&tickers).await;
//!     pipeline.extract_guidance(&tickers).await;
//!     pipeline.pull_actuals(&tickers).await;
//!     pipeline.analyze_language(&tickers).await;
//!
//!     for row in pipeline.compute_scores()? {
//!         println!("{}: GCI {} ({})", row.ticker, row.score.gci, row.score.badge);
//!     }
//!     Ok(())
//! }
//! ```

/// The sequential pipeline orchestrator.
pub mod pipeline;

// Core types and traits
pub use gci_core::*;

// Cache implementations
pub use gci_cache::{FileCache, MemoryCache, NoopCache};

// Pipeline stages
pub use gci_edgar::EdgarClient;
pub use gci_issuers::{FallbackStrategy, FetchPlan, IssuerPattern, IssuerRegistry, PageFetcher};
pub use gci_score::{ScoreRow, ScoringEngine};
pub use gci_store::{Company, GuidancePair, GuidanceStore, PeriodUrls};

pub use pipeline::{GciPipeline, PipelineConfig, StatusDetail, TickerStatus};
