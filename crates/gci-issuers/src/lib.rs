#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Issuer adapter registry.
//!
//! Invoked only when generic extraction yields zero statements for a
//! ticker. Strategies are per-issuer polymorphism over one capability:
//! a pure function from fetched page text to zero-or-more guidance
//! statements, tried in order with the first hit short-circuiting the
//! rest.

use async_trait::async_trait;
use gci_core::{GuidanceStatement, Metric, Result, Ticker};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Spacing between successive fallback fetch attempts, respecting the
/// target site's access expectations.
const ATTEMPT_DELAY: Duration = Duration::from_millis(600);

/// Link keywords used by the last-resort index crawl.
const INDEX_KEYWORDS: &[&str] = &["outlook", "transcript", "remarks", "guidance"];

/// Fetches issuer pages. Implemented over a real HTTP client in the
/// pipeline and over fixtures in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a URL and reduces it to normalized plain text.
    async fn page_text(&self, url: &str) -> Result<String>;

    /// Fetches a URL and returns its raw HTML, for link discovery.
    async fn page_html(&self, url: &str) -> Result<String>;
}

/// How a strategy finds the page to extract from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// A known press/investor-relations URL.
    PrimaryUrl {
        /// The page to fetch.
        url: String,
    },
    /// Same-domain link discovery from a start page, filtered by keyword.
    LinkCrawl {
        /// Page whose links are scanned.
        start_url: String,
        /// Keywords a link's text or href must contain.
        keywords: Vec<String>,
    },
    /// Index-page link discovery with the default keywords. Last resort.
    IndexCrawl {
        /// Index page whose links are scanned.
        index_url: String,
    },
}

/// Issuer-specific extraction pattern applied to fetched page text.
#[derive(Debug, Clone, PartialEq)]
pub enum IssuerPattern {
    /// A revenue range scoped to a named segment.
    SegmentRange {
        /// Segment name as the issuer writes it.
        segment: String,
    },
    /// A growth percentage band applied to a disclosed base, in USD
    /// millions.
    PercentBand {
        /// Base revenue the band applies to.
        base_usd_m: f64,
    },
}

impl IssuerPattern {
    /// Applies the pattern to normalized page text. Pure.
    #[must_use]
    pub fn apply(&self, text: &str) -> Vec<GuidanceStatement> {
        match self {
            Self::SegmentRange { segment } => segment_range(segment, text),
            Self::PercentBand { base_usd_m } => percent_band(*base_usd_m, text),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn unit_factor(unit: &str) -> f64 {
    if unit.eq_ignore_ascii_case("billion") {
        1000.0
    } else {
        1.0
    }
}

fn segment_range(segment: &str, text: &str) -> Vec<GuidanceStatement> {
    let pattern = format!(
        r"(?i){}[^.]{{0,80}}?revenue[^.]{{0,60}}?\$\s*([0-9]+(?:\.[0-9]+)?)\s*(?:(billion|million)\s*)?(?:-|to|and)\s*\$?\s*([0-9]+(?:\.[0-9]+)?)\s*(billion|million)",
        regex::escape(segment)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(caps) = re.captures(text) else {
        return Vec::new();
    };
    let Some(sentence) = caps.get(0).map(|m| m.as_str()) else {
        return Vec::new();
    };
    let (Ok(a), Ok(b)) = (caps[1].parse::<f64>(), caps[3].parse::<f64>()) else {
        return Vec::new();
    };
    let factor_b = unit_factor(&caps[4]);
    let factor_a = caps.get(2).map_or(factor_b, |m| unit_factor(m.as_str()));
    vec![
        GuidanceStatement::new(
            Metric::Revenue,
            round2(a * factor_a),
            round2(b * factor_b),
            sentence,
        )
        .with_segment(segment),
    ]
}

fn percent_band(base_usd_m: f64, text: &str) -> Vec<GuidanceStatement> {
    static BAND: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
        Regex::new(
            r"(?i)revenue[^.]{0,60}?(?:grow|growth|up|increase)[^.]{0,30}?([0-9]+(?:\.[0-9]+)?)\s*%\s*(?:-|to|and)\s*([0-9]+(?:\.[0-9]+)?)\s*%",
        )
        .unwrap()
    });
    let Some(caps) = BAND.captures(text) else {
        return Vec::new();
    };
    let (Ok(lo), Ok(hi)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) else {
        return Vec::new();
    };
    let sentence = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
    vec![GuidanceStatement::new(
        Metric::Revenue,
        round2(base_usd_m * (1.0 + lo / 100.0)),
        round2(base_usd_m * (1.0 + hi / 100.0)),
        sentence,
    )]
}

/// One fallback step: where to look and what to match there.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackStrategy {
    /// Page selection plan.
    pub plan: FetchPlan,
    /// Pattern applied to the fetched text.
    pub pattern: IssuerPattern,
}

/// Registry mapping tickers to ordered fallback strategies.
#[derive(Debug, Default)]
pub struct IssuerRegistry {
    adapters: HashMap<String, Vec<FallbackStrategy>>,
}

impl IssuerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in issuer adapters.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            "NVDA",
            vec![
                FallbackStrategy {
                    plan: FetchPlan::PrimaryUrl {
                        url: "https://nvidianews.nvidia.com/news".to_string(),
                    },
                    pattern: IssuerPattern::SegmentRange {
                        segment: "Data Center".to_string(),
                    },
                },
                FallbackStrategy {
                    plan: FetchPlan::LinkCrawl {
                        start_url: "https://nvidianews.nvidia.com/news".to_string(),
                        keywords: vec!["outlook".to_string(), "financial results".to_string()],
                    },
                    pattern: IssuerPattern::SegmentRange {
                        segment: "Data Center".to_string(),
                    },
                },
                FallbackStrategy {
                    plan: FetchPlan::IndexCrawl {
                        index_url: "https://investor.nvidia.com/news/default.aspx".to_string(),
                    },
                    pattern: IssuerPattern::SegmentRange {
                        segment: "Data Center".to_string(),
                    },
                },
            ],
        );
        registry
    }

    /// Registers (or replaces) the strategy list for a ticker.
    pub fn register(&mut self, ticker: &str, strategies: Vec<FallbackStrategy>) {
        debug!(ticker, count = strategies.len(), "registering issuer adapter");
        self.adapters.insert(ticker.to_uppercase(), strategies);
    }

    /// The ordered strategies for a ticker, when any are registered.
    #[must_use]
    pub fn strategies_for(&self, ticker: &Ticker) -> Option<&[FallbackStrategy]> {
        self.adapters.get(ticker.as_str()).map(Vec::as_slice)
    }

    /// Runs the ticker's fallback strategies in order.
    ///
    /// Each strategy fetches its page, applies the issuer pattern, and
    /// the first one returning any statement short-circuits the rest.
    /// Per-strategy failures degrade to "no match". Successive attempts
    /// are separated by a fixed delay.
    pub async fn extract_fallback(
        &self,
        ticker: &Ticker,
        fetcher: &dyn PageFetcher,
    ) -> Result<Vec<GuidanceStatement>> {
        let Some(strategies) = self.strategies_for(ticker) else {
            return Ok(Vec::new());
        };

        for (i, strategy) in strategies.iter().enumerate() {
            if i > 0 {
                sleep(ATTEMPT_DELAY).await;
            }
            match run_strategy(strategy, fetcher).await {
                Ok(statements) if !statements.is_empty() => {
                    debug!(%ticker, strategy = i, count = statements.len(), "fallback hit");
                    return Ok(statements);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%ticker, strategy = i, error = %e, "fallback strategy failed");
                }
            }
        }
        Ok(Vec::new())
    }
}

async fn run_strategy(
    strategy: &FallbackStrategy,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<GuidanceStatement>> {
    let url = match &strategy.plan {
        FetchPlan::PrimaryUrl { url } => Some(url.clone()),
        FetchPlan::LinkCrawl {
            start_url,
            keywords,
        } => {
            let html = fetcher.page_html(start_url).await?;
            discover_link(&html, start_url, keywords)
        }
        FetchPlan::IndexCrawl { index_url } => {
            let html = fetcher.page_html(index_url).await?;
            let keywords: Vec<String> = INDEX_KEYWORDS.iter().map(|k| (*k).to_string()).collect();
            discover_link(&html, index_url, &keywords)
        }
    };

    let Some(url) = url else {
        return Ok(Vec::new());
    };
    let text = fetcher.page_text(&url).await?;
    let statements = strategy
        .pattern
        .apply(&text)
        .into_iter()
        .map(|s| s.with_source_url(url.clone()))
        .collect();
    Ok(statements)
}

/// First same-domain link whose text or href contains a keyword.
fn discover_link(html: &str, base_url: &str, keywords: &[String]) -> Option<String> {
    let doc = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").expect("static selector");
    let host = host_of(base_url);

    for anchor in doc.select(&anchor_sel) {
        let href = anchor.value().attr("href")?;
        let text = anchor.text().collect::<String>().to_lowercase();
        let href_lower = href.to_lowercase();
        if !keywords
            .iter()
            .any(|k| text.contains(&k.to_lowercase()) || href_lower.contains(&k.to_lowercase()))
        {
            continue;
        }
        let resolved = resolve_link(base_url, href);
        if host_of(&resolved) == host {
            return Some(resolved);
        }
    }
    None
}

fn host_of(url: &str) -> &str {
    let rest = url.split("://").nth(1).unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

fn resolve_link(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    if href.starts_with('/') {
        let scheme_host = base_url
            .find("://")
            .and_then(|i| base_url[i + 3..].find('/').map(|j| &base_url[..i + 3 + j]))
            .unwrap_or(base_url);
        return format!("{scheme_host}{href}");
    }
    format!("{}/{}", base_url.trim_end_matches('/'), href)
}
