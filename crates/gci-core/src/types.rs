//! Core data types for the guidance credibility pipeline.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - trading symbol
//! - [`Metric`] - guided financial metric
//! - [`PeriodKey`] - fiscal period identity
//! - [`GuidanceStatement`] - extracted forward-looking range
//! - [`ActualValue`] - later-reported realized value
//! - [`ExhibitDoc`] - a discovered filing attachment
//! - [`LanguageMetrics`] - hedging/uncertainty rates for a text section
//! - [`CredibilityScore`] - composite score with categorical badge

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading symbol/ticker.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A financial metric for which guidance is extracted and actuals aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Total revenue.
    Revenue,
    /// Diluted earnings per share.
    EpsDiluted,
}

impl Metric {
    /// Database/string form of the metric.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::EpsDiluted => "eps_diluted",
        }
    }

    /// The us-gaap XBRL tag reported values are fetched under.
    #[must_use]
    pub const fn xbrl_tag(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenues",
            Self::EpsDiluted => "EarningsPerShareDiluted",
        }
    }

    /// Canonical units for stored values of this metric.
    #[must_use]
    pub const fn canonical_units(&self) -> Units {
        match self {
            Self::Revenue => Units::UsdMillions,
            Self::EpsDiluted => Units::Eps,
        }
    }

    /// Parses the database/string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "revenue" => Some(Self::Revenue),
            "eps_diluted" => Some(Self::EpsDiluted),
            _ => None,
        }
    }
}

/// Canonical units guidance and actual values are normalized to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Units {
    /// US dollars in millions (billion-scale raw values are scaled x1000).
    UsdMillions,
    /// Dollars per diluted share, unscaled.
    Eps,
}

impl Units {
    /// Database/string form of the units.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UsdMillions => "USD_M",
            Self::Eps => "EPS",
        }
    }

    /// Parses the database/string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USD_M" => Some(Self::UsdMillions),
            "EPS" => Some(Self::Eps),
            _ => None,
        }
    }
}

/// Accounting basis declared alongside a guidance range.
///
/// Absent when the surrounding text names neither basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Reported under GAAP.
    Gaap,
    /// Adjusted/non-GAAP figures.
    NonGaap,
}

impl Basis {
    /// Database/string form of the basis.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gaap => "GAAP",
            Self::NonGaap => "non-GAAP",
        }
    }

    /// Parses the database/string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GAAP" => Some(Self::Gaap),
            "non-GAAP" => Some(Self::NonGaap),
            _ => None,
        }
    }
}

/// Fiscal period label within a fiscal year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    /// First fiscal quarter.
    Q1,
    /// Second fiscal quarter.
    Q2,
    /// Third fiscal quarter.
    Q3,
    /// Fourth fiscal quarter.
    Q4,
    /// Full fiscal year.
    Fy,
}

impl FiscalPeriod {
    /// Uppercase label form ("Q1".."Q4", "FY").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Fy => "FY",
        }
    }

    /// Parses a label, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            "FY" => Some(Self::Fy),
            _ => None,
        }
    }

    /// Ordering rank within a fiscal year, FY ranking above Q4.
    ///
    /// Used to make "most recent period" ordering explicit instead of
    /// relying on incidental query order.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
            Self::Fy => 5,
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fiscal period identity: (fy, fp, period_end), all optional.
///
/// Two keys are equal when every component matches, with absent components
/// matching absent components (NULL equals NULL). Identity is immutable
/// once a period row exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Fiscal year, e.g. 2025.
    pub fy: Option<i32>,
    /// Fiscal period label.
    pub fp: Option<FiscalPeriod>,
    /// Calendar end date of the period.
    pub period_end: Option<NaiveDate>,
}

impl PeriodKey {
    /// Creates a key from fiscal year and period label.
    #[must_use]
    pub const fn new(fy: Option<i32>, fp: Option<FiscalPeriod>) -> Self {
        Self {
            fy,
            fp,
            period_end: None,
        }
    }

    /// Sets the period end date.
    #[must_use]
    pub const fn with_period_end(mut self, end: NaiveDate) -> Self {
        self.period_end = Some(end);
        self
    }
}

/// A forward-looking numeric guidance range extracted from disclosure text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuidanceStatement {
    /// Fiscal period the guidance is given for.
    pub period: PeriodKey,
    /// Guided metric.
    pub metric: Metric,
    /// Low end of the range, in canonical units.
    pub min_value: f64,
    /// High end of the range, in canonical units.
    pub max_value: f64,
    /// Units the range is stored in.
    pub units: Units,
    /// Declared accounting basis, when named.
    pub basis: Option<Basis>,
    /// Verbatim sentence the range was extracted from.
    pub extracted_text: String,
    /// Business segment the range is scoped to, when named.
    pub segment: Option<String>,
    /// Document the statement was extracted from.
    pub source_url: Option<String>,
}

impl GuidanceStatement {
    /// Creates a statement, normalizing an inverted raw range so that
    /// `min_value <= max_value` always holds.
    #[must_use]
    pub fn new(metric: Metric, min_value: f64, max_value: f64, extracted_text: impl Into<String>) -> Self {
        let (min_value, max_value) = if min_value <= max_value {
            (min_value, max_value)
        } else {
            (max_value, min_value)
        };
        Self {
            period: PeriodKey::default(),
            metric,
            min_value,
            max_value,
            units: metric.canonical_units(),
            basis: None,
            extracted_text: extracted_text.into(),
            segment: None,
            source_url: None,
        }
    }

    /// Sets the fiscal period.
    #[must_use]
    pub fn with_period(mut self, period: PeriodKey) -> Self {
        self.period = period;
        self
    }

    /// Sets the accounting basis.
    #[must_use]
    pub fn with_basis(mut self, basis: Option<Basis>) -> Self {
        self.basis = basis;
        self
    }

    /// Sets the segment label.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Sets the source document URL.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Midpoint of the guided range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min_value + self.max_value) / 2.0
    }
}

/// A later-reported realized value aligned to a guided period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActualValue {
    /// Metric the value realizes.
    pub metric: Metric,
    /// Reported value in canonical units, when one could be aligned.
    pub value: Option<f64>,
    /// Units the value is stored in.
    pub units: Units,
    /// XBRL tag the series was fetched under (e.g. "us-gaap:Revenues").
    pub source_tag: String,
    /// API endpoint the series came from.
    pub source_api_url: String,
}

/// A discovered document attached to a filing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhibitDoc {
    /// Conventional exhibit number (e.g. "99.1"), absent for the
    /// synthesized primary-document fallback.
    pub exhibit_no: Option<String>,
    /// Absolute document URL.
    pub url: String,
    /// Declared content type, when the index states one.
    pub content_type: Option<String>,
    /// File name portion of the URL or index row.
    pub file_name: Option<String>,
}

/// Which part of an earnings communication a language analysis covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSection {
    /// Scripted prepared remarks (or a filing-text proxy for them).
    Prepared,
    /// Analyst question-and-answer section.
    QA,
}

impl SourceSection {
    /// Database/string form of the section.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prepared => "Prepared",
            Self::QA => "Q&A",
        }
    }

    /// Parses the database/string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Prepared" => Some(Self::Prepared),
            "Q&A" => Some(Self::QA),
            _ => None,
        }
    }
}

/// Hedging/uncertainty rates for one analyzed text section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetrics {
    /// Total words in the analyzed text.
    pub words_total: u64,
    /// Hedge terms per 1000 words.
    pub hedges_per_k: f64,
    /// Negation terms per 1000 words.
    pub negations_per_k: f64,
    /// Uncertainty terms per 1000 words.
    pub uncertainty_per_k: f64,
    /// Vague terms per 1000 words.
    pub vague_per_k: f64,
    /// Section of the communication the text came from.
    pub source_section: SourceSection,
}

impl LanguageMetrics {
    /// An all-zero analysis for an empty or unavailable text.
    #[must_use]
    pub const fn empty(source_section: SourceSection) -> Self {
        Self {
            words_total: 0,
            hedges_per_k: 0.0,
            negations_per_k: 0.0,
            uncertainty_per_k: 0.0,
            vague_per_k: 0.0,
            source_section,
        }
    }
}

/// Categorical credibility tier derived from the composite index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    /// GCI >= 80.
    High,
    /// GCI >= 60.
    Medium,
    /// Everything below.
    Low,
}

impl Badge {
    /// Derives the badge from a composite index value.
    #[must_use]
    pub fn from_gci(gci: f64) -> Self {
        if gci >= 80.0 {
            Self::High
        } else if gci >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Database/string form of the badge.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Parses the database/string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite credibility score with its sub-scores and badge.
///
/// Sub-scores are integer-rounded at persistence time; a score row is a
/// pure function of the persisted guidance, actual, and language rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    /// Timeliness-accuracy sub-score (0-100).
    pub tra: i64,
    /// Consistency-vs-volatility sub-score (0-100).
    pub cvp: i64,
    /// Language-risk sub-score (0-100).
    pub lr: i64,
    /// Composite guidance credibility index (0-100).
    pub gci: i64,
    /// Categorical tier.
    pub badge: Badge,
    /// Human-readable derivation note.
    pub rationale: String,
}
