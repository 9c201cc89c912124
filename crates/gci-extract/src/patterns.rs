//! Pattern families and sentence-level extraction.
//!
//! Families are tried in priority order for the revenue metric:
//!
//! 1. midpoint ± percentage
//! 2. explicit dollar range with a billion/million unit
//! 3. named-segment revenue range (catches unit-suffixed ranges written
//!    without dollar signs, keeping the segment label)
//!
//! The EPS family runs independently of the revenue chain and rejects
//! any range carrying a billion/million suffix. All dollar amounts are
//! normalized to USD millions; EPS values pass through unscaled.

use gci_core::{Basis, FiscalPeriod, GuidanceStatement, Metric, PeriodKey};
use regex::Regex;
use std::sync::LazyLock;

use crate::text::has_guidance_keywords;

static MIDPOINT_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\s*([0-9]+(?:\.[0-9]+)?)\s*(billion|million|bn|mm|b|m)?\b\s*,?\s*(?:plus\s+or\s+minus|\+/-|±)\s*([0-9]+(?:\.[0-9]+)?)\s*(?:%|percent)",
    )
    .unwrap()
});

static DOLLAR_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\s*([0-9]+(?:\.[0-9]+)?)\s*(?:(billion|million|bn|mm|b|m)\b)?\s*(?:-|to|and)\s*\$?\s*([0-9]+(?:\.[0-9]+)?)\s*(billion|million|bn|mm|b|m)\b",
    )
    .unwrap()
});

static DOLLAR_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s*([0-9]+(?:\.[0-9]+)?)\s*(billion|million|bn|mm|b|m)\b").unwrap()
});

static SEGMENT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Z][A-Za-z&]*(?:\s+[A-Z][A-Za-z&]*){0,3})(?:\s+segment)?\s+revenue\s+(?:of|between|in\s+the\s+range\s+of)\s+\$?\s*([0-9]+(?:\.[0-9]+)?)\s*(?:billion|million)?\s*(?:-|to|and)\s*\$?\s*([0-9]+(?:\.[0-9]+)?)\s*(billion|million)\b",
    )
    .unwrap()
});

static EPS_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\$\s*([0-9]+(?:\.[0-9]+)?)\s*(?:-|to|and)\s*\$?\s*([0-9]+(?:\.[0-9]+)?)(?:\s*(billion|million|bn|mm|b|m)\b)?",
    )
    .unwrap()
});

static NON_GAAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)non-?\s?GAAP").unwrap());
static GAAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bGAAP\b").unwrap());

static FY_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bFY\s*([0-9]{4})").unwrap());
static FP_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(Q[1-4]|FY)\b").unwrap());

/// A matched revenue range in USD millions, with an optional segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRange {
    /// Low end, USD millions.
    pub min: f64,
    /// High end, USD millions.
    pub max: f64,
    /// Segment label when the range was scoped to one.
    pub segment: Option<String>,
}

/// A matched per-share range, unscaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsRange {
    /// Low end.
    pub min: f64,
    /// High end.
    pub max: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn unit_factor(unit: Option<&str>) -> f64 {
    match unit.map(str::to_lowercase).as_deref() {
        Some("billion" | "bn" | "b") => 1000.0,
        _ => 1.0,
    }
}

/// Family (a): "$5.2 billion, plus or minus 2%".
///
/// min/max = midpoint × (1 ∓ pct/100), in USD millions.
#[must_use]
pub fn match_midpoint_percent(sentence: &str) -> Option<RevenueRange> {
    let caps = MIDPOINT_PERCENT.captures(sentence)?;
    let mid: f64 = caps[1].parse().ok()?;
    let factor = unit_factor(caps.get(2).map(|m| m.as_str()));
    let pct: f64 = caps[3].parse().ok()?;
    let mid = mid * factor;
    Some(RevenueRange {
        min: round2(mid * (1.0 - pct / 100.0)),
        max: round2(mid * (1.0 + pct / 100.0)),
        segment: None,
    })
}

/// Family (b): "$500 million to $520 million", "$5.2-$5.4B", or a single
/// "$5.2 billion" point. A billion/million unit is required; a value
/// missing its own unit borrows the other side's.
#[must_use]
pub fn match_dollar_range(sentence: &str) -> Option<RevenueRange> {
    if let Some(caps) = DOLLAR_RANGE.captures(sentence) {
        let a: f64 = caps[1].parse().ok()?;
        let b: f64 = caps[3].parse().ok()?;
        let unit_b = caps.get(4).map(|m| m.as_str());
        let unit_a = caps.get(2).map(|m| m.as_str()).or(unit_b);
        return Some(RevenueRange {
            min: round2(a * unit_factor(unit_a)),
            max: round2(b * unit_factor(unit_b)),
            segment: None,
        });
    }
    let caps = DOLLAR_SINGLE.captures(sentence)?;
    let v: f64 = caps[1].parse().ok()?;
    let v = round2(v * unit_factor(caps.get(2).map(|m| m.as_str())));
    Some(RevenueRange {
        min: v,
        max: v,
        segment: None,
    })
}

/// Family (c): "Data Center revenue of 21.5 to 22.0 billion".
///
/// Catches segment-scoped ranges written without dollar signs and keeps
/// the segment label. Keywords are matched lowercase so the capitalized
/// run before "revenue" is the segment name.
#[must_use]
pub fn match_segment_range(sentence: &str) -> Option<RevenueRange> {
    let caps = SEGMENT_RANGE.captures(sentence)?;
    let factor = unit_factor(Some(&caps[4]));
    let a: f64 = caps[2].parse().ok()?;
    let b: f64 = caps[3].parse().ok()?;
    Some(RevenueRange {
        min: round2(a * factor),
        max: round2(b * factor),
        segment: Some(caps[1].trim().to_string()),
    })
}

/// Family (d): "$1.20 to $1.30" with no billion/million suffix.
///
/// A suffixed range is a revenue sentence and is rejected here.
#[must_use]
pub fn match_eps_range(sentence: &str) -> Option<EpsRange> {
    let caps = EPS_RANGE.captures(sentence)?;
    if caps.get(3).is_some() {
        return None;
    }
    Some(EpsRange {
        min: caps[1].parse().ok()?,
        max: caps[2].parse().ok()?,
    })
}

/// Flags the accounting basis by substring match; "non-GAAP" wins over
/// a bare "GAAP" mention.
#[must_use]
pub fn detect_basis(sentence: &str) -> Option<Basis> {
    if NON_GAAP.is_match(sentence) {
        Some(Basis::NonGaap)
    } else if GAAP.is_match(sentence) {
        Some(Basis::Gaap)
    } else {
        None
    }
}

/// Infers fiscal period identity from the sentence.
#[must_use]
pub fn infer_period(sentence: &str) -> PeriodKey {
    let fy = FY_YEAR
        .captures(sentence)
        .and_then(|c| c[1].parse::<i32>().ok());
    let fp = FP_LABEL
        .captures(sentence)
        .and_then(|c| FiscalPeriod::parse(&c[1]));
    PeriodKey::new(fy, fp)
}

/// Extracts guidance statements from one sentence.
///
/// The sentence must pass the guidance keyword gate. The revenue chain
/// takes the first matching family in priority order; the EPS family is
/// applied independently.
#[must_use]
pub fn extract_from_sentence(sentence: &str) -> Vec<GuidanceStatement> {
    if !has_guidance_keywords(sentence) {
        return Vec::new();
    }

    let period = infer_period(sentence);
    let basis = detect_basis(sentence);
    let mut out = Vec::new();

    let revenue = match_midpoint_percent(sentence)
        .or_else(|| match_dollar_range(sentence))
        .or_else(|| match_segment_range(sentence));
    if let Some(range) = revenue {
        let mut stmt = GuidanceStatement::new(Metric::Revenue, range.min, range.max, sentence)
            .with_period(period.clone())
            .with_basis(basis);
        if let Some(segment) = range.segment {
            stmt = stmt.with_segment(segment);
        }
        out.push(stmt);
    }

    if let Some(eps) = match_eps_range(sentence) {
        out.push(
            GuidanceStatement::new(Metric::EpsDiluted, eps.min, eps.max, sentence)
                .with_period(period)
                .with_basis(basis),
        );
    }

    out
}

/// Extracts guidance statements from a whole normalized document.
#[must_use]
pub fn extract_statements(text: &str) -> Vec<GuidanceStatement> {
    let normalized = crate::text::normalize_text(text);
    crate::text::split_sentences(&normalized)
        .into_iter()
        .flat_map(extract_from_sentence)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gci_core::Units;

    #[test]
    fn test_midpoint_percent() {
        let stmts =
            extract_from_sentence("revenue is expected to be $5.2 billion, plus or minus 2%");
        assert_eq!(stmts.len(), 1);
        let s = &stmts[0];
        assert_eq!(s.metric, Metric::Revenue);
        assert_eq!(s.min_value, 5096.0);
        assert_eq!(s.max_value, 5304.0);
        assert_eq!(s.units, Units::UsdMillions);
    }

    #[test]
    fn test_dollar_range_millions() {
        let stmts = extract_from_sentence("revenue to be between $500 million and $520 million");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].min_value, 500.0);
        assert_eq!(stmts[0].max_value, 520.0);
    }

    #[test]
    fn test_dollar_range_borrows_trailing_unit() {
        let range = match_dollar_range("sees revenue of $5.2-$5.4B for the year").unwrap();
        assert_eq!(range.min, 5200.0);
        assert_eq!(range.max, 5400.0);
    }

    #[test]
    fn test_inverted_range_normalized() {
        let stmts = extract_from_sentence("expects revenue of $520 million to $500 million");
        assert_eq!(stmts[0].min_value, 500.0);
        assert_eq!(stmts[0].max_value, 520.0);
    }

    #[test]
    fn test_segment_range_without_dollar_signs() {
        let stmts =
            extract_from_sentence("expects Data Center revenue of 21.5 to 22.0 billion");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].segment.as_deref(), Some("Data Center"));
        assert_eq!(stmts[0].min_value, 21500.0);
        assert_eq!(stmts[0].max_value, 22000.0);
    }

    #[test]
    fn test_eps_range_plain() {
        let stmts = extract_from_sentence("expects diluted EPS between $1.20 and $1.30");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].metric, Metric::EpsDiluted);
        assert_eq!(stmts[0].min_value, 1.20);
        assert_eq!(stmts[0].max_value, 1.30);
        assert_eq!(stmts[0].units, Units::Eps);
    }

    #[test]
    fn test_eps_rejects_unit_suffix() {
        assert!(match_eps_range("revenue of $5.2 to $5.4 billion").is_none());
    }

    #[test]
    fn test_revenue_and_eps_in_one_sentence() {
        let stmts = extract_from_sentence(
            "guidance: revenue between $500 million and $520 million with diluted EPS of $1.20 to $1.30",
        );
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].metric, Metric::Revenue);
        assert_eq!(stmts[1].metric, Metric::EpsDiluted);
        assert_eq!(stmts[1].min_value, 1.20);
    }

    #[test]
    fn test_basis_detection() {
        assert_eq!(detect_basis("on a non-GAAP basis"), Some(Basis::NonGaap));
        assert_eq!(detect_basis("GAAP revenue of $1 billion"), Some(Basis::Gaap));
        assert_eq!(detect_basis("revenue of $1 billion"), None);
    }

    #[test]
    fn test_infer_period() {
        let key = infer_period("FY 2026 outlook calls for growth");
        assert_eq!(key.fy, Some(2026));
        assert_eq!(key.fp, Some(FiscalPeriod::Fy));

        let key = infer_period("for Q3, the company expects $1.0 billion");
        assert_eq!(key.fy, None);
        assert_eq!(key.fp, Some(FiscalPeriod::Q3));
    }

    #[test]
    fn test_keyword_gate_blocks_extraction() {
        assert!(extract_from_sentence("the dividend is $0.24 to $0.26 per share").is_empty());
    }

    #[test]
    fn test_document_level_extraction() {
        let text = "ACME reported results today.\n\
            For FY 2026, revenue is expected to be $5.2 billion, plus or minus 2%. \
            The company also expects diluted EPS between $1.20 and $1.30. \
            A dividend of $0.25 was declared.";
        let stmts = extract_statements(text);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].period.fy, Some(2026));
        assert_eq!(stmts[1].metric, Metric::EpsDiluted);
    }
}
