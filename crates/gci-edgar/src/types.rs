//! SEC API response types.
//!
//! The submissions endpoint returns recent filings as parallel arrays
//! where each index corresponds to one filing; the company-concept
//! endpoint returns unit-keyed arrays of reported values.

use gci_core::{GciError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Company ticker entry from company_tickers.json.
#[derive(Debug, Deserialize)]
pub struct CompanyTickerEntry {
    /// CIK as a number (SEC returns this as an integer).
    pub cik_str: u64,
    /// Ticker symbol.
    pub ticker: String,
    /// Company name.
    pub title: String,
}

/// Company submissions/filings metadata from the submissions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Submissions {
    /// Company name as registered with the SEC.
    #[serde(default)]
    pub name: String,
    /// Filing history.
    pub filings: FilingHistory,
}

/// Container for filing history data.
#[derive(Debug, Clone, Deserialize)]
pub struct FilingHistory {
    /// Recent filings block.
    pub recent: RecentFilings,
}

/// Recent filings as parallel arrays.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFilings {
    /// Accession numbers (unique filing identifiers).
    #[serde(default)]
    pub accession_number: Vec<String>,
    /// Form types (e.g. "8-K", "10-Q").
    #[serde(default)]
    pub form: Vec<String>,
    /// Filing dates in YYYY-MM-DD form.
    #[serde(default)]
    pub filing_date: Vec<String>,
    /// Primary document file names.
    #[serde(default)]
    pub primary_document: Vec<String>,
}

/// One filing selected from the submissions arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filing {
    /// Accession number with dashes (e.g. "0000320193-25-000077").
    pub accession_number: String,
    /// Form type.
    pub form: String,
    /// Filing date string as reported.
    pub filing_date: String,
    /// Primary document file name.
    pub primary_document: String,
}

impl Submissions {
    /// Selects recent filings of the given form type, capped at `limit`,
    /// in the API's most-recent-first order.
    #[must_use]
    pub fn filings_of_form(&self, form: &str, limit: usize) -> Vec<Filing> {
        let recent = &self.filings.recent;
        let mut out = Vec::new();
        for i in 0..recent.form.len() {
            if recent.form[i] != form {
                continue;
            }
            let (Some(accession), Some(doc)) = (
                recent.accession_number.get(i),
                recent.primary_document.get(i),
            ) else {
                continue;
            };
            out.push(Filing {
                accession_number: accession.clone(),
                form: recent.form[i].clone(),
                filing_date: recent.filing_date.get(i).cloned().unwrap_or_default(),
                primary_document: doc.clone(),
            });
            if out.len() == limit {
                break;
            }
        }
        out
    }
}

/// Response from the XBRL company-concept endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptResponse {
    /// Reported values keyed by unit ("USD", "USD/shares", ...).
    #[serde(default)]
    pub units: HashMap<String, Vec<ConceptValue>>,
}

/// A single reported value in a concept series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConceptValue {
    /// Reported value. Absent for footnote-only entries.
    #[serde(default)]
    pub val: Option<f64>,
    /// Fiscal year the value was reported for.
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period label the value was reported for.
    #[serde(default)]
    pub fp: Option<String>,
    /// End date of the covered period (YYYY-MM-DD).
    #[serde(default)]
    pub end: Option<String>,
    /// Form the value was filed on.
    #[serde(default)]
    pub form: Option<String>,
}

impl ConceptResponse {
    /// The value series: USD units first, then per-share units.
    #[must_use]
    pub fn series(&self) -> &[ConceptValue] {
        self.units
            .get("USD")
            .or_else(|| self.units.get("USD/shares"))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Aligns a reported value to a guided period.
    ///
    /// Picks the first series entry whose fiscal year and fiscal period
    /// both match (fp compared case-insensitively; an absent constraint
    /// matches anything). Falls back to the chronologically latest
    /// numeric entry when no exact match exists.
    #[must_use]
    pub fn aligned_value(&self, fy: Option<i32>, fp: Option<&str>) -> Option<f64> {
        let series = self.series();
        for v in series {
            if let Some(want_fy) = fy
                && v.fy != Some(want_fy)
            {
                continue;
            }
            if let Some(want_fp) = fp {
                let Some(have_fp) = &v.fp else { continue };
                if !have_fp.eq_ignore_ascii_case(want_fp) {
                    continue;
                }
            }
            if let Some(val) = v.val {
                return Some(val);
            }
        }
        series.iter().rev().find_map(|v| v.val)
    }

    /// The chronologically latest `n` numeric entries, most recent first.
    #[must_use]
    pub fn latest_numeric(&self, n: usize) -> Vec<&ConceptValue> {
        self.series()
            .iter()
            .rev()
            .filter(|v| v.val.is_some())
            .take(n)
            .collect()
    }
}

/// Zero-pads a CIK to the 10 digits EDGAR URLs require.
#[must_use]
pub fn pad_cik(cik: &str) -> String {
    format!("{:0>10}", cik)
}

/// Strips leading zeros for the numeric archive path form.
///
/// # Errors
/// Returns an error if the CIK is not numeric.
pub fn cik_numeric(cik: &str) -> Result<u64> {
    cik.trim_start_matches('0')
        .parse::<u64>()
        .map_err(|_| GciError::InvalidParameter(format!("Non-numeric CIK: {cik}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_submissions() -> Submissions {
        serde_json::from_str(
            r#"{
                "name": "ACME CORP",
                "filings": {
                    "recent": {
                        "accessionNumber": ["0001-25-0003", "0001-25-0002", "0001-25-0001"],
                        "form": ["8-K", "10-Q", "8-K"],
                        "filingDate": ["2025-05-01", "2025-04-20", "2025-02-01"],
                        "primaryDocument": ["ex3.htm", "q1.htm", "ex1.htm"]
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_filings_of_form_filters_and_caps() {
        let subs = sample_submissions();
        let eights = subs.filings_of_form("8-K", 8);
        assert_eq!(eights.len(), 2);
        assert_eq!(eights[0].accession_number, "0001-25-0003");
        assert_eq!(eights[1].primary_document, "ex1.htm");

        let capped = subs.filings_of_form("8-K", 1);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn test_aligned_value_exact_match() {
        let concept: ConceptResponse = serde_json::from_str(
            r#"{"units": {"USD": [
                {"val": 1.0, "fy": 2024, "fp": "q3", "end": "2024-09-30"},
                {"val": 2.0, "fy": 2025, "fp": "Q1", "end": "2025-03-31"}
            ]}}"#,
        )
        .unwrap();

        // Case-insensitive fp match.
        assert_eq!(concept.aligned_value(Some(2024), Some("Q3")), Some(1.0));
        // No exact match: latest numeric wins.
        assert_eq!(concept.aligned_value(Some(2023), Some("Q2")), Some(2.0));
        // Unconstrained: first numeric entry.
        assert_eq!(concept.aligned_value(None, None), Some(1.0));
    }

    #[test]
    fn test_aligned_value_skips_non_numeric() {
        let concept: ConceptResponse = serde_json::from_str(
            r#"{"units": {"USD": [
                {"fy": 2025, "fp": "Q1"},
                {"val": 5.0, "fy": 2025, "fp": "Q1"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(concept.aligned_value(Some(2025), Some("Q1")), Some(5.0));
    }

    #[test]
    fn test_latest_numeric_most_recent_first() {
        let concept: ConceptResponse = serde_json::from_str(
            r#"{"units": {"USD": [
                {"val": 1.0, "fy": 2024, "fp": "Q1"},
                {"val": 2.0, "fy": 2024, "fp": "Q2"},
                {"val": 3.0, "fy": 2024, "fp": "Q3"}
            ]}}"#,
        )
        .unwrap();
        let latest = concept.latest_numeric(2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].val, Some(3.0));
        assert_eq!(latest[1].val, Some(2.0));
    }

    #[test]
    fn test_usd_shares_fallback() {
        let concept: ConceptResponse = serde_json::from_str(
            r#"{"units": {"USD/shares": [{"val": 1.25, "fy": 2025, "fp": "FY"}]}}"#,
        )
        .unwrap();
        assert_eq!(concept.aligned_value(Some(2025), Some("FY")), Some(1.25));
    }

    #[test]
    fn test_cik_helpers() {
        assert_eq!(pad_cik("320193"), "0000320193");
        assert_eq!(pad_cik("1234567890"), "1234567890");
        assert_eq!(cik_numeric("0000320193").unwrap(), 320193);
        assert!(cik_numeric("not-a-cik").is_err());
    }
}
