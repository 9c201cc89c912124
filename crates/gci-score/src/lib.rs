#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Scoring engine for the guidance credibility index.
//!
//! The math lives in free functions so the pure properties (determinism,
//! clamping, thresholds) are testable without a store; the
//! [`ScoringEngine`] wires them to persisted rows.

use gci_core::{Badge, CredibilityScore, FiscalPeriod, LanguageMetrics, Result};
use gci_store::{GuidancePair, GuidanceStore};
use tracing::debug;

/// Relative errors at or beyond this magnitude saturate.
const ERROR_CLAMP: f64 = 0.5;

/// Error dispersion at which the consistency score reaches zero.
const DISPERSION_FLOOR: f64 = 0.1;

/// Periods of history in scope for a company's score.
const PERIOD_WINDOW: usize = 4;

fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.clamp(min, max)
}

/// Population standard deviation; zero for an empty slice.
#[must_use]
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Clamped relative error of an actual against a guided midpoint.
///
/// Returns `None` for a missing or zero midpoint or a missing actual;
/// such pairs carry no error signal.
#[must_use]
pub fn relative_error(guided_mid: Option<f64>, actual: Option<f64>) -> Option<f64> {
    let g = guided_mid?;
    let a = actual?;
    if g == 0.0 {
        return None;
    }
    Some(clamp(((a - g) / g).abs(), 0.0, ERROR_CLAMP))
}

/// Timeliness-accuracy: 100 × (1 − mean error), 0 with no pairs in scope.
#[must_use]
pub fn timeliness_accuracy(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    100.0 * (1.0 - errors.iter().sum::<f64>() / errors.len() as f64)
}

/// Consistency-vs-volatility: full score at zero dispersion, zero score
/// once the error stddev reaches [`DISPERSION_FLOOR`].
#[must_use]
pub fn consistency_vs_volatility(errors: &[f64]) -> f64 {
    100.0 * (1.0 - (stddev(errors) / DISPERSION_FLOOR).min(1.0))
}

/// Language risk from the most recent language metrics.
///
/// raw = 0.5 × hedges/1k + 1.0 × uncertainty/1k, inverted onto 0-100.
/// Missing metrics contribute nothing, so an unanalyzed company scores
/// a full 100.
#[must_use]
pub fn language_risk(metrics: Option<&LanguageMetrics>) -> f64 {
    let (hedges, uncertainty) = metrics
        .map(|m| (m.hedges_per_k, m.uncertainty_per_k))
        .unwrap_or((0.0, 0.0));
    let raw = hedges * 0.5 + uncertainty * 1.0;
    clamp(100.0 - raw, 0.0, 100.0)
}

/// Composite index: 0.5·TRA + 0.2·CVP + 0.3·LR.
#[must_use]
pub fn composite(tra: f64, cvp: f64, lr: f64) -> f64 {
    0.5 * tra + 0.2 * cvp + 0.3 * lr
}

/// One computed score row, as reported to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    /// Company ticker.
    pub ticker: String,
    /// Fiscal year of the most recent in-scope period.
    pub fy: Option<i32>,
    /// Fiscal period label of the most recent in-scope period.
    pub fp: Option<FiscalPeriod>,
    /// Integer-rounded score.
    pub score: CredibilityScore,
}

/// Computes a company's score from its ordered pairs and latest language
/// metrics.
///
/// Pairs arrive ordered by fiscal recency; errors are pooled over the
/// first [`PERIOD_WINDOW`] distinct (fy, fp) groups. Pure: identical
/// inputs always produce the identical score.
#[must_use]
pub fn score_company(
    pairs: &[GuidancePair],
    language: Option<&LanguageMetrics>,
) -> (CredibilityScore, Option<(Option<i32>, Option<FiscalPeriod>)>) {
    let mut group_keys: Vec<(Option<i32>, Option<FiscalPeriod>)> = Vec::new();
    let mut errors: Vec<f64> = Vec::new();

    for pair in pairs {
        let Some(e) = relative_error(pair.guided_mid, pair.actual_value) else {
            continue;
        };
        let key = (pair.fy, pair.fp);
        if !group_keys.contains(&key) {
            if group_keys.len() == PERIOD_WINDOW {
                continue;
            }
            group_keys.push(key);
        }
        errors.push(e);
    }

    let tra = timeliness_accuracy(&errors);
    let cvp = consistency_vs_volatility(&errors);
    let lr = language_risk(language);
    let gci = composite(tra, cvp, lr);

    let score = CredibilityScore {
        tra: tra.round() as i64,
        cvp: cvp.round() as i64,
        lr: lr.round() as i64,
        gci: gci.round() as i64,
        badge: Badge::from_gci(gci),
        rationale: "Auto-computed from guidance vs actuals and language metrics.".to_string(),
    };
    (score, group_keys.first().copied())
}

/// Scoring engine over the persisted store.
#[derive(Debug)]
pub struct ScoringEngine<'a> {
    store: &'a GuidanceStore,
}

impl<'a> ScoringEngine<'a> {
    /// Create an engine over a store.
    #[must_use]
    pub const fn new(store: &'a GuidanceStore) -> Self {
        Self { store }
    }

    /// Computes and persists scores for every company having at least
    /// one guidance+actual pair.
    ///
    /// Each company's integer-rounded score replaces any prior score on
    /// the period of its most recent pair.
    pub fn compute_scores(&self) -> Result<Vec<ScoreRow>> {
        let mut rows = Vec::new();

        for company in self.store.companies_with_pairs()? {
            let pairs = self.store.guidance_pairs(company.id)?;
            let language = self.store.latest_language_metrics(company.id)?;
            let (score, latest_group) = score_company(&pairs, language.as_ref());

            let (fy, fp) = latest_group.unwrap_or((None, None));
            debug!(ticker = %company.ticker, gci = score.gci, badge = %score.badge, "scored");

            if let Some(most_recent) = pairs.first() {
                self.store.upsert_score(most_recent.period_id, &score)?;
            }

            rows.push(ScoreRow {
                ticker: company.ticker,
                fy,
                fp,
                score,
            });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gci_core::{
        ActualValue, GuidanceStatement, Metric, PeriodKey, SourceSection, Units,
    };
    use gci_store::PeriodUrls;

    fn pair(
        fy: i32,
        fp: FiscalPeriod,
        mid: f64,
        actual: f64,
    ) -> GuidancePair {
        GuidancePair {
            period_id: 1,
            fy: Some(fy),
            fp: Some(fp),
            metric: Metric::Revenue,
            guided_mid: Some(mid),
            actual_value: Some(actual),
        }
    }

    #[test]
    fn test_relative_error_basic_and_clamped() {
        assert_eq!(relative_error(Some(500.0), Some(510.0)), Some(0.02));
        // Saturates at 0.5.
        assert_eq!(relative_error(Some(100.0), Some(400.0)), Some(0.5));
        // No signal cases.
        assert_eq!(relative_error(Some(0.0), Some(10.0)), None);
        assert_eq!(relative_error(None, Some(10.0)), None);
        assert_eq!(relative_error(Some(10.0), None), None);
    }

    #[test]
    fn test_single_pair_tra_98() {
        let pairs = vec![pair(2025, FiscalPeriod::Q4, 500.0, 510.0)];
        let (score, latest) = score_company(&pairs, None);
        assert_eq!(score.tra, 98);
        assert_eq!(latest, Some((Some(2025), Some(FiscalPeriod::Q4))));
    }

    #[test]
    fn test_cvp_dispersion_bounds() {
        // Identical errors: zero dispersion, full score.
        assert_eq!(consistency_vs_volatility(&[0.02, 0.02, 0.02]), 100.0);
        // Dispersion at/beyond 0.1 floors the score.
        assert_eq!(consistency_vs_volatility(&[0.0, 0.2, 0.0, 0.2]), 0.0);
        // Empty history: stddev 0 means full score.
        assert_eq!(consistency_vs_volatility(&[]), 100.0);
    }

    #[test]
    fn test_language_risk() {
        let metrics = LanguageMetrics {
            words_total: 1000,
            hedges_per_k: 10.0,
            negations_per_k: 0.0,
            uncertainty_per_k: 5.0,
            vague_per_k: 0.0,
            source_section: SourceSection::Prepared,
        };
        // raw = 10*0.5 + 5*1.0 = 10 -> LR 90.
        assert_eq!(language_risk(Some(&metrics)), 90.0);
        assert_eq!(language_risk(None), 100.0);

        let noisy = LanguageMetrics {
            hedges_per_k: 300.0,
            ..metrics
        };
        assert_eq!(language_risk(Some(&noisy)), 0.0);
    }

    #[test]
    fn test_badge_thresholds_via_composite() {
        assert_eq!(Badge::from_gci(82.0), Badge::High);
        assert_eq!(Badge::from_gci(65.0), Badge::Medium);
        assert_eq!(Badge::from_gci(40.0), Badge::Low);
    }

    #[test]
    fn test_window_limits_to_four_period_groups() {
        let mut pairs = Vec::new();
        for fp in [
            FiscalPeriod::Fy,
            FiscalPeriod::Q4,
            FiscalPeriod::Q3,
            FiscalPeriod::Q2,
        ] {
            // Small errors for the four most recent periods.
            pairs.push(pair(2025, fp, 100.0, 101.0));
        }
        // A fifth, older group with a huge error must be out of scope.
        pairs.push(pair(2024, FiscalPeriod::Q1, 100.0, 200.0));

        let (score, _) = score_company(&pairs, None);
        assert_eq!(score.tra, 99);
    }

    #[test]
    fn test_no_pairs_scores_zero_tra() {
        let pairs = vec![GuidancePair {
            period_id: 1,
            fy: Some(2025),
            fp: Some(FiscalPeriod::Fy),
            metric: Metric::Revenue,
            guided_mid: Some(100.0),
            actual_value: None,
        }];
        let (score, latest) = score_company(&pairs, None);
        assert_eq!(score.tra, 0);
        assert_eq!(latest, None);
    }

    #[test]
    fn test_score_is_pure() {
        let pairs = vec![
            pair(2025, FiscalPeriod::Q4, 500.0, 510.0),
            pair(2025, FiscalPeriod::Q3, 480.0, 470.0),
        ];
        let first = score_company(&pairs, None);
        let second = score_company(&pairs, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_engine_persists_against_most_recent_pair() {
        let store = GuidanceStore::in_memory().unwrap();
        let company_id = store.upsert_company("ACME", "0000000001", "ACME").unwrap();

        let older = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2024), Some(FiscalPeriod::Q4)),
                &PeriodUrls::default(),
            )
            .unwrap();
        let newer = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2025), Some(FiscalPeriod::Q1)),
                &PeriodUrls::default(),
            )
            .unwrap();

        for (pid, mid, actual) in [(older, 400.0, 404.0), (newer, 500.0, 510.0)] {
            store
                .insert_guidance(
                    pid,
                    &GuidanceStatement::new(Metric::Revenue, mid - 10.0, mid + 10.0, "g"),
                )
                .unwrap();
            store
                .upsert_actual(
                    pid,
                    &ActualValue {
                        metric: Metric::Revenue,
                        value: Some(actual),
                        units: Units::UsdMillions,
                        source_tag: "us-gaap:Revenues".to_string(),
                        source_api_url: String::new(),
                    },
                )
                .unwrap();
        }

        let engine = ScoringEngine::new(&store);
        let rows = engine.compute_scores().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fy, Some(2025));

        // The score lands on the most recent pair's period and repeated
        // computation is idempotent.
        assert!(store.score_for_period(newer).unwrap().is_some());
        assert!(store.score_for_period(older).unwrap().is_none());
        let again = engine.compute_scores().unwrap();
        assert_eq!(rows, again);
    }
}
