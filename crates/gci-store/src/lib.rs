#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SQLite-backed store for the guidance credibility pipeline.
//!
//! The store enforces the data-model invariants the rest of the system
//! relies on:
//!
//! - period identity `(company, fy, fp, period_end)` is NULL-safe and
//!   immutable; resolving the same key twice never creates a second row
//! - period URL fields are backfilled only when previously empty
//! - guidance and exhibit rows are append-only
//! - actuals and scores replace atomically on their natural keys, so
//!   concurrent readers never observe an empty window

use chrono::NaiveDate;
use gci_core::{
    ActualValue, Badge, CredibilityScore, ExhibitDoc, FiscalPeriod, GciError, GuidanceStatement,
    LanguageMetrics, Metric, PeriodKey, Result, SourceSection,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// A stored company row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    /// Row id.
    pub id: i64,
    /// Uppercased ticker, unique.
    pub ticker: String,
    /// 10-digit zero-padded CIK.
    pub cik: String,
    /// Display name.
    pub name: String,
}

/// URL fields attached to a period on first observation.
///
/// Each field is written only when the stored value is still NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodUrls {
    /// URL of the source filing's primary document.
    pub source_filing_url: Option<String>,
    /// URL of the exhibit guidance was extracted from.
    pub source_exhibit_url: Option<String>,
    /// URL of the earnings call transcript.
    pub transcript_url: Option<String>,
}

/// One guidance row joined against its aligned actual, for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidancePair {
    /// Period row id.
    pub period_id: i64,
    /// Fiscal year of the period.
    pub fy: Option<i32>,
    /// Fiscal period label of the period.
    pub fp: Option<FiscalPeriod>,
    /// Guided metric.
    pub metric: Metric,
    /// Midpoint of the guided range.
    pub guided_mid: Option<f64>,
    /// Aligned actual value, when one has been stored.
    pub actual_value: Option<f64>,
}

/// SQLite-backed store.
///
/// The connection sits behind a `std::sync::Mutex`; statements are short
/// and the pipeline is sequential, so contention is not a concern.
#[derive(Debug)]
pub struct GuidanceStore {
    conn: Mutex<Connection>,
}

impl GuidanceStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema
    /// creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL UNIQUE,
                cik TEXT NOT NULL,
                name TEXT NOT NULL
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS periods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL,
                fy INTEGER,
                fp TEXT,
                period_end TEXT,
                source_filing_url TEXT,
                source_exhibit_url TEXT,
                transcript_url TEXT,
                FOREIGN KEY (company_id) REFERENCES companies(id)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS guidance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id INTEGER NOT NULL,
                metric TEXT NOT NULL,
                min_value REAL,
                max_value REAL,
                units TEXT,
                basis TEXT,
                extracted_text TEXT,
                segment TEXT,
                source_url TEXT,
                FOREIGN KEY (period_id) REFERENCES periods(id)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS actuals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id INTEGER NOT NULL,
                metric TEXT NOT NULL,
                actual_value REAL,
                units TEXT,
                source_tag TEXT,
                source_api_url TEXT,
                FOREIGN KEY (period_id) REFERENCES periods(id)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_actuals_period_metric
             ON actuals(period_id, metric)",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exhibits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id INTEGER NOT NULL,
                exhibit_no TEXT,
                url TEXT,
                content_type TEXT,
                file_name TEXT,
                text_cache_path TEXT,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (period_id) REFERENCES periods(id)
            )",
            [],
        )
        .map_err(store_err)?;

        // Evolution: the deferred flag arrived after the table shipped.
        // "duplicate column" is the one failure ignored here.
        if let Err(e) = conn.execute(
            "ALTER TABLE exhibits ADD COLUMN deferred_guidance INTEGER",
            [],
        ) {
            let msg = e.to_string();
            if !msg.contains("duplicate column") {
                return Err(GciError::Store(msg));
            }
        }

        conn.execute(
            "CREATE TABLE IF NOT EXISTS language_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id INTEGER NOT NULL,
                words_total INTEGER,
                hedges_per_k REAL,
                negations_per_k REAL,
                uncertainty_per_k REAL,
                vague_per_k REAL,
                source_section TEXT,
                FOREIGN KEY (period_id) REFERENCES periods(id)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                period_id INTEGER NOT NULL,
                tra REAL,
                cvp REAL,
                lr REAL,
                gci REAL,
                badge TEXT,
                rationale TEXT,
                FOREIGN KEY (period_id) REFERENCES periods(id)
            )",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_scores_period ON scores(period_id)",
            [],
        )
        .map_err(store_err)?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_companies_ticker ON companies(ticker)",
            [],
        )
        .map_err(store_err)?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_exhibits_period ON exhibits(period_id)",
            [],
        )
        .map_err(store_err)?;

        debug!("store schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| GciError::Store(e.to_string()))
    }

    /// Create a company row or update its display name.
    ///
    /// Identity (ticker, cik) never changes once created.
    #[instrument(skip(self))]
    pub fn upsert_company(&self, ticker: &str, cik: &str, name: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO companies (ticker, cik, name) VALUES (?1, ?2, ?3)
             ON CONFLICT(ticker) DO UPDATE SET name = excluded.name",
            params![ticker.to_uppercase(), cik, name],
        )
        .map_err(store_err)?;
        conn.query_row(
            "SELECT id FROM companies WHERE ticker = ?1",
            params![ticker.to_uppercase()],
            |row| row.get(0),
        )
        .map_err(store_err)
    }

    /// Look up a company by ticker.
    pub fn company_by_ticker(&self, ticker: &str) -> Result<Option<Company>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, ticker, cik, name FROM companies WHERE ticker = ?1",
            params![ticker.to_uppercase()],
            |row| {
                Ok(Company {
                    id: row.get(0)?,
                    ticker: row.get(1)?,
                    cik: row.get(2)?,
                    name: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(store_err)
    }

    /// All companies, ordered by ticker.
    pub fn companies(&self) -> Result<Vec<Company>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id, ticker, cik, name FROM companies ORDER BY ticker ASC")
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Company {
                    id: row.get(0)?,
                    ticker: row.get(1)?,
                    cik: row.get(2)?,
                    name: row.get(3)?,
                })
            })
            .map_err(store_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    /// Companies having at least one guidance row with an aligned actual.
    pub fn companies_with_pairs(&self) -> Result<Vec<Company>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT c.id, c.ticker, c.cik, c.name
                 FROM companies c
                 JOIN periods p ON p.company_id = c.id
                 JOIN guidance g ON g.period_id = p.id
                 JOIN actuals a ON a.period_id = p.id AND a.metric = g.metric
                 ORDER BY c.ticker ASC",
            )
            .map_err(store_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Company {
                    id: row.get(0)?,
                    ticker: row.get(1)?,
                    cik: row.get(2)?,
                    name: row.get(3)?,
                })
            })
            .map_err(store_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    /// Resolve a period by its NULL-safe identity key, creating it on
    /// first observation.
    ///
    /// On a hit, URL fields still NULL are backfilled from `urls`;
    /// populated fields are never overwritten. Returns the period row id.
    #[instrument(skip(self, urls))]
    pub fn ensure_period(
        &self,
        company_id: i64,
        key: &PeriodKey,
        urls: &PeriodUrls,
    ) -> Result<i64> {
        let conn = self.lock()?;
        let fp = key.fp.map(|p| p.as_str());
        let period_end = key.period_end.map(|d| d.to_string());

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM periods
                 WHERE company_id = ?1 AND fy IS ?2 AND fp IS ?3 AND period_end IS ?4",
                params![company_id, key.fy, fp, period_end],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_err)?;

        if let Some(id) = existing {
            conn.execute(
                "UPDATE periods SET
                    source_filing_url = COALESCE(source_filing_url, ?1),
                    source_exhibit_url = COALESCE(source_exhibit_url, ?2),
                    transcript_url = COALESCE(transcript_url, ?3)
                 WHERE id = ?4",
                params![
                    urls.source_filing_url,
                    urls.source_exhibit_url,
                    urls.transcript_url,
                    id
                ],
            )
            .map_err(store_err)?;
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO periods
                (company_id, fy, fp, period_end,
                 source_filing_url, source_exhibit_url, transcript_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                company_id,
                key.fy,
                fp,
                period_end,
                urls.source_filing_url,
                urls.source_exhibit_url,
                urls.transcript_url
            ],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Reads back a period's URL fields.
    pub fn period_urls(&self, period_id: i64) -> Result<PeriodUrls> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT source_filing_url, source_exhibit_url, transcript_url
             FROM periods WHERE id = ?1",
            params![period_id],
            |row| {
                Ok(PeriodUrls {
                    source_filing_url: row.get(0)?,
                    source_exhibit_url: row.get(1)?,
                    transcript_url: row.get(2)?,
                })
            },
        )
        .map_err(store_err)
    }

    /// Append one guidance statement. Multiple rows per period are
    /// expected (distinct metrics and segments).
    #[instrument(skip(self, stmt))]
    pub fn insert_guidance(&self, period_id: i64, stmt: &GuidanceStatement) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO guidance
                (period_id, metric, min_value, max_value, units, basis,
                 extracted_text, segment, source_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                period_id,
                stmt.metric.as_str(),
                stmt.min_value,
                stmt.max_value,
                stmt.units.as_str(),
                stmt.basis.map(|b| b.as_str()),
                stmt.extracted_text,
                stmt.segment,
                stmt.source_url
            ],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Store or replace the aligned actual for (period, metric).
    ///
    /// An atomic upsert on the natural key: after any number of writes
    /// exactly one row survives, and readers never observe a window with
    /// the old row deleted and the new one not yet inserted.
    #[instrument(skip(self, actual))]
    pub fn upsert_actual(&self, period_id: i64, actual: &ActualValue) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO actuals
                (period_id, metric, actual_value, units, source_tag, source_api_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(period_id, metric) DO UPDATE SET
                actual_value = excluded.actual_value,
                units = excluded.units,
                source_tag = excluded.source_tag,
                source_api_url = excluded.source_api_url",
            params![
                period_id,
                actual.metric.as_str(),
                actual.value,
                actual.units.as_str(),
                actual.source_tag,
                actual.source_api_url
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Append an exhibit audit row.
    #[instrument(skip(self, doc))]
    pub fn insert_exhibit(
        &self,
        period_id: i64,
        doc: &ExhibitDoc,
        text_cache_path: Option<&str>,
        deferred_guidance: bool,
    ) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO exhibits
                (period_id, exhibit_no, url, content_type, file_name,
                 text_cache_path, deferred_guidance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                period_id,
                doc.exhibit_no,
                doc.url,
                doc.content_type,
                doc.file_name,
                text_cache_path,
                i64::from(deferred_guidance)
            ],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Append a language metrics row for one analysis run.
    #[instrument(skip(self, metrics))]
    pub fn insert_language_metrics(
        &self,
        period_id: i64,
        metrics: &LanguageMetrics,
    ) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO language_metrics
                (period_id, words_total, hedges_per_k, negations_per_k,
                 uncertainty_per_k, vague_per_k, source_section)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                period_id,
                metrics.words_total as i64,
                metrics.hedges_per_k,
                metrics.negations_per_k,
                metrics.uncertainty_per_k,
                metrics.vague_per_k,
                metrics.source_section.as_str()
            ],
        )
        .map_err(store_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recently stored language metrics for a company.
    pub fn latest_language_metrics(&self, company_id: i64) -> Result<Option<LanguageMetrics>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT lm.words_total, lm.hedges_per_k, lm.negations_per_k,
                    lm.uncertainty_per_k, lm.vague_per_k, lm.source_section
             FROM language_metrics lm
             JOIN periods p ON p.id = lm.period_id
             WHERE p.company_id = ?1
             ORDER BY lm.id DESC
             LIMIT 1",
            params![company_id],
            |row| {
                Ok(LanguageMetrics {
                    words_total: row.get::<_, i64>(0)? as u64,
                    hedges_per_k: row.get(1)?,
                    negations_per_k: row.get(2)?,
                    uncertainty_per_k: row.get(3)?,
                    vague_per_k: row.get(4)?,
                    source_section: SourceSection::parse(&row.get::<_, String>(5)?)
                        .unwrap_or(SourceSection::Prepared),
                })
            },
        )
        .optional()
        .map_err(store_err)
    }

    /// Store or replace the current score for a period.
    #[instrument(skip(self, score))]
    pub fn upsert_score(&self, period_id: i64, score: &CredibilityScore) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scores (period_id, tra, cvp, lr, gci, badge, rationale)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(period_id) DO UPDATE SET
                tra = excluded.tra,
                cvp = excluded.cvp,
                lr = excluded.lr,
                gci = excluded.gci,
                badge = excluded.badge,
                rationale = excluded.rationale",
            params![
                period_id,
                score.tra,
                score.cvp,
                score.lr,
                score.gci,
                score.badge.as_str(),
                score.rationale
            ],
        )
        .map_err(store_err)?;
        Ok(())
    }

    /// Reads back the stored score for a period.
    pub fn score_for_period(&self, period_id: i64) -> Result<Option<CredibilityScore>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT tra, cvp, lr, gci, badge, rationale FROM scores WHERE period_id = ?1",
            params![period_id],
            |row| {
                Ok(CredibilityScore {
                    tra: row.get::<_, f64>(0)? as i64,
                    cvp: row.get::<_, f64>(1)? as i64,
                    lr: row.get::<_, f64>(2)? as i64,
                    gci: row.get::<_, f64>(3)? as i64,
                    badge: Badge::parse(&row.get::<_, String>(4)?).unwrap_or(Badge::Low),
                    rationale: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(store_err)
    }

    /// Guidance rows joined against their aligned actuals, ordered by
    /// fiscal recency.
    ///
    /// Ordering is explicit: fiscal year descending, then the period
    /// label ranked FY > Q4 > Q3 > Q2 > Q1, periods with no fiscal
    /// identity last. "Most recent N periods" selections downstream are
    /// therefore deterministic.
    pub fn guidance_pairs(&self, company_id: i64) -> Result<Vec<GuidancePair>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT g.period_id, p.fy, p.fp,
                        (g.min_value + g.max_value) / 2.0,
                        a.actual_value, g.metric
                 FROM guidance g
                 JOIN periods p ON p.id = g.period_id
                 LEFT JOIN actuals a
                        ON a.period_id = g.period_id AND a.metric = g.metric
                 WHERE p.company_id = ?1
                 ORDER BY (p.fy IS NULL) ASC, p.fy DESC,
                          CASE p.fp
                              WHEN 'FY' THEN 5 WHEN 'Q4' THEN 4 WHEN 'Q3' THEN 3
                              WHEN 'Q2' THEN 2 WHEN 'Q1' THEN 1 ELSE 0
                          END DESC,
                          g.id DESC",
            )
            .map_err(store_err)?;
        let rows = stmt
            .query_map(params![company_id], |row| {
                Ok(GuidancePair {
                    period_id: row.get(0)?,
                    fy: row.get(1)?,
                    fp: row
                        .get::<_, Option<String>>(2)?
                        .as_deref()
                        .and_then(FiscalPeriod::parse),
                    guided_mid: row.get(3)?,
                    actual_value: row.get(4)?,
                    metric: Metric::parse(&row.get::<_, String>(5)?).unwrap_or(Metric::Revenue),
                })
            })
            .map_err(store_err)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_err)
    }

    /// Number of guidance rows stored for a company.
    pub fn guidance_count(&self, company_id: i64) -> Result<u64> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM guidance g
             JOIN periods p ON p.id = g.period_id
             WHERE p.company_id = ?1",
            params![company_id],
            |row| row.get::<_, i64>(0).map(|n| n as u64),
        )
        .map_err(store_err)
    }
}

fn store_err(e: impl std::fmt::Display) -> GciError {
    GciError::Store(e.to_string())
}

/// Parses a stored period end date.
#[must_use]
pub fn parse_period_end(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gci_core::{Ticker, Units};

    fn seeded_store() -> (GuidanceStore, i64) {
        let store = GuidanceStore::in_memory().unwrap();
        let company_id = store
            .upsert_company(Ticker::new("acme").as_str(), "0000000001", "ACME Corp")
            .unwrap();
        (store, company_id)
    }

    fn revenue_stmt(min: f64, max: f64) -> GuidanceStatement {
        GuidanceStatement::new(Metric::Revenue, min, max, "revenue guidance")
    }

    fn revenue_actual(value: f64) -> ActualValue {
        ActualValue {
            metric: Metric::Revenue,
            value: Some(value),
            units: Units::UsdMillions,
            source_tag: "us-gaap:Revenues".to_string(),
            source_api_url: "https://data.sec.gov/api/...".to_string(),
        }
    }

    #[test]
    fn test_schema_reinit_is_idempotent() {
        let store = GuidanceStore::in_memory().unwrap();
        // Second pass replays every CREATE and the ALTER evolution.
        store.initialize_schema().unwrap();
    }

    #[test]
    fn test_company_upsert_updates_name_only() {
        let (store, id) = seeded_store();
        let again = store
            .upsert_company("ACME", "0000000099", "ACME Corporation")
            .unwrap();
        assert_eq!(id, again);

        let company = store.company_by_ticker("acme").unwrap().unwrap();
        assert_eq!(company.name, "ACME Corporation");
        // Identity never changes.
        assert_eq!(company.cik, "0000000001");
    }

    #[test]
    fn test_ensure_period_idempotent_with_nulls() {
        let (store, company_id) = seeded_store();
        let key = PeriodKey::new(None, Some(FiscalPeriod::Fy));

        let first = store
            .ensure_period(company_id, &key, &PeriodUrls::default())
            .unwrap();
        let second = store
            .ensure_period(company_id, &key, &PeriodUrls::default())
            .unwrap();
        assert_eq!(first, second);

        // A different key creates a new row.
        let other = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2026), Some(FiscalPeriod::Fy)),
                &PeriodUrls::default(),
            )
            .unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_period_urls_backfill_never_overwrite() {
        let (store, company_id) = seeded_store();
        let key = PeriodKey::new(Some(2026), Some(FiscalPeriod::Q1));

        let id = store
            .ensure_period(
                company_id,
                &key,
                &PeriodUrls {
                    source_exhibit_url: Some("https://a/ex991.htm".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        // Backfills the missing filing URL, must not overwrite the
        // populated exhibit URL.
        store
            .ensure_period(
                company_id,
                &key,
                &PeriodUrls {
                    source_filing_url: Some("https://a/8k.htm".to_string()),
                    source_exhibit_url: Some("https://b/other.htm".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let urls = store.period_urls(id).unwrap();
        assert_eq!(urls.source_filing_url.as_deref(), Some("https://a/8k.htm"));
        assert_eq!(urls.source_exhibit_url.as_deref(), Some("https://a/ex991.htm"));
        assert_eq!(urls.transcript_url, None);
    }

    #[test]
    fn test_actual_upsert_replace_semantics() {
        let (store, company_id) = seeded_store();
        let period_id = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2025), Some(FiscalPeriod::Q4)),
                &PeriodUrls::default(),
            )
            .unwrap();

        for value in [100.0, 200.0, 300.0] {
            store.upsert_actual(period_id, &revenue_actual(value)).unwrap();
        }

        let pairs = {
            store
                .insert_guidance(period_id, &revenue_stmt(250.0, 350.0))
                .unwrap();
            store.guidance_pairs(company_id).unwrap()
        };
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].actual_value, Some(300.0));
    }

    #[test]
    fn test_score_upsert_replaces() {
        let (store, company_id) = seeded_store();
        let period_id = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2025), Some(FiscalPeriod::Fy)),
                &PeriodUrls::default(),
            )
            .unwrap();

        let mut score = CredibilityScore {
            tra: 98,
            cvp: 100,
            lr: 90,
            gci: 96,
            badge: Badge::High,
            rationale: "first".to_string(),
        };
        store.upsert_score(period_id, &score).unwrap();

        score.gci = 60;
        score.badge = Badge::Medium;
        score.rationale = "second".to_string();
        store.upsert_score(period_id, &score).unwrap();

        let stored = store.score_for_period(period_id).unwrap().unwrap();
        assert_eq!(stored.gci, 60);
        assert_eq!(stored.badge, Badge::Medium);
        assert_eq!(stored.rationale, "second");
    }

    #[test]
    fn test_guidance_pairs_ordered_by_fiscal_recency() {
        let (store, company_id) = seeded_store();
        let keys = [
            PeriodKey::new(Some(2024), Some(FiscalPeriod::Fy)),
            PeriodKey::new(Some(2025), Some(FiscalPeriod::Q1)),
            PeriodKey::new(Some(2025), Some(FiscalPeriod::Fy)),
            PeriodKey::new(None, None),
        ];
        for key in &keys {
            let pid = store
                .ensure_period(company_id, key, &PeriodUrls::default())
                .unwrap();
            store
                .insert_guidance(pid, &revenue_stmt(100.0, 120.0))
                .unwrap();
        }

        let pairs = store.guidance_pairs(company_id).unwrap();
        let order: Vec<(Option<i32>, Option<FiscalPeriod>)> =
            pairs.iter().map(|p| (p.fy, p.fp)).collect();
        assert_eq!(
            order,
            vec![
                (Some(2025), Some(FiscalPeriod::Fy)),
                (Some(2025), Some(FiscalPeriod::Q1)),
                (Some(2024), Some(FiscalPeriod::Fy)),
                (None, None),
            ]
        );
        assert_eq!(pairs[0].guided_mid, Some(110.0));
    }

    #[test]
    fn test_companies_with_pairs_requires_matching_metric() {
        let (store, company_id) = seeded_store();
        let period_id = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2025), Some(FiscalPeriod::Q2)),
                &PeriodUrls::default(),
            )
            .unwrap();
        store
            .insert_guidance(period_id, &revenue_stmt(500.0, 520.0))
            .unwrap();

        // Actual for a different metric does not make a pair.
        store
            .upsert_actual(
                period_id,
                &ActualValue {
                    metric: Metric::EpsDiluted,
                    value: Some(1.25),
                    units: Units::Eps,
                    source_tag: "us-gaap:EarningsPerShareDiluted".to_string(),
                    source_api_url: String::new(),
                },
            )
            .unwrap();
        assert!(store.companies_with_pairs().unwrap().is_empty());

        store.upsert_actual(period_id, &revenue_actual(510.0)).unwrap();
        let companies = store.companies_with_pairs().unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].ticker, "ACME");
    }

    #[test]
    fn test_exhibit_audit_trail_appends() {
        let (store, company_id) = seeded_store();
        let period_id = store
            .ensure_period(
                company_id,
                &PeriodKey::new(Some(2026), Some(FiscalPeriod::Q1)),
                &PeriodUrls::default(),
            )
            .unwrap();
        let doc = ExhibitDoc {
            exhibit_no: Some("99.1".to_string()),
            url: "https://a/ex991.htm".to_string(),
            content_type: Some("text/html".to_string()),
            file_name: Some("ex991.htm".to_string()),
        };
        let a = store.insert_exhibit(period_id, &doc, None, true).unwrap();
        let b = store.insert_exhibit(period_id, &doc, None, false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_latest_language_metrics() {
        let (store, company_id) = seeded_store();
        let period_id = store
            .ensure_period(
                company_id,
                &PeriodKey::new(None, Some(FiscalPeriod::Fy)),
                &PeriodUrls::default(),
            )
            .unwrap();

        let mut metrics = LanguageMetrics {
            words_total: 100,
            hedges_per_k: 10.0,
            negations_per_k: 2.0,
            uncertainty_per_k: 5.0,
            vague_per_k: 1.0,
            source_section: SourceSection::Prepared,
        };
        store.insert_language_metrics(period_id, &metrics).unwrap();
        metrics.hedges_per_k = 20.0;
        store.insert_language_metrics(period_id, &metrics).unwrap();

        let latest = store.latest_language_metrics(company_id).unwrap().unwrap();
        assert_eq!(latest.hedges_per_k, 20.0);
    }
}
