//! The sequential pipeline orchestrator.
//!
//! Each operation drives one ticker's full pipeline end-to-end before
//! moving to the next; documents within a filing are evaluated in order
//! because first-match-wins lets later ones be skipped. Per-ticker
//! failures are collected into status rows so a batch never aborts on
//! one bad ticker.

use async_trait::async_trait;
use gci_core::{
    ActualValue, FiscalPeriod, GciError, LanguageMetrics, Metric, PeriodKey, Result,
    SourceSection, Ticker,
};
use gci_edgar::{EdgarClient, document_to_text};
use gci_extract::{analyze_language, defers_to_call, discover_exhibits, extract_statements,
    infer_period, normalize_text};
use gci_issuers::{IssuerRegistry, PageFetcher};
use gci_score::{ScoreRow, ScoringEngine};
use gci_store::{Company, GuidanceStore, PeriodUrls, parse_period_end};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Recent 8-K candidates examined per ticker.
const CANDIDATE_FILINGS: usize = 8;

/// The exhibit slot conventionally holding the numeric results release.
const RESULTS_EXHIBIT: &str = "99.1";

/// Reported revenue entries mirrored into delivered-only periods.
const MIRRORED_ACTUALS: usize = 4;

/// Configuration for a default pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Identifying User-Agent for the regulatory host.
    pub user_agent: String,
    /// Directory for the on-disk fetch cache.
    pub cache_dir: PathBuf,
    /// SQLite database path.
    pub db_path: PathBuf,
}

/// Outcome of one ticker within a batch operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDetail {
    /// Filings imported; the company row exists.
    Imported {
        /// Resolved 10-digit CIK.
        cik: String,
        /// Number of candidate filings found.
        filings: usize,
    },
    /// Guidance extraction finished.
    Extracted {
        /// Statements persisted in this run.
        statements: u64,
    },
    /// Actuals aligned and mirrored.
    ActualsPulled {
        /// Guidance pairs that received a value.
        aligned: usize,
    },
    /// Language metrics stored.
    LanguageAnalyzed {
        /// Words in the analyzed text.
        words_total: u64,
    },
    /// The ticker failed; the batch continued.
    Failed {
        /// Error rendered for reporting.
        error: String,
    },
}

/// One per-ticker row of a batch operation's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerStatus {
    /// The ticker this row describes.
    pub ticker: Ticker,
    /// What happened.
    pub detail: StatusDetail,
}

/// [`PageFetcher`] over a plain HTTP client, for issuer IR sites.
///
/// Issuer pages live off the regulatory host, so fetches here do not go
/// through the EDGAR rate limiter; the registry's inter-attempt delay
/// paces them instead.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with the given identifying user agent.
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<(Vec<u8>, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GciError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(GciError::Upstream {
                url: url.to_string(),
                status,
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GciError::Network(e.to_string()))?;
        Ok((bytes.to_vec(), content_type))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn page_text(&self, url: &str) -> Result<String> {
        let (bytes, content_type) = self.get(url).await?;
        document_to_text(&bytes, content_type.as_deref())
    }

    async fn page_html(&self, url: &str) -> Result<String> {
        let (bytes, _) = self.get(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The guidance credibility pipeline.
///
/// Owns the EDGAR client, the relational store, and the issuer adapter
/// registry, and exposes the operations the (external) API layer calls.
#[derive(Debug)]
pub struct GciPipeline {
    edgar: EdgarClient,
    store: Arc<GuidanceStore>,
    issuers: IssuerRegistry,
    pages: HttpPageFetcher,
}

impl GciPipeline {
    /// Build a pipeline with the default on-disk cache, SQLite store,
    /// and built-in issuer adapters.
    ///
    /// # Errors
    /// Returns an error if the cache directory or database cannot be
    /// opened.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let cache = Arc::new(gci_cache::FileCache::new(&config.cache_dir)?);
        Ok(Self {
            edgar: EdgarClient::new(&config.user_agent, cache),
            store: Arc::new(GuidanceStore::new(&config.db_path)?),
            issuers: IssuerRegistry::with_builtins(),
            pages: HttpPageFetcher::new(&config.user_agent),
        })
    }

    /// Assemble a pipeline from explicit parts.
    #[must_use]
    pub fn from_parts(
        edgar: EdgarClient,
        store: Arc<GuidanceStore>,
        issuers: IssuerRegistry,
        pages: HttpPageFetcher,
    ) -> Self {
        Self {
            edgar,
            store,
            issuers,
            pages,
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &GuidanceStore {
        &self.store
    }

    /// Resolve a ticker to its regulatory identifier, creating the
    /// company row on first sight.
    pub async fn resolve_identifier(&self, ticker: &Ticker) -> Result<String> {
        Ok(self.resolve_company(ticker).await?.cik)
    }

    async fn resolve_company(&self, ticker: &Ticker) -> Result<Company> {
        if let Some(company) = self.store.company_by_ticker(ticker.as_str())? {
            return Ok(company);
        }
        let (cik, name) = self.edgar.lookup_cik(ticker).await?;
        let id = self.store.upsert_company(ticker.as_str(), &cik, &name)?;
        Ok(Company {
            id,
            ticker: ticker.to_string(),
            cik,
            name,
        })
    }

    /// Resolve each ticker and prefetch its filing history.
    pub async fn import_filings(&self, tickers: &[Ticker]) -> Vec<TickerStatus> {
        let mut statuses = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let detail = match self.import_one(ticker).await {
                Ok(detail) => detail,
                Err(e) => StatusDetail::Failed {
                    error: e.to_string(),
                },
            };
            statuses.push(TickerStatus {
                ticker: ticker.clone(),
                detail,
            });
        }
        statuses
    }

    async fn import_one(&self, ticker: &Ticker) -> Result<StatusDetail> {
        let company = self.resolve_company(ticker).await?;
        let submissions = self.edgar.submissions(&company.cik).await?;
        let filings = submissions.filings_of_form("8-K", CANDIDATE_FILINGS).len();
        Ok(StatusDetail::Imported {
            cik: company.cik,
            filings,
        })
    }

    /// Extract and persist guidance for each ticker.
    ///
    /// The generic filing pipeline runs first; when it yields nothing,
    /// the issuer adapter registry takes over.
    pub async fn extract_guidance(&self, tickers: &[Ticker]) -> Vec<TickerStatus> {
        let mut statuses = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let detail = match self.extract_one(ticker).await {
                Ok(statements) => StatusDetail::Extracted { statements },
                Err(e) => StatusDetail::Failed {
                    error: e.to_string(),
                },
            };
            statuses.push(TickerStatus {
                ticker: ticker.clone(),
                detail,
            });
        }
        statuses
    }

    async fn extract_one(&self, ticker: &Ticker) -> Result<u64> {
        let company = self.resolve_company(ticker).await?;
        let submissions = self.edgar.submissions(&company.cik).await?;
        let mut inserted = 0u64;

        for filing in submissions.filings_of_form("8-K", CANDIDATE_FILINGS) {
            let base = self.edgar.archive_base(&company.cik, &filing.accession_number)?;
            let filing_url = format!("{base}/{}", filing.primary_document);

            // Index fetch failure degrades to the primary document alone.
            let exhibits = match self
                .edgar
                .filing_index_html(&company.cik, &filing.accession_number)
                .await
            {
                Ok(html) => discover_exhibits(&html, &base, &filing.primary_document),
                Err(e) => {
                    warn!(%ticker, error = %e, "index page unavailable, using primary document");
                    discover_exhibits("", &base, &filing.primary_document)
                }
            };

            for doc in exhibits {
                let text = match self.edgar.document_text(&doc.url).await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(url = %doc.url, error = %e, "document unavailable, skipping");
                        continue;
                    }
                };

                // The numeric-results slot can declare that guidance
                // comes live on the call; skip that document and keep
                // going with the next exhibit.
                if doc.exhibit_no.as_deref() == Some(RESULTS_EXHIBIT) && defers_to_call(&text) {
                    let key = infer_period(&normalize_text(&text));
                    let period_id = self.store.ensure_period(
                        company.id,
                        &key,
                        &PeriodUrls {
                            source_filing_url: Some(filing_url.clone()),
                            ..Default::default()
                        },
                    )?;
                    self.store.insert_exhibit(
                        period_id,
                        &doc,
                        Some(&EdgarClient::document_cache_key(&doc.url)),
                        true,
                    )?;
                    debug!(url = %doc.url, "guidance deferred to call");
                    continue;
                }

                let statements = extract_statements(&text);
                if statements.is_empty() {
                    continue;
                }

                let urls = PeriodUrls {
                    source_filing_url: Some(filing_url.clone()),
                    source_exhibit_url: Some(doc.url.clone()),
                    ..Default::default()
                };
                let mut first_period_id = None;
                for stmt in statements {
                    let period_id =
                        self.store.ensure_period(company.id, &stmt.period, &urls)?;
                    first_period_id.get_or_insert(period_id);
                    let stmt = stmt.with_source_url(doc.url.clone());
                    self.store.insert_guidance(period_id, &stmt)?;
                    inserted += 1;
                }
                if let Some(period_id) = first_period_id {
                    self.store.insert_exhibit(
                        period_id,
                        &doc,
                        Some(&EdgarClient::document_cache_key(&doc.url)),
                        false,
                    )?;
                }

                // First document yielding statements wins; remaining
                // documents of this filing are intentionally skipped.
                break;
            }
        }

        if inserted == 0 {
            inserted = self.issuer_fallback(ticker, &company).await?;
        }
        Ok(inserted)
    }

    async fn issuer_fallback(&self, ticker: &Ticker, company: &Company) -> Result<u64> {
        let statements = self.issuers.extract_fallback(ticker, &self.pages).await?;
        let mut inserted = 0u64;
        for stmt in statements {
            let urls = PeriodUrls {
                source_exhibit_url: stmt.source_url.clone(),
                ..Default::default()
            };
            let period_id = self.store.ensure_period(company.id, &stmt.period, &urls)?;
            self.store.insert_guidance(period_id, &stmt)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Fetch reported values, align them to guided periods, and mirror
    /// the most recent revenue actuals into delivered-only periods.
    pub async fn pull_actuals(&self, tickers: &[Ticker]) -> Vec<TickerStatus> {
        let mut statuses = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let detail = match self.pull_one(ticker).await {
                Ok(aligned) => StatusDetail::ActualsPulled { aligned },
                Err(e) => StatusDetail::Failed {
                    error: e.to_string(),
                },
            };
            statuses.push(TickerStatus {
                ticker: ticker.clone(),
                detail,
            });
        }
        statuses
    }

    async fn pull_one(&self, ticker: &Ticker) -> Result<usize> {
        let company = self.resolve_company(ticker).await?;
        let mut aligned = 0usize;

        for pair in self.store.guidance_pairs(company.id)? {
            let tag = pair.metric.xbrl_tag();
            let concept = self.edgar.company_concept(&company.cik, tag).await?;
            let raw = concept.aligned_value(pair.fy, pair.fp.map(|p| p.as_str()));
            let value = raw.map(|v| match pair.metric {
                Metric::Revenue => round2(v / 1_000_000.0),
                Metric::EpsDiluted => v,
            });
            if value.is_some() {
                aligned += 1;
            }
            self.store.upsert_actual(
                pair.period_id,
                &ActualValue {
                    metric: pair.metric,
                    value,
                    units: pair.metric.canonical_units(),
                    source_tag: format!("us-gaap:{tag}"),
                    source_api_url: self.edgar.concept_url(&company.cik, tag),
                },
            )?;
        }

        self.mirror_recent_revenue(&company).await?;
        Ok(aligned)
    }

    /// Keeps a delivered-only view available even when extraction never
    /// produced guidance: the most recent reported revenue entries land
    /// in (possibly synthesized) periods of their own.
    async fn mirror_recent_revenue(&self, company: &Company) -> Result<()> {
        let tag = Metric::Revenue.xbrl_tag();
        let concept = self.edgar.company_concept(&company.cik, tag).await?;
        for entry in concept.latest_numeric(MIRRORED_ACTUALS) {
            let Some(raw) = entry.val else { continue };
            let key = PeriodKey {
                fy: entry.fy,
                fp: entry.fp.as_deref().and_then(FiscalPeriod::parse),
                period_end: entry.end.as_deref().and_then(parse_period_end),
            };
            let period_id =
                self.store
                    .ensure_period(company.id, &key, &PeriodUrls::default())?;
            self.store.upsert_actual(
                period_id,
                &ActualValue {
                    metric: Metric::Revenue,
                    value: Some(round2(raw / 1_000_000.0)),
                    units: Metric::Revenue.canonical_units(),
                    source_tag: format!("us-gaap:{tag}"),
                    source_api_url: self.edgar.concept_url(&company.cik, tag),
                },
            )?;
        }
        Ok(())
    }

    /// Analyze disclosure language for each ticker and persist the
    /// metrics.
    ///
    /// Uses the latest 8-K primary document as a transcript proxy; an
    /// unavailable document degrades to an all-zero analysis rather than
    /// failing the ticker.
    pub async fn analyze_language(&self, tickers: &[Ticker]) -> Vec<TickerStatus> {
        let mut statuses = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let detail = match self.analyze_one(ticker).await {
                Ok(words_total) => StatusDetail::LanguageAnalyzed { words_total },
                Err(e) => StatusDetail::Failed {
                    error: e.to_string(),
                },
            };
            statuses.push(TickerStatus {
                ticker: ticker.clone(),
                detail,
            });
        }
        statuses
    }

    async fn analyze_one(&self, ticker: &Ticker) -> Result<u64> {
        let company = self.resolve_company(ticker).await?;
        let submissions = self.edgar.submissions(&company.cik).await?;

        let metrics = match submissions.filings_of_form("8-K", 1).first() {
            Some(filing) => {
                let base = self
                    .edgar
                    .archive_base(&company.cik, &filing.accession_number)?;
                let url = format!("{base}/{}", filing.primary_document);
                match self.edgar.document_text(&url).await {
                    Ok(text) => analyze_language(&text, SourceSection::Prepared),
                    Err(e) => {
                        warn!(%ticker, error = %e, "transcript proxy unavailable");
                        LanguageMetrics::empty(SourceSection::Prepared)
                    }
                }
            }
            None => LanguageMetrics::empty(SourceSection::Prepared),
        };

        let period_id = self.store.ensure_period(
            company.id,
            &PeriodKey::new(None, Some(FiscalPeriod::Fy)),
            &PeriodUrls::default(),
        )?;
        self.store.insert_language_metrics(period_id, &metrics)?;
        Ok(metrics.words_total)
    }

    /// Compute and persist scores for every company with at least one
    /// guidance+actual pair.
    pub fn compute_scores(&self) -> Result<Vec<ScoreRow>> {
        ScoringEngine::new(&self.store).compute_scores()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
