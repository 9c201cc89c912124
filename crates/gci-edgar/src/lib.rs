#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gci/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR client for the guidance credibility pipeline.
//!
//! This crate covers every exchange with the regulatory host:
//!
//! - CIK lookup from ticker symbols
//! - Submissions (filing history) and XBRL company-concept JSON, read
//!   through a cache with a stale-fallback path
//! - Filing index pages and exhibit documents, reduced to plain text
//!   (HTML body extraction or PDF text extraction)
//!
//! Every outbound request funnels through one ordered [`RateLimiter`]
//! enforcing the SEC's request spacing.
//!
//! # Example
//!
//! ```no_run
//! use gci_edgar::EdgarClient;
//! use gci_core::Ticker;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> gci_core::Result<()> {
//!     let cache = Arc::new(gci_cache::FileCache::new(".cache/sec")?);
//!     let client = EdgarClient::new("MyApp/1.0 (contact@example.com)", cache);
//!
//!     let (cik, name) = client.lookup_cik(&Ticker::new("AAPL")).await?;
//!     let subs = client.submissions(&cik).await?;
//!     println!("{name}: {} recent 8-Ks", subs.filings_of_form("8-K", 8).len());
//!     Ok(())
//! }
//! ```

/// Ordered rate limiting for requests to the regulatory host.
pub mod throttle;
/// SEC API response types and alignment helpers.
pub mod types;

pub use throttle::{DEFAULT_MIN_INTERVAL, RateLimiter};
pub use types::{
    CompanyTickerEntry, ConceptResponse, ConceptValue, Filing, RecentFilings, Submissions,
    cik_numeric, pad_cik,
};

use gci_core::{GciError, HttpCache, Result, Ticker};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// SEC data API host.
const DATA_BASE_URL: &str = "https://data.sec.gov";

/// SEC archive/static host.
const WWW_BASE_URL: &str = "https://www.sec.gov";

/// TTL for cached submissions and concept payloads.
const JSON_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL for the ticker-to-CIK mapping file.
const TICKERS_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// SEC EDGAR client.
///
/// Wraps a reqwest client with the identifying User-Agent the SEC
/// requires, a shared ordered [`RateLimiter`], and a read-through
/// [`HttpCache`] for the JSON endpoints. A failed live fetch returns the
/// cached entry even past its TTL when one exists; there is no retry.
pub struct EdgarClient {
    client: reqwest::Client,
    limiter: Arc<Mutex<RateLimiter>>,
    cache: Arc<dyn HttpCache>,
    data_base: String,
    www_base: String,
    json_ttl: Duration,
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("data_base", &self.data_base)
            .field("www_base", &self.www_base)
            .field("json_ttl", &self.json_ttl)
            .finish_non_exhaustive()
    }
}

impl EdgarClient {
    /// Create a client with the specified user agent and cache.
    ///
    /// The SEC requires identifying user agent headers, format
    /// "AppName/Version (contact@email.com)".
    #[must_use]
    pub fn new(user_agent: &str, cache: Arc<dyn HttpCache>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self::with_client(client, cache)
    }

    /// Create a client from a pre-configured reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, cache: Arc<dyn HttpCache>) -> Self {
        Self {
            client,
            limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_MIN_INTERVAL))),
            cache,
            data_base: DATA_BASE_URL.to_string(),
            www_base: WWW_BASE_URL.to_string(),
            json_ttl: JSON_TTL,
        }
    }

    /// Overrides the upstream hosts. Intended for tests against a local
    /// mock server.
    #[must_use]
    pub fn with_base_urls(mut self, data_base: &str, www_base: &str) -> Self {
        self.data_base = data_base.trim_end_matches('/').to_string();
        self.www_base = www_base.trim_end_matches('/').to_string();
        self
    }

    /// Overrides the JSON cache TTL. Intended for tests.
    #[must_use]
    pub fn with_json_ttl(mut self, ttl: Duration) -> Self {
        self.json_ttl = ttl;
        self
    }

    /// One throttled GET. Returns status, body bytes, and content type.
    async fn fetch(&self, url: &str) -> Result<(u16, Vec<u8>, Option<String>)> {
        self.limiter.lock().await.wait().await;
        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GciError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GciError::Network(e.to_string()))?;
        Ok((status, bytes.to_vec(), content_type))
    }

    /// Read-through cached fetch for JSON endpoints.
    ///
    /// Cache hit within TTL short-circuits. On a non-success response or
    /// a transport failure the stale entry is returned when present,
    /// otherwise the failure propagates.
    async fn cached_fetch(&self, key: &str, url: &str, ttl: Duration) -> Result<String> {
        if let Some(body) = self.cache.get(key, ttl).await? {
            return Ok(body);
        }

        let outcome = self.fetch(url).await;
        let err = match outcome {
            Ok((status, bytes, _)) if (200..300).contains(&status) => {
                let body = String::from_utf8_lossy(&bytes).into_owned();
                self.cache.put(key, &body).await?;
                return Ok(body);
            }
            Ok((status, _, _)) => GciError::Upstream {
                url: url.to_string(),
                status,
            },
            Err(e) => e,
        };

        if let Some(stale) = self.cache.get_stale(key).await? {
            warn!(url, error = %err, "live fetch failed, serving stale cache entry");
            return Ok(stale);
        }
        Err(err)
    }

    /// Look up a company's CIK number and registered name from its ticker.
    ///
    /// Returns the CIK zero-padded to 10 digits.
    ///
    /// # Errors
    /// [`GciError::TickerNotFound`] when the ticker is absent from the
    /// SEC mapping file.
    pub async fn lookup_cik(&self, ticker: &Ticker) -> Result<(String, String)> {
        if ticker.as_str().is_empty() {
            return Err(GciError::InvalidParameter("Empty ticker".to_string()));
        }

        let url = format!("{}/files/company_tickers.json", self.www_base);
        let body = self
            .cached_fetch("company_tickers.json", &url, TICKERS_TTL)
            .await?;
        let entries: HashMap<String, CompanyTickerEntry> = serde_json::from_str(&body)
            .map_err(|e| GciError::Parse(format!("Failed to parse company tickers: {e}")))?;

        for entry in entries.values() {
            if entry.ticker.eq_ignore_ascii_case(ticker.as_str()) {
                let cik = pad_cik(&entry.cik_str.to_string());
                debug!(%ticker, %cik, "resolved CIK");
                return Ok((cik, entry.title.clone()));
            }
        }
        Err(GciError::TickerNotFound(ticker.to_string()))
    }

    /// Fetch company submissions (filing history) for a CIK.
    pub async fn submissions(&self, cik10: &str) -> Result<Submissions> {
        let cik10 = pad_cik(cik10);
        let key = format!("submissions-{cik10}.json");
        let url = format!("{}/submissions/CIK{cik10}.json", self.data_base);
        let body = self.cached_fetch(&key, &url, self.json_ttl).await?;
        serde_json::from_str(&body)
            .map_err(|e| GciError::Parse(format!("Failed to parse submissions: {e}")))
    }

    /// Fetch the reported series for one us-gaap concept tag.
    pub async fn company_concept(&self, cik10: &str, tag: &str) -> Result<ConceptResponse> {
        let cik10 = pad_cik(cik10);
        let key = format!("concept-{cik10}-{tag}.json");
        let url = self.concept_url(&cik10, tag);
        let body = self.cached_fetch(&key, &url, self.json_ttl).await?;
        serde_json::from_str(&body)
            .map_err(|e| GciError::Parse(format!("Failed to parse concept {tag}: {e}")))
    }

    /// The company-concept API URL for a tag, recorded next to each
    /// aligned actual for auditability.
    #[must_use]
    pub fn concept_url(&self, cik10: &str, tag: &str) -> String {
        format!(
            "{}/api/xbrl/companyconcept/CIK{}/us-gaap/{tag}.json",
            self.data_base,
            pad_cik(cik10)
        )
    }

    /// Archive directory URL for one filing.
    ///
    /// # Errors
    /// Returns an error for a non-numeric CIK.
    pub fn archive_base(&self, cik10: &str, accession: &str) -> Result<String> {
        Ok(format!(
            "{}/Archives/edgar/data/{}/{}",
            self.www_base,
            cik_numeric(cik10)?,
            accession.replace('-', "")
        ))
    }

    /// Index page URL for one filing.
    ///
    /// # Errors
    /// Returns an error for a non-numeric CIK.
    pub fn index_url(&self, cik10: &str, accession: &str) -> Result<String> {
        Ok(format!(
            "{}/{}-index.html",
            self.archive_base(cik10, accession)?,
            accession.replace('-', "")
        ))
    }

    /// Fetch a filing's index page HTML.
    ///
    /// # Errors
    /// [`GciError::Upstream`] on a non-success response; callers fall
    /// back to the filing's primary document.
    pub async fn filing_index_html(&self, cik10: &str, accession: &str) -> Result<String> {
        let url = self.index_url(cik10, accession)?;
        let (status, bytes, _) = self.fetch(&url).await?;
        if !(200..300).contains(&status) {
            return Err(GciError::Upstream { url, status });
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Cache key under which a document's reduced text is stored.
    #[must_use]
    pub fn document_cache_key(url: &str) -> String {
        format!("doc-{}", url.trim_start_matches("http://").trim_start_matches("https://"))
    }

    /// Fetch a document and reduce it to normalized plain text.
    ///
    /// PDF payloads (by content type or `%PDF` magic) go through text
    /// extraction; everything else is treated as HTML and reduced to
    /// body text. The reduced text is cached like the JSON endpoints,
    /// with the same stale-fallback path.
    pub async fn document_text(&self, url: &str) -> Result<String> {
        let key = Self::document_cache_key(url);
        if let Some(text) = self.cache.get(&key, self.json_ttl).await? {
            return Ok(text);
        }

        let outcome = self.fetch(url).await;
        let err = match outcome {
            Ok((status, bytes, content_type)) if (200..300).contains(&status) => {
                let text = document_to_text(&bytes, content_type.as_deref())?;
                self.cache.put(&key, &text).await?;
                return Ok(text);
            }
            Ok((status, _, _)) => GciError::Upstream {
                url: url.to_string(),
                status,
            },
            Err(e) => e,
        };

        if let Some(stale) = self.cache.get_stale(&key).await? {
            warn!(url, error = %err, "document fetch failed, serving stale cache entry");
            return Ok(stale);
        }
        Err(err)
    }
}

/// Reduce a fetched document body to normalized plain text.
///
/// # Errors
/// [`GciError::Parse`] when PDF text extraction fails.
pub fn document_to_text(bytes: &[u8], content_type: Option<&str>) -> Result<String> {
    let is_pdf = content_type.is_some_and(|ct| ct.contains("pdf")) || bytes.starts_with(b"%PDF");
    let raw = if is_pdf {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| GciError::Parse(format!("PDF extraction failed: {e}")))?
    } else {
        html_body_text(&String::from_utf8_lossy(bytes))
    };
    Ok(collapse_whitespace(&raw))
}

/// Body text of an HTML document, script/style-free, in document order.
fn html_body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let body = Selector::parse("body").expect("static selector");
    match doc.select(&body).next() {
        Some(el) => el.text().collect::<Vec<_>>().join(" "),
        None => doc.root_element().text().collect::<Vec<_>>().join(" "),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gci_cache::MemoryCache;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TICKERS_BODY: &str = r#"{
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "1": {"cik_str": 789019, "ticker": "MSFT", "title": "Microsoft Corp"}
    }"#;

    fn client_for(server: &MockServer, cache: Arc<dyn HttpCache>) -> EdgarClient {
        EdgarClient::new("Test/1.0 (test@example.com)", cache)
            .with_base_urls(&server.uri(), &server.uri())
    }

    #[tokio::test]
    async fn test_lookup_cik() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TICKERS_BODY))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryCache::new()));
        let (cik, name) = client.lookup_cik(&Ticker::new("aapl")).await.unwrap();
        assert_eq!(cik, "0000320193");
        assert_eq!(name, "Apple Inc.");

        let missing = client.lookup_cik(&Ticker::new("ZZZZ")).await;
        assert!(matches!(missing, Err(GciError::TickerNotFound(_))));
    }

    #[tokio::test]
    async fn test_submissions_cached_roundtrip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000320193.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"name":"Apple Inc.","filings":{"recent":{
                    "accessionNumber":["0000320193-25-000001"],
                    "form":["8-K"],
                    "filingDate":["2025-05-01"],
                    "primaryDocument":["ex.htm"]}}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryCache::new()));
        let first = client.submissions("320193").await.unwrap();
        assert_eq!(first.filings_of_form("8-K", 8).len(), 1);

        // Second call is served from cache; the mock's expect(1) verifies
        // no second request reached the server.
        let second = client.submissions("320193").await.unwrap();
        assert_eq!(second.name, "Apple Inc.");
    }

    #[tokio::test]
    async fn test_stale_fallback_on_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000000001.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let cache = Arc::new(MemoryCache::new());
        cache
            .put(
                "submissions-0000000001.json",
                r#"{"name":"Stale Co","filings":{"recent":{}}}"#,
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Zero TTL forces the live fetch; the 503 then degrades to the
        // stale entry instead of failing.
        let client = client_for(&server, cache).with_json_ttl(Duration::ZERO);
        let subs = client.submissions("1").await.unwrap();
        assert_eq!(subs.name, "Stale Co");
    }

    #[tokio::test]
    async fn test_upstream_error_without_cache_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000000002.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, Arc::new(MemoryCache::new()));
        let result = client.submissions("2").await;
        assert!(matches!(result, Err(GciError::Upstream { status: 500, .. })));
    }

    #[test]
    fn test_document_to_text_html() {
        let html = b"<html><head><title>x</title></head>\
            <body><p>Revenue  of\n$5.2   billion</p></body></html>";
        let text = document_to_text(html, Some("text/html")).unwrap();
        assert_eq!(text, "Revenue of $5.2 billion");
    }

    #[test]
    fn test_archive_urls() {
        let client = EdgarClient::new(
            "Test/1.0 (test@example.com)",
            Arc::new(gci_cache::NoopCache::new()),
        );
        let base = client
            .archive_base("0000320193", "0000320193-25-000077")
            .unwrap();
        assert_eq!(
            base,
            "https://www.sec.gov/Archives/edgar/data/320193/000032019325000077"
        );
        let index = client
            .index_url("0000320193", "0000320193-25-000077")
            .unwrap();
        assert!(index.ends_with("000032019325000077-index.html"));
    }
}
