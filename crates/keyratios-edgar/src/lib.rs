#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keyratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR provider for raw XBRL company facts.
//!
//! This crate provides:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - The companyfacts document for a CIK
//!
//! # Example
//!
//! ```no_run
//! use keyratios_core::{FactsProvider, Symbol};
//! use keyratios_edgar::EdgarProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)")?;
//!
//!     let symbol = Symbol::new("AAPL");
//!     let cik = provider.resolve_cik(&symbol).await?;
//!     let facts = provider.fetch_company_facts(&cik).await?;
//!     println!("{}: {} tags", cik, facts.tag_count());
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use keyratios_core::{CompanyFacts, DataError, DataProvider, FactsProvider, Result, Symbol, pad_cik};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR facts provider.
///
/// Requests are spaced to stay under SEC's limit of 10 per second, across
/// every clone sharing the same provider. The ticker map is downloaded once
/// and reused for later lookups.
#[derive(Debug, Clone)]
pub struct EdgarProvider {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    tickers: Arc<OnceCell<HashMap<String, String>>>,
    base_url: String,
    tickers_url: String,
}

impl EdgarProvider {
    /// Create a new EDGAR provider with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use keyratios_edgar::EdgarProvider;
    ///
    /// let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        if user_agent.trim().is_empty() {
            return Err(DataError::InvalidParameter(
                "SEC requires a non-empty user agent".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| DataError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client))
    }

    /// Create a new EDGAR provider with a custom HTTP client.
    ///
    /// The client must already carry an identifying user agent.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            tickers: Arc::new(OnceCell::new()),
            base_url: EDGAR_BASE_URL.to_string(),
            tickers_url: COMPANY_TICKERS_URL.to_string(),
        }
    }

    /// Replaces the minimum interval between requests.
    #[must_use]
    pub fn with_rate_limit(self, min_interval: Duration) -> Self {
        Self {
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            ..self
        }
    }

    /// Points the provider at other hosts, e.g. a mirror.
    #[must_use]
    pub fn with_urls(self, base_url: impl Into<String>, tickers_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tickers_url: tickers_url.into(),
            ..self
        }
    }

    /// URL of the companyfacts document for a CIK.
    #[must_use]
    pub fn company_facts_url(&self, cik: &str) -> String {
        format!(
            "{}/api/xbrl/companyfacts/CIK{}.json",
            self.base_url,
            pad_cik(cik)
        )
    }

    /// Rate-limited GET returning the JSON body.
    async fn get_json(&self, url: &str, what: &str) -> Result<serde_json::Value> {
        self.rate_limiter.lock().await.wait().await;

        debug!("Fetching {} from {}", what, url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            warn!(?retry_after, "SEC EDGAR rate limit hit");
            return Err(DataError::RateLimited {
                provider: self.name().to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(DataError::Network(format!(
                "Failed to fetch {}: HTTP {}",
                what, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse {}: {}", what, e)))
    }

    /// Ticker to padded CIK map, downloaded on first use.
    async fn ticker_map(&self) -> Result<&HashMap<String, String>> {
        self.tickers
            .get_or_try_init(|| async {
                let data = self.get_json(&self.tickers_url, "company tickers").await?;
                let map = parse_ticker_map(data)?;
                debug!("Loaded {} tickers from SEC", map.len());
                Ok(map)
            })
            .await
    }
}

/// Parses SEC's `company_tickers.json` into an uppercase ticker to padded CIK map.
///
/// When a ticker appears more than once, the first entry in key order wins.
fn parse_ticker_map(data: serde_json::Value) -> Result<HashMap<String, String>> {
    let entries: HashMap<String, CompanyTickerInfo> = serde_json::from_value(data)
        .map_err(|e| DataError::Parse(format!("Failed to parse company tickers: {}", e)))?;

    let mut ordered: Vec<(u64, CompanyTickerInfo)> = entries
        .into_iter()
        .map(|(key, info)| (key.parse().unwrap_or(u64::MAX), info))
        .collect();
    ordered.sort_by_key(|(key, _)| *key);

    let mut map = HashMap::with_capacity(ordered.len());
    for (_, info) in ordered {
        map.entry(info.ticker.trim().to_uppercase())
            .or_insert_with(|| pad_cik(&info.cik_str.to_string()));
    }
    Ok(map)
}

impl DataProvider for EdgarProvider {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR XBRL company facts from annual and quarterly filings"
    }
}

#[async_trait]
impl FactsProvider for EdgarProvider {
    async fn resolve_cik(&self, symbol: &Symbol) -> Result<String> {
        if symbol.is_empty() {
            return Err(DataError::InvalidParameter("Empty ticker".to_string()));
        }

        let cik = self
            .ticker_map()
            .await?
            .get(symbol.as_str())
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
        debug!("Found CIK {} for ticker {}", cik, symbol);
        Ok(cik)
    }

    async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFacts> {
        if cik.trim().is_empty() {
            return Err(DataError::InvalidParameter("Empty CIK".to_string()));
        }

        let url = self.company_facts_url(cik);
        let data = self
            .get_json(&url, &format!("company facts for CIK {}", pad_cik(cik)))
            .await?;
        Ok(CompanyFacts::from_value(&data))
    }
}

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

// =============================================================================
// Tests
// =============================================================================
