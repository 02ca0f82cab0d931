use analysis_core::{AnalysisError, Bar, FundamentalsSnapshot, HistoryWindow, MarketDataProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, StatusCode, Url};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

mod parse;

pub use parse::{parse_chart, parse_quote_summary};

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics,assetProfile";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Backoff before retrying a 429 response.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: u32 = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let Some(&oldest) = ts.front() else { continue };
            let sleep_dur = (oldest + self.window).saturating_duration_since(now)
                + Duration::from_millis(50);
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Yahoo slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Tunables for the Yahoo client, read from the environment by the server.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Requests allowed per rolling minute.
    pub rate_limit_per_minute: usize,
    pub timeout: Duration,
    /// How long a fundamentals snapshot is served from memory. Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 120,
            timeout: Duration::from_secs(20),
            cache_ttl: Duration::from_secs(60),
        }
    }
}

struct CacheEntry<T> {
    data: T,
    cached_at: Instant,
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    rate_limiter: RateLimiter,
    crumb: Arc<RwLock<Option<String>>>,
    snapshot_cache: Arc<DashMap<String, CacheEntry<FundamentalsSnapshot>>>,
    cache_ttl: Duration,
}

impl YahooFinanceClient {
    pub fn new(config: YahooConfig) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60)),
            crumb: Arc::new(RwLock::new(None)),
            snapshot_cache: Arc::new(DashMap::new()),
            cache_ttl: config.cache_ttl,
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder
            .build()
            .map_err(|e| AnalysisError::ProviderFailure(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ProviderFailure("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ProviderFailure(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                RATE_LIMIT_BACKOFF.as_secs(),
                attempt + 1,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
        }

        Err(AnalysisError::ProviderFailure(format!(
            "Rate limited by Yahoo after {} retries",
            MAX_ATTEMPTS
        )))
    }

    /// Crumb token required by the quoteSummary endpoint. Fetched once and reused
    /// until Yahoo rejects it.
    async fn crumb(&self) -> Result<String, AnalysisError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut slot = self.crumb.write().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the session cookie matters here; fc.yahoo.com itself answers 404.
        self.send_request(self.client.get(COOKIE_URL)).await?;
        let response = self.send_request(self.client.get(CRUMB_URL)).await?;
        if !response.status().is_success() {
            return Err(AnalysisError::ProviderFailure(format!(
                "Crumb HTTP {}",
                response.status()
            )));
        }
        let crumb = response
            .text()
            .await
            .map_err(|e| AnalysisError::ProviderFailure(e.to_string()))?
            .trim()
            .to_string();
        if crumb.is_empty() {
            return Err(AnalysisError::InvalidData("Empty crumb from Yahoo".to_string()));
        }

        tracing::debug!("Obtained Yahoo crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.write().await = None;
    }

    fn cached_snapshot(&self, symbol: &str) -> Option<FundamentalsSnapshot> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let entry = self.snapshot_cache.get(symbol)?;
        if entry.cached_at.elapsed() < self.cache_ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Fetch and normalize the fundamentals snapshot for a symbol.
    pub async fn get_fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError> {
        if let Some(snapshot) = self.cached_snapshot(symbol) {
            return Ok(snapshot);
        }

        let url = symbol_url(QUOTE_SUMMARY_URL, symbol)?;
        let mut attempt = 0;
        let body = loop {
            let crumb = self.crumb().await?;
            let response = self
                .send_request(
                    self.client
                        .get(url.clone())
                        .query(&[("modules", SUMMARY_MODULES), ("crumb", crumb.as_str())]),
                )
                .await?;

            if response.status() == StatusCode::UNAUTHORIZED && attempt == 0 {
                tracing::debug!("Yahoo rejected crumb for {}, refreshing", symbol);
                self.invalidate_crumb().await;
                attempt += 1;
                continue;
            }

            break read_json(response).await?;
        };

        let snapshot = parse_quote_summary(symbol, &body)?;
        self.store_snapshot(symbol, &snapshot);
        Ok(snapshot)
    }

    /// Cache a fresh snapshot and evict every expired one.
    fn store_snapshot(&self, symbol: &str, snapshot: &FundamentalsSnapshot) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let ttl = self.cache_ttl;
        self.snapshot_cache.retain(|_, entry| entry.cached_at.elapsed() < ttl);
        self.snapshot_cache.insert(
            symbol.to_string(),
            CacheEntry {
                data: snapshot.clone(),
                cached_at: Instant::now(),
            },
        );
    }

    /// Fetch a price-history window from the chart endpoint.
    pub async fn get_history(&self, symbol: &str, window: HistoryWindow) -> Result<Vec<Bar>, AnalysisError> {
        let url = symbol_url(CHART_URL, symbol)?;

        let response = self
            .send_request(self.client.get(url).query(&[
                ("range", window.range()),
                ("interval", window.interval()),
                ("includePrePost", "false"),
            ]))
            .await?;

        let body = read_json(response).await?;
        parse_chart(&body)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new(YahooConfig::default())
    }
}

/// Append `symbol` to `base` as one percent-encoded path segment, so
/// `/`, `?` and `#` in caller input cannot change the endpoint or query.
fn symbol_url(base: &str, symbol: &str) -> Result<Url, AnalysisError> {
    let mut url = Url::parse(base).map_err(|e| AnalysisError::ProviderFailure(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| AnalysisError::ProviderFailure(format!("{} cannot take a path", base)))?
        .push(symbol);
    Ok(url)
}

/// Yahoo returns a JSON error envelope even on 404, so the body is parsed
/// regardless of status and only a non-JSON failure reports the status code.
async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, AnalysisError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AnalysisError::ProviderFailure(e.to_string()))?;

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(AnalysisError::ProviderFailure(format!(
            "HTTP {}: {}",
            status,
            text.chars().take(200).collect::<String>()
        ))),
        Err(e) => Err(AnalysisError::InvalidData(e.to_string())),
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError> {
        self.get_fundamentals(symbol).await
    }

    async fn history(&self, symbol: &str, window: HistoryWindow) -> Result<Vec<Bar>, AnalysisError> {
        self.get_history(symbol, window).await
    }
}
