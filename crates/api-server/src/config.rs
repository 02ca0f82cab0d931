use analysis_core::{AnalysisError, TickerListSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use ticker_source::{SheetCsvSource, StaticTickerSource};
use yahoo_client::YahooConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    // Batch screen ticker list
    pub ticker_sheet_url: Option<String>,
    pub ticker_sheet_column: String,
    pub screen_tickers: Option<String>,
    pub screen_concurrency: usize,

    pub yahoo: YahooConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let defaults = YahooConfig::default();

        let config = Self {
            host: parse_or("HOST", "0.0.0.0"),
            port: parse_or("PORT", "10000")
                .parse()
                .context("PORT must be a port number")?,

            ticker_sheet_url: get("TICKER_SHEET_CSV_URL"),
            ticker_sheet_column: parse_or("TICKER_SHEET_COLUMN", "Symbol"),
            screen_tickers: get("SCREEN_TICKERS"),
            screen_concurrency: parse_or("SCREEN_CONCURRENCY", "4")
                .parse::<usize>()
                .context("SCREEN_CONCURRENCY must be a positive integer")?
                .max(1),

            yahoo: YahooConfig {
                rate_limit_per_minute: match get("YAHOO_RATE_LIMIT") {
                    Some(v) => v.parse().context("YAHOO_RATE_LIMIT must be an integer")?,
                    None => defaults.rate_limit_per_minute,
                },
                timeout: match get("YAHOO_TIMEOUT_SECS") {
                    Some(v) => Duration::from_secs(v.parse().context("YAHOO_TIMEOUT_SECS must be an integer")?),
                    None => defaults.timeout,
                },
                cache_ttl: match get("YAHOO_CACHE_TTL_SECS") {
                    Some(v) => Duration::from_secs(v.parse().context("YAHOO_CACHE_TTL_SECS must be an integer")?),
                    None => defaults.cache_ttl,
                },
            },
        };

        Ok(config)
    }

    /// The sheet wins over the static list when both are set.
    pub fn ticker_source(&self) -> Arc<dyn TickerListSource> {
        if let Some(url) = &self.ticker_sheet_url {
            tracing::info!("Screening tickers from published sheet (column '{}')", self.ticker_sheet_column);
            Arc::new(SheetCsvSource::new(url.clone(), self.ticker_sheet_column.clone()))
        } else if let Some(list) = &self.screen_tickers {
            tracing::info!("Screening tickers from SCREEN_TICKERS");
            Arc::new(StaticTickerSource::from_csv_list(list))
        } else {
            tracing::warn!("No ticker source configured; /screen will report the source as unreachable");
            Arc::new(UnconfiguredSource)
        }
    }
}

struct UnconfiguredSource;

#[async_trait]
impl TickerListSource for UnconfiguredSource {
    async fn tickers(&self) -> Result<Vec<String>, AnalysisError> {
        Err(AnalysisError::SourceUnreachable(
            "No ticker source configured; set TICKER_SHEET_CSV_URL or SCREEN_TICKERS".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 10000);
        assert_eq!(config.ticker_sheet_column, "Symbol");
        assert_eq!(config.screen_concurrency, 4);
        assert!(config.ticker_sheet_url.is_none());
        assert_eq!(config.yahoo.rate_limit_per_minute, 120);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SCREEN_CONCURRENCY", "0"),
            ("SCREEN_TICKERS", "INFY,TCS"),
            ("YAHOO_CACHE_TTL_SECS", "0"),
            ("TICKER_SHEET_CSV_URL", "  "),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.screen_concurrency, 1);
        assert_eq!(config.screen_tickers.as_deref(), Some("INFY,TCS"));
        assert!(config.yahoo.cache_ttl.is_zero());
        assert!(config.ticker_sheet_url.is_none());
    }

    #[test]
    fn test_bad_port_is_an_error() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_source_is_unreachable() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        let err = config.ticker_source().tickers().await.unwrap_err();
        assert!(matches!(err, AnalysisError::SourceUnreachable(_)));
    }

    #[tokio::test]
    async fn test_static_list_source() {
        let config = ServerConfig::from_lookup(lookup(&[("SCREEN_TICKERS", "infy, tcs")])).unwrap();
        let tickers = config.ticker_source().tickers().await.unwrap();
        assert_eq!(tickers, vec!["infy", " tcs"]);
    }
}
