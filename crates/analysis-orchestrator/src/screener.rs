use super::AnalysisOrchestrator;
use analysis_core::{AnalysisError, ScreenResult, TickerListSource};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Suffix appended to bare symbols (National Stock Exchange of India).
pub const DEFAULT_MARKET_SUFFIX: &str = ".NS";

/// Exchange suffixes that are left as-is.
const KNOWN_SUFFIXES: &[&str] = &[".NS", ".BO"];

/// Normalize a raw sheet entry into the provider's exchange-qualified form.
///
/// Returns `None` for entries that are blank after trimming.
pub fn canonicalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return None;
    }

    let mut symbol = symbol.to_uppercase();
    if !KNOWN_SUFFIXES.iter().any(|suffix| symbol.ends_with(suffix)) {
        symbol.push_str(DEFAULT_MARKET_SUFFIX);
    }
    Some(symbol)
}

/// Outcome for one canonical symbol: passed, filtered out, or failed.
pub type SymbolOutcome = (String, Result<Option<ScreenResult>, AnalysisError>);

pub struct StockScreener {
    orchestrator: Arc<AnalysisOrchestrator>,
    concurrency: usize,
}

impl StockScreener {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>) -> Self {
        Self {
            orchestrator,
            concurrency: 1,
        }
    }

    /// Number of symbols fetched at once. Output order never depends on it.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Pull the ticker list from `source` and screen it.
    ///
    /// Only a source failure fails the scan; it is reported as `SourceUnreachable`.
    pub async fn screen_source(
        &self,
        source: &dyn TickerListSource,
    ) -> Result<Vec<ScreenResult>, AnalysisError> {
        let tickers = source.tickers().await.map_err(|e| {
            tracing::error!("Ticker source failed: {}", e);
            match e {
                AnalysisError::SourceUnreachable(msg) => AnalysisError::SourceUnreachable(msg),
                other => AnalysisError::SourceUnreachable(other.to_string()),
            }
        })?;

        Ok(self.screen(&tickers).await)
    }

    /// Screen raw tickers, keeping only passing symbols in input order.
    pub async fn screen(&self, tickers: &[String]) -> Vec<ScreenResult> {
        let outcomes = self.evaluate_all(tickers).await;
        let scanned = outcomes.len();
        let mut failed = 0usize;

        let results: Vec<ScreenResult> = outcomes
            .into_iter()
            .filter_map(|(symbol, outcome)| match outcome {
                Ok(passed) => passed,
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Skipping {}: {}", symbol, e);
                    None
                }
            })
            .collect();

        tracing::info!(
            "Screen finished: {} scanned, {} passed, {} failed",
            scanned,
            results.len(),
            failed
        );
        results
    }

    /// Evaluate every canonical symbol, one outcome per symbol in input order.
    ///
    /// Blank entries produce no outcome. Fetches may overlap up to the
    /// configured concurrency, but `buffered` yields results in submission order.
    pub async fn evaluate_all(&self, tickers: &[String]) -> Vec<SymbolOutcome> {
        let symbols: Vec<String> = tickers.iter().filter_map(|t| canonicalize_symbol(t)).collect();

        tracing::info!(
            "Starting fundamentals screen of {} symbols ({} raw entries)",
            symbols.len(),
            tickers.len()
        );

        stream::iter(symbols)
            .map(|symbol| async move {
                let outcome = self.evaluate(&symbol).await;
                (symbol, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Snapshot-only check; no history is fetched for screened symbols.
    async fn evaluate(&self, symbol: &str) -> Result<Option<ScreenResult>, AnalysisError> {
        let snapshot = self
            .orchestrator
            .provider()
            .fundamentals(symbol)
            .await
            .map_err(AnalysisError::into_provider_failure)?;

        if self.orchestrator.fundamental_engine().passes_screen(&snapshot) {
            Ok(Some(ScreenResult {
                symbol: symbol.to_string(),
                name: snapshot.name,
            }))
        } else {
            Ok(None)
        }
    }
}
