use analysis_core::{
    normalize_intraday, normalize_period, AnalysisError, HistoryWindow, MarketDataProvider,
    StockAnalysis,
};
use fundamental_analysis::FundamentalAnalysisEngine;
use std::sync::Arc;

pub mod screener;
pub use screener::{canonicalize_symbol, StockScreener, DEFAULT_MARKET_SUFFIX};

#[cfg(test)]
mod testing;

pub struct AnalysisOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    fundamental_analyzer: FundamentalAnalysisEngine,
}

impl AnalysisOrchestrator {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            fundamental_analyzer: FundamentalAnalysisEngine::new(),
        }
    }

    /// Replace the default screening thresholds.
    pub fn with_engine(mut self, engine: FundamentalAnalysisEngine) -> Self {
        self.fundamental_analyzer = engine;
        self
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    pub fn fundamental_engine(&self) -> &FundamentalAnalysisEngine {
        &self.fundamental_analyzer
    }

    /// Score one symbol and attach its 6-month and intraday charts.
    ///
    /// A missing or blank symbol fails before the provider is touched. Every
    /// provider fault comes back as `ProviderFailure`; nothing is retried here.
    pub async fn analyze(&self, symbol: Option<&str>) -> Result<StockAnalysis, AnalysisError> {
        let symbol = symbol
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AnalysisError::InvalidInput("Symbol not provided".to_string()))?;

        tracing::debug!("Analyzing {}", symbol);

        let (snapshot, period_bars, intraday_bars) = tokio::try_join!(
            self.provider.fundamentals(symbol),
            self.provider.history(symbol, HistoryWindow::SixMonthsDaily),
            self.provider.history(symbol, HistoryWindow::IntradayFiveMinute),
        )
        .map_err(|e| {
            tracing::warn!("Provider failed for {}: {}", symbol, e);
            e.into_provider_failure()
        })?;

        let score = self.fundamental_analyzer.score(&snapshot);

        Ok(StockAnalysis {
            name: snapshot.name,
            sector: snapshot.sector,
            price: snapshot.price,
            pe: snapshot.pe_ratio,
            pb: snapshot.price_to_book,
            roe: snapshot.return_on_equity,
            debt_to_equity: snapshot.debt_to_equity,
            entry: score.entry,
            target: score.target,
            suggestion: score.suggestion,
            chart_6mo: normalize_period(&period_bars),
            chart_daily: normalize_intraday(&intraday_bars),
        })
    }
}
