use async_trait::async_trait;
use crate::{AnalysisError, Bar, FundamentalsSnapshot, HistoryWindow};

/// Market-data capability: given a ticker, return its fundamentals and price
/// history, or fail. Retries and timeouts are the implementor's business.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError>;

    async fn history(&self, symbol: &str, window: HistoryWindow) -> Result<Vec<Bar>, AnalysisError>;
}

/// Source of raw ticker strings for a batch screen (e.g. a spreadsheet column).
#[async_trait]
pub trait TickerListSource: Send + Sync {
    /// Returns the raw entries in source order. Entries are not canonicalized.
    /// A failure here should be reported as `AnalysisError::SourceUnreachable`.
    async fn tickers(&self) -> Result<Vec<String>, AnalysisError>;
}
