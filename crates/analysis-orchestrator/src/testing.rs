use analysis_core::{AnalysisError, Bar, FundamentalsSnapshot, HistoryWindow, MarketDataProvider};
use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn good_snapshot(symbol: &str, price: f64) -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        symbol: symbol.to_string(),
        name: Some(format!("{} Ltd", symbol)),
        sector: Some("Technology".to_string()),
        price,
        pe_ratio: 10.0,
        price_to_book: 1.0,
        return_on_equity: Some(0.20),
        debt_to_equity: 0.2,
    }
}

pub fn weak_snapshot(symbol: &str, price: f64) -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        symbol: symbol.to_string(),
        name: Some(format!("{} Ltd", symbol)),
        sector: Some("Industrials".to_string()),
        price,
        pe_ratio: 40.0,
        price_to_book: 8.0,
        return_on_equity: None,
        debt_to_equity: 1.5,
    }
}

/// Canned provider with call accounting.
#[derive(Default)]
pub struct FakeProvider {
    snapshots: HashMap<String, FundamentalsSnapshot>,
    bars: HashMap<String, Vec<Bar>>,
    failing: HashSet<String>,
    malformed_history: HashSet<String>,
    delays: HashMap<String, Duration>,
    fundamentals_calls: AtomicUsize,
    history_calls: AtomicUsize,
    fundamentals_log: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: FundamentalsSnapshot) -> Self {
        self.snapshots.insert(snapshot.symbol.clone(), snapshot);
        self
    }

    pub fn with_bars(mut self, symbol: &str, count: usize) -> Self {
        let ist = FixedOffset::east_opt(19800).unwrap();
        let start = ist.with_ymd_and_hms(2024, 3, 8, 9, 15, 0).unwrap();
        let bars = (0..count)
            .map(|i| Bar {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                close: Some(100.0 + i as f64),
                volume: Some(1000.0),
            })
            .collect();
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn with_malformed_history(mut self, symbol: &str) -> Self {
        self.malformed_history.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    pub fn fundamentals_calls(&self) -> usize {
        self.fundamentals_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.fundamentals_calls() + self.history_calls()
    }

    /// Symbols passed to `fundamentals`, in call order.
    pub fn fundamentals_log(&self) -> Vec<String> {
        self.fundamentals_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for FakeProvider {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, AnalysisError> {
        self.fundamentals_calls.fetch_add(1, Ordering::SeqCst);
        self.fundamentals_log.lock().unwrap().push(symbol.to_string());

        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(symbol) {
            return Err(AnalysisError::ProviderFailure(format!("{}: Quote not found", symbol)));
        }
        self.snapshots
            .get(symbol)
            .cloned()
            .ok_or_else(|| AnalysisError::ProviderFailure(format!("No data found for {}", symbol)))
    }

    async fn history(&self, symbol: &str, _window: HistoryWindow) -> Result<Vec<Bar>, AnalysisError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(symbol) {
            return Err(AnalysisError::ProviderFailure(format!("{}: No data found", symbol)));
        }
        if self.malformed_history.contains(symbol) {
            return Err(AnalysisError::InvalidData("Non-integer timestamp at 0".to_string()));
        }
        Ok(self.bars.get(symbol).cloned().unwrap_or_default())
    }
}
