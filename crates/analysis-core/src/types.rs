use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One sample of a price-history series.
///
/// Timestamps carry the exchange's UTC offset so intraday bars render in
/// market-local time. `close` and `volume` are `None` where the provider
/// reported a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Normalized fundamentals used for scoring and display.
///
/// Numeric ratios default to `0.0` when the provider omits them. Return on
/// equity stays optional: an absent value must fail the screen rather than be
/// compared numerically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FundamentalsSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub price: f64,
    pub pe_ratio: f64,
    pub price_to_book: f64,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: f64,
}

/// Price-history windows requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryWindow {
    /// Trailing six months of daily bars.
    SixMonthsDaily,
    /// The current trading day in 5-minute bars.
    IntradayFiveMinute,
}

impl HistoryWindow {
    pub fn range(&self) -> &'static str {
        match self {
            HistoryWindow::SixMonthsDaily => "6mo",
            HistoryWindow::IntradayFiveMinute => "1d",
        }
    }

    pub fn interval(&self) -> &'static str {
        match self {
            HistoryWindow::SixMonthsDaily => "1d",
            HistoryWindow::IntradayFiveMinute => "5m",
        }
    }
}

/// Buy/avoid label produced by the fundamentals screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Suggestion {
    #[serde(rename = "Good Entry Opportunity")]
    GoodEntry,
    #[serde(rename = "Avoid or Wait")]
    AvoidOrWait,
}

impl Suggestion {
    pub fn from_screen(passed: bool) -> Self {
        if passed {
            Suggestion::GoodEntry
        } else {
            Suggestion::AvoidOrWait
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Suggestion::GoodEntry => "Good Entry Opportunity",
            Suggestion::AvoidOrWait => "Avoid or Wait",
        }
    }
}

/// Output of the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreCard {
    pub entry: f64,
    pub target: f64,
    pub suggestion: Suggestion,
}

/// Daily closes over the trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PeriodChart {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

/// Intraday closes and volume for a single trading day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IntradayChart {
    pub timestamps: Vec<String>,
    pub prices: Vec<f64>,
    pub volume: Vec<i64>,
}

/// Full single-symbol response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StockAnalysis {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub price: f64,
    pub pe: f64,
    pub pb: f64,
    pub roe: Option<f64>,
    #[serde(rename = "debtToEquity")]
    pub debt_to_equity: f64,
    pub entry: f64,
    pub target: f64,
    pub suggestion: Suggestion,
    pub chart_6mo: PeriodChart,
    pub chart_daily: IntradayChart,
}

/// A symbol that passed the batch screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScreenResult {
    pub symbol: String,
    pub name: Option<String>,
}
