use analysis_core::{FundamentalsSnapshot, ScoreCard, Suggestion};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ratio ceilings (and the ROE floor) a snapshot must clear to be a buy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenThresholds {
    pub max_pe_ratio: f64,
    pub max_price_to_book: f64,
    pub max_debt_to_equity: f64,
    pub min_return_on_equity: f64,
}

impl Default for ScreenThresholds {
    fn default() -> Self {
        Self {
            max_pe_ratio: 25.0,
            max_price_to_book: 5.0,
            max_debt_to_equity: 1.0,
            min_return_on_equity: 0.15,
        }
    }
}

/// Entry sits 3% under the current price, target 15% above.
const ENTRY_DISCOUNT: f64 = 0.97;
const TARGET_PREMIUM: f64 = 1.15;

#[derive(Debug, Clone, Default)]
pub struct FundamentalAnalysisEngine {
    thresholds: ScreenThresholds,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ScreenThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScreenThresholds {
        &self.thresholds
    }

    /// Boolean fundamentals screen shared by the analyzer and the batch scan.
    ///
    /// A missing or zero ROE fails without a numeric comparison.
    pub fn passes_screen(&self, snapshot: &FundamentalsSnapshot) -> bool {
        let t = &self.thresholds;
        let roe_ok = snapshot
            .return_on_equity
            .is_some_and(|roe| roe != 0.0 && roe > t.min_return_on_equity);

        snapshot.pe_ratio < t.max_pe_ratio
            && snapshot.price_to_book < t.max_price_to_book
            && snapshot.debt_to_equity < t.max_debt_to_equity
            && roe_ok
    }

    /// Entry/target prices plus the suggestion label. Total over any snapshot.
    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> ScoreCard {
        ScoreCard {
            entry: entry_price(snapshot.price),
            target: target_price(snapshot.price),
            suggestion: Suggestion::from_screen(self.passes_screen(snapshot)),
        }
    }
}

pub fn entry_price(price: f64) -> f64 {
    round_price(price * ENTRY_DISCOUNT)
}

pub fn target_price(price: f64) -> f64 {
    round_price(price * TARGET_PREMIUM)
}

/// Round the exact binary value to two places, ties to even.
///
/// Values outside `Decimal`'s range are returned unchanged.
fn round_price(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .and_then(|d| d.round_dp(2).to_f64())
        .unwrap_or(value)
}
