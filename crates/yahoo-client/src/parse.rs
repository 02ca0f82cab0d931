//! Yahoo payload parsing, kept free of I/O so it can be tested against fixtures.

use analysis_core::{AnalysisError, Bar, FundamentalsSnapshot};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; older payloads use bare numbers.
fn raw_f64(module: Option<&Value>, key: &str) -> Option<f64> {
    let value = module?.get(key)?;
    value
        .get("raw")
        .unwrap_or(value)
        .as_f64()
        .filter(|v| v.is_finite())
}

fn string_field(module: Option<&Value>, key: &str) -> Option<String> {
    module?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract the first `result` of an envelope such as `quoteSummary` or `chart`,
/// turning Yahoo's `error` object into a provider failure.
fn first_result<'a>(body: &'a Value, envelope: &str, symbol: &str) -> Result<&'a Value, AnalysisError> {
    let Some(root) = body.get(envelope).or_else(|| body.get("finance")) else {
        return Err(AnalysisError::InvalidData(format!(
            "Missing '{}' envelope for {}",
            envelope, symbol
        )));
    };

    if let Some(error) = root.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(Value::as_str)
            .or_else(|| error.get("code").and_then(Value::as_str))
            .unwrap_or("unknown error");
        return Err(AnalysisError::ProviderFailure(format!("{}: {}", symbol, description)));
    }

    root.get("result")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::ProviderFailure(format!("No data found for {}", symbol)))
}

/// Build a fundamentals snapshot from a `quoteSummary` response.
///
/// Numeric fields Yahoo omits default to `0.0`; return on equity stays `None`.
pub fn parse_quote_summary(symbol: &str, body: &Value) -> Result<FundamentalsSnapshot, AnalysisError> {
    let result = first_result(body, "quoteSummary", symbol)?;

    let price = result.get("price");
    let summary = result.get("summaryDetail");
    let financial = result.get("financialData");
    let stats = result.get("defaultKeyStatistics");
    let profile = result.get("assetProfile");

    let current_price = raw_f64(financial, "currentPrice")
        .or_else(|| raw_f64(price, "regularMarketPrice"))
        .unwrap_or(0.0);

    Ok(FundamentalsSnapshot {
        symbol: symbol.to_string(),
        name: string_field(price, "longName").or_else(|| string_field(price, "shortName")),
        sector: string_field(profile, "sector"),
        price: current_price,
        pe_ratio: raw_f64(summary, "trailingPE")
            .or_else(|| raw_f64(stats, "trailingPE"))
            .unwrap_or(0.0),
        price_to_book: raw_f64(stats, "priceToBook").unwrap_or(0.0),
        return_on_equity: raw_f64(financial, "returnOnEquity"),
        debt_to_equity: raw_f64(financial, "debtToEquity").unwrap_or(0.0),
    })
}

/// Turn a v8 `chart` response into bars in the exchange's local offset.
///
/// Null closes and volumes stay `None`; the bar itself is kept so series
/// length matches the provider's timestamps.
pub fn parse_chart(body: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let symbol = body
        .pointer("/chart/result/0/meta/symbol")
        .and_then(Value::as_str)
        .unwrap_or("symbol");
    let result = first_result(body, "chart", symbol)?;

    let gmt_offset = result
        .pointer("/meta/gmtoffset")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let offset = i32::try_from(gmt_offset)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| AnalysisError::InvalidData(format!("Invalid gmtoffset {}", gmt_offset)))?;

    // No trades in the window: Yahoo omits the timestamp array entirely.
    let Some(timestamps) = result.get("timestamp").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let quote = result.pointer("/indicators/quote/0");
    let closes = quote.and_then(|q| q.get("close")).and_then(Value::as_array);
    let volumes = quote.and_then(|q| q.get("volume")).and_then(Value::as_array);

    timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| -> Result<Bar, AnalysisError> {
            let secs = ts
                .as_i64()
                .ok_or_else(|| AnalysisError::InvalidData(format!("Non-integer timestamp at {}", i)))?;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| AnalysisError::InvalidData(format!("Invalid timestamp {}", secs)))?
                .with_timezone(&offset);

            Ok(Bar {
                timestamp,
                close: closes.and_then(|c| c.get(i)).and_then(Value::as_f64),
                volume: volumes.and_then(|v| v.get(i)).and_then(Value::as_f64),
            })
        })
        .collect()
}
