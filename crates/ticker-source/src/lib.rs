//! Ticker-list collaborators for the batch screener.
//!
//! Entries come back raw and in source order; canonicalization is the
//! screener's job.

use analysis_core::{AnalysisError, TickerListSource};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Reads one column of a spreadsheet published as CSV
/// (e.g. a Google Sheet `.../export?format=csv` link).
#[derive(Clone)]
pub struct SheetCsvSource {
    client: Client,
    url: String,
    column: String,
}

impl SheetCsvSource {
    pub fn new(url: impl Into<String>, column: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
            column: column.into(),
        }
    }
}

#[async_trait]
impl TickerListSource for SheetCsvSource {
    async fn tickers(&self) -> Result<Vec<String>, AnalysisError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AnalysisError::SourceUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::SourceUnreachable(format!(
                "Sheet HTTP {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::SourceUnreachable(e.to_string()))?;

        let tickers = parse_ticker_column(&text, &self.column)?;
        tracing::info!("Loaded {} ticker entries from sheet", tickers.len());
        Ok(tickers)
    }
}

/// Extract a ticker column from CSV text.
///
/// If the first row names `column` (case-insensitive), that column is used and
/// the header row dropped. Otherwise the first column is used and every row is
/// data. Blank cells are kept so positions match the sheet.
pub fn parse_ticker_column(text: &str, column: &str) -> Result<Vec<String>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::SourceUnreachable(format!("Malformed sheet CSV: {}", e)))?;
        rows.push(record);
    }

    let header_index = rows.first().and_then(|header| {
        header
            .iter()
            .position(|cell| cell.trim().eq_ignore_ascii_case(column.trim()))
    });

    let (index, skip) = match header_index {
        Some(index) => (index, 1),
        None => (0, 0),
    };

    Ok(rows
        .iter()
        .skip(skip)
        .map(|row| row.get(index).unwrap_or_default().to_string())
        .collect())
}

/// Fixed ticker list, e.g. from `SCREEN_TICKERS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTickerSource {
    tickers: Vec<String>,
}

impl StaticTickerSource {
    pub fn new(tickers: Vec<String>) -> Self {
        Self { tickers }
    }

    /// Split a comma-separated list. Blank entries are left for the screener to skip.
    pub fn from_csv_list(list: &str) -> Self {
        Self::new(list.split(',').map(String::from).collect())
    }
}

#[async_trait]
impl TickerListSource for StaticTickerSource {
    async fn tickers(&self) -> Result<Vec<String>, AnalysisError> {
        Ok(self.tickers.clone())
    }
}
