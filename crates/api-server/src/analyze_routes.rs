//! Single-symbol analysis endpoint.

use analysis_core::{AnalysisError, StockAnalysis};
use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::{AppError, AppState};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AnalyzeRequest {
    /// Exchange-qualified ticker, e.g. `INFY.NS`. Used as given apart from trimming.
    #[serde(default)]
    pub symbol: Option<String>,
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze_stock))
}

#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Fundamentals, score and charts", body = StockAnalysis),
        (status = 400, description = "Symbol missing or body unreadable", body = crate::ErrorBody),
        (status = 500, description = "Provider could not resolve the symbol", body = crate::ErrorBody)
    ),
    tag = "Analysis"
)]
pub async fn analyze_stock(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<StockAnalysis>, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        AnalysisError::InvalidInput(format!("Unreadable request body: {}", rejection.body_text()))
    })?;

    let analysis = state.orchestrator.analyze(req.symbol.as_deref()).await?;
    Ok(Json(analysis))
}
