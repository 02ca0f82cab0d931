use analysis_core::ScreenResult;
use axum::{extract::State, routing::get, Json, Router};

use crate::{AppError, AppState};

pub fn screener_routes() -> Router<AppState> {
    Router::new().route("/screen", get(screen_stocks))
}

#[utoipa::path(
    get,
    path = "/screen",
    responses(
        (status = 200, description = "Symbols passing the fundamentals screen, in sheet order", body = [ScreenResult]),
        (status = 503, description = "Ticker list could not be fetched", body = crate::ErrorBody)
    ),
    tag = "Screener"
)]
pub async fn screen_stocks(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScreenResult>>, AppError> {
    let results = state
        .screener
        .screen_source(state.ticker_source.as_ref())
        .await?;
    Ok(Json(results))
}
