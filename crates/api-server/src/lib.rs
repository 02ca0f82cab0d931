use analysis_core::{
    AnalysisError, IntradayChart, MarketDataProvider, PeriodChart, ScreenResult, StockAnalysis,
    Suggestion, TickerListSource,
};
use analysis_orchestrator::{AnalysisOrchestrator, StockScreener};
use axum::{
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yahoo_client::YahooFinanceClient;

pub mod analyze_routes;
pub mod config;
pub mod request_id;
pub mod screener_routes;


use analyze_routes::{analyze_routes, AnalyzeRequest};
use config::ServerConfig;
use request_id::request_id_middleware;
use screener_routes::screener_routes;

const HOME_MESSAGE: &str = "✅ Stock Analyzer API is running!";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub screener: Arc<StockScreener>,
    pub ticker_source: Arc<dyn TickerListSource>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        ticker_source: Arc<dyn TickerListSource>,
        screen_concurrency: usize,
    ) -> Self {
        let orchestrator = Arc::new(AnalysisOrchestrator::new(provider));
        let screener =
            Arc::new(StockScreener::new(orchestrator.clone()).with_concurrency(screen_concurrency));

        Self {
            orchestrator,
            screener,
            ticker_source,
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// Handler error; every failure the service reports is an `AnalysisError`.
#[derive(Debug)]
pub struct AppError(pub AnalysisError);

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::SourceUnreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::ProviderFailure(_) | AnalysisError::InvalidData(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::warn!(%status, kind = err.kind(), "Request failed: {}", err);
        }

        (
            status,
            Json(ErrorBody {
                error: err.message().to_string(),
                kind: err.kind().to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stock Analyzer API",
        description = "Fundamentals scoring, price charts and a batch screen for NSE/BSE equities"
    ),
    paths(analyze_routes::analyze_stock, screener_routes::screen_stocks),
    components(schemas(
        AnalyzeRequest,
        StockAnalysis,
        Suggestion,
        PeriodChart,
        IntradayChart,
        ScreenResult,
        ErrorBody
    )),
    tags(
        (name = "Analysis", description = "Single-symbol analysis"),
        (name = "Screener", description = "Batch fundamentals screen")
    )
)]
pub struct ApiDoc;

/// `RUST_LOG_FORMAT=json` switches to structured output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn home() -> &'static str {
    HOME_MESSAGE
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .merge(analyze_routes())
        .merge(screener_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;

    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(YahooFinanceClient::new(config.yahoo.clone()));
    let state = AppState::new(provider, config.ticker_source(), config.screen_concurrency);

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Stock Analyzer API listening on {}", addr);
    tracing::info!("📖 Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
