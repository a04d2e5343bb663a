use analytics::{AnalyticsEngine, MetricsParameters};
use api_client::{QuoteSource, YahooClient};
use axum::{routing::get, Router};
use configuration::{MetricsSettings, Settings};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub source: Arc<dyn QuoteSource>,
    pub engine: AnalyticsEngine,
    /// Benchmark used when a request does not name one.
    pub default_benchmark: String,
}

/// An engine applying the configured metric conventions.
pub fn engine_from_settings(metrics: &MetricsSettings) -> AnalyticsEngine {
    AnalyticsEngine::new(MetricsParameters {
        periods_per_year: metrics.periods_per_year,
        risk_free_rate: metrics.risk_free_rate,
        target_return: metrics.target_return,
    })
}

impl AppState {
    pub fn from_settings(source: Arc<dyn QuoteSource>, settings: &Settings) -> Self {
        Self {
            source,
            engine: engine_from_settings(&settings.metrics),
            default_benchmark: settings.metrics.default_benchmark.clone(),
        }
    }
}

/// Builds the application routes on top of `state`.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/fund/:ticker", get(handlers::get_fund))
        .route("/api/fund/:ticker/metrics", get(handlers::get_metrics))
        .route("/api/fund/:ticker/rolling-alpha", get(handlers::get_rolling_alpha))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
/// Tracing is expected to be initialized by the caller.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let source = Arc::new(YahooClient::new(&settings.provider)?);
    let app_state = Arc::new(AppState::from_settings(source, &settings));
    let app = router(app_state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
