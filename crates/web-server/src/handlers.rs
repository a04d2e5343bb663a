use crate::{error::AppError, AppState};
use analytics::{PerformanceReport, RollingAlphaResult};
use api_client::validate_ticker;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use core_types::{MonthlyObservation, PricePoint};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct BenchmarkQuery {
    /// Benchmark ticker. Falls back to the configured default when absent;
    /// an empty value disables the comparison where that is optional.
    pub benchmark: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FundSeriesResponse {
    pub ticker: String,
    pub series: Vec<MonthlyObservation>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub ticker: String,
    pub benchmark: Option<String>,
    pub metrics: PerformanceReport,
}

#[derive(Debug, Serialize)]
pub struct RollingAlphaResponse {
    pub ticker: String,
    pub benchmark: String,
    pub rolling: Vec<RollingAlphaResult>,
}

fn prices(series: &[MonthlyObservation]) -> Vec<PricePoint> {
    series.iter().map(MonthlyObservation::price_point).collect()
}

impl AppState {
    /// The benchmark a request asks for, `None` when it opted out with `benchmark=`.
    fn benchmark_for(&self, query: &BenchmarkQuery) -> Result<Option<String>, AppError> {
        match query.benchmark.as_deref() {
            None => Ok(Some(validate_ticker(&self.default_benchmark)?)),
            Some(b) if b.trim().is_empty() => Ok(None),
            Some(b) => Ok(Some(validate_ticker(b)?)),
        }
    }
}

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// # GET /api/fund/:ticker
/// The monthly price, return and index history of one fund.
pub async fn get_fund(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<Json<FundSeriesResponse>, AppError> {
    let ticker = validate_ticker(&ticker)?;
    let series = state.source.fetch_monthly(&ticker).await?;
    Ok(Json(FundSeriesResponse { ticker, series }))
}

/// # GET /api/fund/:ticker/metrics?benchmark=SPY
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<BenchmarkQuery>,
) -> Result<Json<MetricsResponse>, AppError> {
    let ticker = validate_ticker(&ticker)?;
    let benchmark = state.benchmark_for(&query)?;

    let metrics = match &benchmark {
        Some(benchmark) => {
            let (fund, bench) = tokio::try_join!(
                state.source.fetch_monthly(&ticker),
                state.source.fetch_monthly(benchmark)
            )?;
            state.engine.calculate(&prices(&fund), Some(&prices(&bench)))?
        }
        None => {
            let fund = state.source.fetch_monthly(&ticker).await?;
            state.engine.calculate(&prices(&fund), None)?
        }
    };

    tracing::info!(
        ticker = %ticker,
        benchmark = ?benchmark,
        periods = metrics.periods,
        "Computed metrics."
    );
    Ok(Json(MetricsResponse { ticker, benchmark, metrics }))
}

/// # GET /api/fund/:ticker/rolling-alpha?benchmark=SPY
/// Rolling 3, 5 and 10 year alpha against the benchmark, one entry per common month.
pub async fn get_rolling_alpha(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(query): Query<BenchmarkQuery>,
) -> Result<Json<RollingAlphaResponse>, AppError> {
    let ticker = validate_ticker(&ticker)?;
    let benchmark = match state.benchmark_for(&query)? {
        Some(benchmark) => benchmark,
        None => validate_ticker(&state.default_benchmark)?,
    };

    let (fund, bench) = tokio::try_join!(
        state.source.fetch_monthly(&ticker),
        state.source.fetch_monthly(&benchmark)
    )?;
    let rolling = state.engine.rolling_alpha(&prices(&fund), &prices(&bench))?;

    Ok(Json(RollingAlphaResponse { ticker, benchmark, rolling }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::synthetic::monthly_price_path;
    use analytics::{AnalyticsEngine, MetricsParameters, SeededRng};
    use api_client::QuoteSource;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    /// In-memory quote source keyed by ticker.
    struct StubSource(HashMap<String, Vec<MonthlyObservation>>);

    #[async_trait]
    impl QuoteSource for StubSource {
        async fn fetch_monthly(&self, ticker: &str) -> Result<Vec<MonthlyObservation>, ApiError> {
            self.0.get(ticker).cloned().ok_or_else(|| ApiError::Provider {
                ticker: ticker.to_string(),
                code: "Not Found".to_string(),
                description: "No data found".to_string(),
            })
        }
    }

    fn observations(seed: u64, months: usize) -> Vec<MonthlyObservation> {
        let returns = SeededRng::new(seed).returns(months - 1, 0.007, 0.04);
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let path = monthly_price_path(start, 50.0, &returns);
        path.iter()
            .enumerate()
            .map(|(i, p)| MonthlyObservation {
                date: p.date,
                price: p.value,
                period_return: (i > 0).then(|| p.value / path[i - 1].value - 1.0),
                index: p.value / path[0].value * 100.0,
            })
            .collect()
    }

    fn state() -> Arc<AppState> {
        let mut data = HashMap::new();
        data.insert("FUND".to_string(), observations(7, 48));
        data.insert("SPY".to_string(), observations(11, 48));
        data.insert("QQQ".to_string(), observations(13, 48));
        data.insert("NEW".to_string(), observations(17, 1));
        Arc::new(AppState {
            source: Arc::new(StubSource(data)),
            engine: AnalyticsEngine::new(MetricsParameters::default()),
            default_benchmark: "SPY".to_string(),
        })
    }

    fn query(benchmark: Option<&str>) -> Query<BenchmarkQuery> {
        Query(BenchmarkQuery { benchmark: benchmark.map(str::to_string) })
    }

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn fund_series_is_returned_under_canonical_ticker() {
        let Json(response) = get_fund(State(state()), Path("fund".to_string())).await.unwrap();
        assert_eq!(response.ticker, "FUND");
        assert_eq!(response.series.len(), 48);
        assert_eq!(response.series[0].index, 100.0);
    }

    #[tokio::test]
    async fn metrics_use_the_default_benchmark() {
        let Json(response) = get_metrics(State(state()), Path("FUND".to_string()), query(None))
            .await
            .unwrap();

        assert_eq!(response.benchmark.as_deref(), Some("SPY"));
        assert_eq!(response.metrics.periods, 47);
        let comparison = response.metrics.benchmark.as_ref().expect("benchmark comparison");
        assert_eq!(comparison.aligned_periods, 47);
        assert!(comparison.alpha_3yr.is_some());
        assert!(comparison.alpha_5yr.is_none());

        let json = serde_json::to_value(&response.metrics).unwrap();
        assert!(json["cagr"].is_number());
    }

    #[tokio::test]
    async fn empty_benchmark_skips_the_comparison() {
        let Json(response) = get_metrics(State(state()), Path("FUND".to_string()), query(Some("")))
            .await
            .unwrap();
        assert!(response.benchmark.is_none());
        assert!(response.metrics.benchmark.is_none());
    }

    #[tokio::test]
    async fn rolling_alpha_has_one_entry_per_common_month() {
        let Json(response) =
            get_rolling_alpha(State(state()), Path("FUND".to_string()), query(Some("qqq")))
                .await
                .unwrap();

        assert_eq!(response.benchmark, "QQQ");
        assert_eq!(response.rolling.len(), 47);
        assert!(response.rolling[34].alpha_3yr.is_none());
        assert!(response.rolling[35].alpha_3yr.is_some());
        assert!(response.rolling.iter().all(|r| r.alpha_10yr.is_none()));
    }

    #[tokio::test]
    async fn errors_map_to_http_statuses() {
        let err = get_fund(State(state()), Path("MISSING".to_string())).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_GATEWAY);

        let err = get_fund(State(state()), Path("bad/ticker".to_string())).await.unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err = get_metrics(State(state()), Path("NEW".to_string()), query(Some("")))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
