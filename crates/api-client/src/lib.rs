use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use configuration::ProviderSettings;
use core_types::MonthlyObservation;
use reqwest::Url;
use std::time::Duration;

pub mod error;
pub mod responses;
// --- Public API ---
pub use responses::{ChartResponse, to_monthly};

/// The abstract interface for a source of monthly price history.
/// Handlers and the CLI only see this trait, so the HTTP client can be
/// swapped for an in-memory stub in tests.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetches the full monthly history of `ticker`, oldest first.
    async fn fetch_monthly(&self, ticker: &str) -> Result<Vec<MonthlyObservation>, ApiError>;
}

/// Checks a ticker symbol and returns it in canonical (upper case) form.
pub fn validate_ticker(ticker: &str) -> Result<String, ApiError> {
    let ticker = ticker.trim();
    if ticker.is_empty() || ticker.len() > 20 {
        return Err(ApiError::InvalidRequest(format!(
            "Ticker must be 1 to 20 characters, got '{ticker}'"
        )));
    }
    if let Some(c) = ticker
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
    {
        return Err(ApiError::InvalidRequest(format!(
            "Ticker '{ticker}' contains an invalid character '{c}'"
        )));
    }
    Ok(ticker.to_ascii_uppercase())
}

/// A `QuoteSource` backed by the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff: Duration,
}

impl YahooClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self::with_client(client, settings))
    }

    /// Uses a pre-built HTTP client, e.g. one shared with other components.
    pub fn with_client(client: reqwest::Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            backoff: settings.backoff,
        }
    }

    fn chart_url(&self, ticker: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| {
                ApiError::InvalidRequest(format!("Invalid base URL '{}': {e}", self.base_url))
            })?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest(format!("Invalid base URL '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        url.query_pairs_mut()
            .append_pair("period1", "0")
            .append_pair("period2", &Utc::now().timestamp().to_string())
            .append_pair("interval", "1mo")
            .append_pair("includeAdjustedClose", "true");
        Ok(url)
    }

    /// Sends one request and classifies the outcome.
    async fn request_chart(&self, url: Url) -> Result<ChartResponse, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| ApiError::Deserialization(e.to_string()));
        }
        // Unknown symbols come back as 404 with a chart error payload. Let the
        // caller turn that into a provider error instead of a bare status.
        if let Ok(chart) = serde_json::from_str::<ChartResponse>(&text) {
            if chart.chart.error.is_some() {
                return Ok(chart);
            }
        }
        Err(ApiError::Status {
            status,
            message: text.chars().take(200).collect(),
        })
    }

    /// Fetches the raw chart payload, retrying transient failures with
    /// exponential backoff.
    pub async fn fetch_chart(&self, ticker: &str) -> Result<ChartResponse, ApiError> {
        let url = self.chart_url(ticker)?;
        let mut attempt = 0u32;
        loop {
            match self.request_chart(url.clone()).await {
                Ok(chart) => return Ok(chart),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        ticker,
                        attempt,
                        max_retries = self.max_retries,
                        ?delay,
                        error = %e,
                        "Quote request failed, retrying."
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn fetch_monthly(&self, ticker: &str) -> Result<Vec<MonthlyObservation>, ApiError> {
        let ticker = validate_ticker(ticker)?;
        let chart = self.fetch_chart(&ticker).await?;
        let series = to_monthly(&ticker, &chart)?;
        tracing::debug!(ticker = %ticker, observations = series.len(), "Fetched monthly history.");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const CHART: &str = r#"{"chart": {"result": [{
        "timestamp": [1577836800, 1580515200],
        "indicators": {"adjclose": [{"adjclose": [50.0, 55.0]}]}
    }], "error": null}}"#;

    /// Serves the canned responses in order, one per connection, and records
    /// the request lines it saw.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                let request = String::from_utf8_lossy(&request);
                log.lock().unwrap().push(request.lines().next().unwrap_or_default().to_string());

                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (addr, seen)
    }

    fn client_for(addr: SocketAddr, max_retries: u32) -> YahooClient {
        let settings = ProviderSettings {
            base_url: format!("http://{addr}/"),
            timeout: Duration::from_secs(5),
            max_retries,
            backoff: Duration::from_millis(1),
            ..ProviderSettings::default()
        };
        YahooClient::new(&settings).unwrap()
    }

    #[test]
    fn tickers_are_validated_and_upper_cased() {
        assert_eq!(validate_ticker(" vfiax ").unwrap(), "VFIAX");
        assert_eq!(validate_ticker("brk-b").unwrap(), "BRK-B");
        assert_eq!(validate_ticker("^gspc").unwrap(), "^GSPC");
        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("SPY/../x").is_err());
        assert!(validate_ticker(&"A".repeat(21)).is_err());
    }

    #[test]
    fn only_transient_failures_are_retryable() {
        let status = |code| ApiError::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!ApiError::InvalidData("x".into()).is_retryable());
        assert!(!ApiError::Deserialization("x".into()).is_retryable());
    }

    #[test]
    fn chart_url_targets_monthly_adjusted_history() {
        let settings = ProviderSettings {
            base_url: "https://example.com".to_string(),
            ..ProviderSettings::default()
        };
        let url = YahooClient::new(&settings).unwrap().chart_url("SPY").unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/SPY");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("interval".to_string(), "1mo".to_string())));
        assert!(query.contains(&("includeAdjustedClose".to_string(), "true".to_string())));
        assert!(query.contains(&("period1".to_string(), "0".to_string())));
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let (addr, seen) = serve(vec![(503, "busy"), (200, CHART)]).await;
        let series = client_for(addr, 3).fetch_monthly("fake").await.unwrap();

        assert_eq!(series.len(), 2);
        assert!((series[1].period_return.unwrap() - 0.1).abs() < 1e-12);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("GET /v8/finance/chart/FAKE?"));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (addr, seen) = serve(vec![(503, "busy"), (503, "busy")]).await;
        let err = client_for(addr, 1).fetch_monthly("FAKE").await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_symbol_is_a_provider_error_without_retry() {
        let body = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let (addr, seen) = serve(vec![(404, body)]).await;
        let err = client_for(addr, 3).fetch_monthly("NOPE").await.unwrap_err();

        assert!(matches!(err, ApiError::Provider { .. }));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
