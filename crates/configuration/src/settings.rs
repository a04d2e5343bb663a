use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section is optional in `config.toml`; missing sections and keys fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub metrics: MetricsSettings,
    pub logging: LoggingSettings,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Parameters for the quote provider client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the chart API, without a trailing slash.
    pub base_url: String,
    /// Timeout for a single HTTP request.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// How many times a failed request is retried before giving up.
    pub max_retries: u32,
    /// Delay before the first retry. Doubles on every further attempt.
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
    pub user_agent: String,
}

/// Conventions applied when computing metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Observations per year. The provider delivers monthly data.
    pub periods_per_year: u32,
    /// Annual risk-free rate for the Sharpe ratio (0.02 = 2%).
    pub risk_free_rate: f64,
    /// Per-period minimum acceptable return for the Sortino ratio.
    pub target_return: f64,
    /// Ticker used as benchmark when a request does not name one.
    pub default_benchmark: String,
}

/// Log output settings. `RUST_LOG` takes precedence over `level` when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// When set, logs go to a daily rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

// --- Default Implementations ---
// This allows a user to omit any section from their toml
// and still have it work with sensible defaults.

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff: Duration::from_millis(500),
            user_agent: concat!("value-lab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            periods_per_year: 12,
            risk_free_rate: 0.02,
            target_return: 0.0,
            default_benchmark: "SPY".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            format: LogFormat::Full,
        }
    }
}

impl Settings {
    /// Rejects values that would only fail later, deep inside a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        if self.provider.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "provider.timeout must be positive".to_string(),
            ));
        }
        if self.metrics.periods_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "metrics.periods_per_year must be positive".to_string(),
            ));
        }
        if !self.metrics.risk_free_rate.is_finite() || self.metrics.risk_free_rate <= -1.0 {
            return Err(ConfigError::ValidationError(format!(
                "metrics.risk_free_rate must be a finite rate above -100%, got {}",
                self.metrics.risk_free_rate
            )));
        }
        if !self.metrics.target_return.is_finite() {
            return Err(ConfigError::ValidationError(
                "metrics.target_return must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
