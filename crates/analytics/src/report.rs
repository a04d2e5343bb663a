use chrono::NaiveDate;
use serde::Serialize;

/// Serializers that keep the engine's sentinel values distinct in JSON.
///
/// JSON has no infinities, so `±∞` are written as the strings `"Infinity"`
/// and `"-Infinity"`. NaN and `None` are written as `null`.
pub mod sentinel {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else if *value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub mod option {
        use serde::Serializer;

        pub fn serialize<S: Serializer>(
            value: &Option<f64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Metrics of a portfolio measured against a benchmark over their common dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    /// Number of return periods both series share.
    pub aligned_periods: usize,
    /// Fraction of shared periods in which the portfolio beat the benchmark.
    pub hit_ratio: f64,
    #[serde(with = "sentinel")]
    pub information_ratio: f64,
    /// Alpha of the most recent full window, if the history is long enough.
    #[serde(with = "sentinel::option")]
    pub alpha_3yr: Option<f64>,
    #[serde(with = "sentinel::option")]
    pub alpha_5yr: Option<f64>,
    #[serde(with = "sentinel::option")]
    pub alpha_10yr: Option<f64>,
}

/// A standardized report of a price series' performance.
///
/// This struct is the final output of the `AnalyticsEngine` and serves as the
/// data transfer object handed to the HTTP layer and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    // I. Coverage
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Number of return periods.
    pub periods: usize,
    pub years: f64,

    // II. Growth
    pub total_return: f64,
    pub cagr: f64,
    pub hit_ratio: f64,

    // III. Risk and Drawdown
    pub volatility: f64,
    pub max_drawdown: f64,
    pub max_drawdown_start: NaiveDate,
    pub max_drawdown_end: NaiveDate,
    pub current_drawdown: f64,

    // IV. Risk-adjusted ratios
    #[serde(with = "sentinel")]
    pub sharpe_ratio: f64,
    #[serde(with = "sentinel")]
    pub sortino_ratio: f64,

    // V. Relative to a benchmark, when one was supplied
    pub benchmark: Option<BenchmarkComparison>,
}
