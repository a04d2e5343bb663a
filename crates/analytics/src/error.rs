use thiserror::Error;

/// Input-contract violations raised by the metrics engine.
///
/// Financially meaningful degenerate cases (no downside periods, zero tracking
/// error, a window without enough history) are never reported through this
/// type. They come back as sentinel values instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Series '{0}' must be non-empty")]
    EmptySeries(&'static str),

    #[error("Series must have equal length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Non-finite value {value} at index {index} in series '{series}'")]
    NonFiniteValue {
        series: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Periods per year must be positive, got {0}")]
    InvalidPeriod(u32),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
