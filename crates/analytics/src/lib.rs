//! # Value Lab Analytics Engine
//!
//! This crate computes the investment-performance statistics behind every
//! report: growth rate, drawdown, hit rate, risk-adjusted ratios and rolling
//! excess return against a benchmark.
//!
//! ## Architectural Principles
//!
//! - **Pure Functions:** Every metric is a deterministic function of its
//!   arguments. There is no I/O and no shared mutable state, so calls can run
//!   on any thread without synchronization.
//! - **One Error Policy:** Invalid arguments (empty series, mismatched
//!   lengths, non-positive periods or CAGR operands) fail with an
//!   `AnalyticsError`. Financially meaningful degenerate cases return
//!   sentinels instead: `f64::INFINITY` for a Sortino ratio without downside
//!   or an Information Ratio without tracking error, `0.0` for zero
//!   volatility, `None` for a rolling window without enough history.
//! - **Positive Drawdowns:** Drawdowns are positive decimals, `0.0` meaning
//!   no loss from the running peak.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: computes a full `PerformanceReport` from price series.
//! - `ratios`, `drawdown`, `rolling`, `align`, `returns`: the individual calculations.
//! - `SeededRng`: a deterministic generator for synthetic series.

// Declare the modules that constitute this crate.
pub mod align;
pub mod drawdown;
pub mod engine;
pub mod error;
pub mod ratios;
pub mod report;
pub mod returns;
pub mod rolling;
pub mod synthetic;
pub mod validation;

// Re-export the key components to create a clean, public-facing API.
pub use align::{AlignedPair, align};
pub use drawdown::{
    DrawdownPoint, DrawdownResult, analyze_drawdown, max_drawdown, max_drawdown_from_returns,
};
pub use engine::{AnalyticsEngine, MetricsParameters};
pub use error::AnalyticsError;
pub use ratios::{
    cagr, cagr_from_returns, hit_ratio, information_ratio, sharpe_ratio, sortino_ratio,
    trailing_volatility, volatility,
};
pub use report::{BenchmarkComparison, PerformanceReport};
pub use returns::{Returns, calculate_returns, period_returns, return_values};
pub use rolling::{
    RollingAlphaResult, RollingWindow, rolling_alpha, rolling_alpha_10y, rolling_alpha_3y,
    rolling_alpha_5y, rolling_alpha_by_date,
};
pub use synthetic::SeededRng;
