use crate::align::align;
use crate::drawdown::analyze_drawdown;
use crate::error::AnalyticsError;
use crate::ratios::{
    cagr, hit_ratio, information_ratio, sharpe_ratio, sortino_ratio, volatility,
};
use crate::report::{BenchmarkComparison, PerformanceReport};
use crate::returns::calculate_returns;
use crate::rolling::{RollingAlphaResult, RollingWindow, rolling_alpha, rolling_alpha_by_date};
use core_types::{PricePoint, ReturnPoint};
use serde::{Deserialize, Serialize};

/// Conventions applied by the engine to every series it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsParameters {
    /// Number of observations per year (12 for monthly data).
    pub periods_per_year: u32,
    /// Annual risk-free rate used by the Sharpe ratio, e.g. 0.02 for 2%.
    pub risk_free_rate: f64,
    /// Per-period minimum acceptable return used by the Sortino ratio.
    pub target_return: f64,
}

impl Default for MetricsParameters {
    fn default() -> Self {
        Self {
            periods_per_year: 12,
            risk_free_rate: 0.02,
            target_return: 0.0,
        }
    }
}

/// A stateless calculator for deriving a full performance report from prices.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    params: MetricsParameters,
}

impl AnalyticsEngine {
    pub fn new(params: MetricsParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MetricsParameters {
        &self.params
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `prices` - The asset's price (or index) series, in any order.
    /// * `benchmark` - An optional benchmark price series to compare against.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceReport` or an `AnalyticsError`.
    pub fn calculate(
        &self,
        prices: &[PricePoint],
        benchmark: Option<&[PricePoint]>,
    ) -> Result<PerformanceReport, AnalyticsError> {
        let ppy = self.params.periods_per_year;
        if prices.len() < 2 {
            return Err(AnalyticsError::InvalidInput(format!(
                "at least two prices are needed, got {}",
                prices.len()
            )));
        }

        let drawdown = analyze_drawdown(prices)?;
        let returns: Vec<ReturnPoint> = calculate_returns(prices).collect();
        let values: Vec<f64> = returns.iter().map(|r| r.value).collect();

        // The drawdown series is already sorted by date.
        let first = drawdown.drawdown_series[0].date;
        let last = drawdown.drawdown_series[drawdown.drawdown_series.len() - 1].date;
        let (start_value, end_value) = self.boundary_values(prices);

        let periods = prices.len() - 1;
        let years = periods as f64 / f64::from(ppy);

        tracing::debug!(periods, years, "Calculating performance metrics.");

        // A zero price inside the series makes the following return infinite.
        // Level-based metrics still hold; the return statistics are NaN.
        let finite = values.iter().all(|v| v.is_finite());
        if !finite {
            tracing::warn!(periods, "Non-finite period return; return statistics are undefined.");
        }

        let benchmark = match benchmark {
            Some(benchmark_prices) => Some(self.compare(&returns, benchmark_prices)?),
            None => None,
        };

        Ok(PerformanceReport {
            start_date: first,
            end_date: last,
            periods,
            years,
            total_return: if start_value != 0.0 { end_value / start_value - 1.0 } else { 0.0 },
            cagr: cagr(start_value, end_value, years)?,
            hit_ratio: hit_ratio(&values, None)?,
            volatility: when_finite(finite, || volatility(&values, ppy, true))?,
            max_drawdown: drawdown.max_drawdown,
            max_drawdown_start: drawdown.max_drawdown_start,
            max_drawdown_end: drawdown.max_drawdown_end,
            current_drawdown: drawdown.current_drawdown,
            sharpe_ratio: when_finite(finite, || {
                sharpe_ratio(&values, self.params.risk_free_rate, ppy)
            })?,
            sortino_ratio: when_finite(finite, || {
                sortino_ratio(&values, self.params.target_return, ppy)
            })?,
            benchmark,
        })
    }

    /// Rolling 3, 5 and 10 year alphas of `prices` against `benchmark`, one entry per common date.
    pub fn rolling_alpha(
        &self,
        prices: &[PricePoint],
        benchmark: &[PricePoint],
    ) -> Result<Vec<RollingAlphaResult>, AnalyticsError> {
        let portfolio: Vec<ReturnPoint> = calculate_returns(prices).collect();
        let benchmark: Vec<ReturnPoint> = calculate_returns(benchmark).collect();
        rolling_alpha_by_date(&portfolio, &benchmark, self.params.periods_per_year)
    }

    /// First and last values in date order.
    fn boundary_values(&self, prices: &[PricePoint]) -> (f64, f64) {
        let first = prices.iter().min_by_key(|p| p.date).map_or(0.0, |p| p.value);
        let last = prices.iter().max_by_key(|p| p.date).map_or(0.0, |p| p.value);
        (first, last)
    }

    /// Calculates all benchmark-relative metrics over the dates both series share.
    fn compare(
        &self,
        returns: &[ReturnPoint],
        benchmark_prices: &[PricePoint],
    ) -> Result<BenchmarkComparison, AnalyticsError> {
        let ppy = self.params.periods_per_year;
        let benchmark_returns: Vec<ReturnPoint> = calculate_returns(benchmark_prices).collect();
        let aligned = align(returns, &benchmark_returns);
        if aligned.is_empty() {
            return Err(AnalyticsError::InvalidInput(
                "portfolio and benchmark share no dates".to_string(),
            ));
        }

        tracing::debug!(aligned_periods = aligned.len(), "Comparing against benchmark.");

        let finite = aligned
            .portfolio
            .iter()
            .chain(&aligned.benchmark)
            .all(|v| v.is_finite());

        let latest = |window: RollingWindow| -> Result<Option<f64>, AnalyticsError> {
            if !finite {
                return Ok(None);
            }
            let alphas =
                rolling_alpha(&aligned.portfolio, &aligned.benchmark, window.years(), ppy)?;
            Ok(alphas.last().copied())
        };

        Ok(BenchmarkComparison {
            aligned_periods: aligned.len(),
            hit_ratio: hit_ratio(&aligned.portfolio, Some(&aligned.benchmark))?,
            information_ratio: when_finite(finite, || {
                information_ratio(&aligned.portfolio, &aligned.benchmark, ppy)
            })?,
            alpha_3yr: latest(RollingWindow::ThreeYear)?,
            alpha_5yr: latest(RollingWindow::FiveYear)?,
            alpha_10yr: latest(RollingWindow::TenYear)?,
        })
    }
}

/// Runs `metric` only over finite returns; otherwise the statistic is undefined.
fn when_finite(
    finite: bool,
    metric: impl FnOnce() -> Result<f64, AnalyticsError>,
) -> Result<f64, AnalyticsError> {
    if finite { metric() } else { Ok(f64::NAN) }
}
