//! Growth, hit-rate, volatility and risk-adjusted ratio calculations.
//!
//! Every function is a pure reduction over a return slice (plus an aligned
//! benchmark slice where relevant). Conventions, fixed once for the crate:
//!
//! * standard deviations are sample deviations (`n - 1` denominator);
//! * annualisation multiplies per-period means by `periods_per_year` and
//!   deviations by its square root;
//! * Sharpe periodises the annual risk-free rate geometrically,
//!   `(1 + rf)^(1 / periods_per_year) - 1`;
//! * a deviation below [`DEVIATION_EPSILON`] counts as zero, so a constant
//!   series is not turned into a huge finite ratio by rounding noise.

use crate::error::AnalyticsError;
use crate::validation::{
    validate_equal_length, validate_finite, validate_non_empty, validate_positive_period,
};

/// Deviations smaller than this are treated as exactly zero.
pub const DEVIATION_EPSILON: f64 = 1e-15;

fn is_strictly_positive(x: f64) -> bool {
    x > 0.0 && x.is_finite()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, 0 for fewer than two observations.
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    let std_dev = (sum_sq / (values.len() - 1) as f64).sqrt();
    if std_dev < DEVIATION_EPSILON { 0.0 } else { std_dev }
}

/// Compound annual growth rate between two positive levels.
///
/// `(end / start)^(1 / years) - 1`. Fails with [`AnalyticsError::InvalidInput`]
/// when any argument is not strictly positive.
pub fn cagr(start_value: f64, end_value: f64, years: f64) -> Result<f64, AnalyticsError> {
    if !is_strictly_positive(start_value)
        || !is_strictly_positive(end_value)
        || !is_strictly_positive(years)
    {
        return Err(AnalyticsError::InvalidInput(format!(
            "cagr requires positive start, end and years (got {start_value}, {end_value}, {years})"
        )));
    }
    Ok((end_value / start_value).powf(1.0 / years) - 1.0)
}

/// Compound annual growth rate of a return series.
///
/// The series spans `returns.len() / periods_per_year` years; an empty series
/// spans zero years and has a CAGR of 0. A series that compounds to exactly
/// zero wealth has a CAGR of -100%; compounding below zero is rejected because
/// the power law has no real answer there.
pub fn cagr_from_returns(returns: &[f64], periods_per_year: u32) -> Result<f64, AnalyticsError> {
    validate_finite("returns", returns)?;
    validate_positive_period(periods_per_year)?;

    let years = returns.len() as f64 / f64::from(periods_per_year);
    if years == 0.0 {
        return Ok(0.0);
    }

    let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
    if growth == 0.0 {
        return Ok(-1.0);
    }
    if growth < 0.0 {
        return Err(AnalyticsError::InvalidInput(format!(
            "returns compound to a negative ending value ({growth})"
        )));
    }
    Ok(growth.powf(1.0 / years) - 1.0)
}

/// Fraction of periods counted as hits.
///
/// Without a benchmark a hit is a strictly positive return; with one it is a
/// return strictly above the benchmark's for the same period. Ties and zero
/// returns are misses. An empty series has a hit ratio of 0.
pub fn hit_ratio(returns: &[f64], benchmark: Option<&[f64]>) -> Result<f64, AnalyticsError> {
    let hits = match benchmark {
        Some(benchmark) => {
            validate_equal_length(returns, benchmark)?;
            returns.iter().zip(benchmark).filter(|(r, b)| r > b).count()
        }
        None => returns.iter().filter(|r| **r > 0.0).count(),
    };

    if returns.is_empty() {
        return Ok(0.0);
    }
    Ok(hits as f64 / returns.len() as f64)
}

/// Sample standard deviation of the returns, optionally annualised by `√periods_per_year`.
///
/// Fewer than two observations give 0.
pub fn volatility(
    returns: &[f64],
    periods_per_year: u32,
    annualize: bool,
) -> Result<f64, AnalyticsError> {
    validate_finite("returns", returns)?;
    validate_positive_period(periods_per_year)?;

    let std_dev = sample_std_dev(returns);
    if annualize {
        Ok(std_dev * f64::from(periods_per_year).sqrt())
    } else {
        Ok(std_dev)
    }
}

/// Volatility over the most recent `window` observations only.
pub fn trailing_volatility(
    returns: &[f64],
    window: usize,
    periods_per_year: u32,
    annualize: bool,
) -> Result<f64, AnalyticsError> {
    let start = returns.len().saturating_sub(window);
    volatility(&returns[start..], periods_per_year, annualize)
}

/// Annualised Sharpe ratio.
///
/// The annual `risk_free_rate` is converted to a per-period rate
/// geometrically and subtracted from every return. The mean excess return is
/// divided by the sample deviation of the returns. A series without
/// volatility has a Sharpe ratio of 0.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Result<f64, AnalyticsError> {
    validate_non_empty("returns", returns)?;
    validate_finite("returns", returns)?;
    validate_positive_period(periods_per_year)?;

    let ppy = f64::from(periods_per_year);
    let periodic_rf = (1.0 + risk_free_rate).powf(1.0 / ppy) - 1.0;

    let std_dev = sample_std_dev(returns);
    if std_dev == 0.0 {
        return Ok(0.0);
    }

    let mean_excess = mean(returns) - periodic_rf;
    Ok(mean_excess * ppy / (std_dev * ppy.sqrt()))
}

/// Annualised Sortino ratio against a per-period `target` return.
///
/// The downside deviation is the root mean square of `r - target` over the
/// sub-target periods, divided by the full sample count. With no sub-target
/// period at all there is no observed downside risk and the ratio is
/// `f64::INFINITY`.
pub fn sortino_ratio(
    returns: &[f64],
    target: f64,
    periods_per_year: u32,
) -> Result<f64, AnalyticsError> {
    validate_non_empty("returns", returns)?;
    validate_finite("returns", returns)?;
    validate_positive_period(periods_per_year)?;

    let downside_sq: f64 = returns
        .iter()
        .filter(|r| **r < target)
        .map(|r| (r - target).powi(2))
        .sum();
    let downside_deviation = (downside_sq / returns.len() as f64).sqrt();
    if downside_deviation == 0.0 {
        return Ok(f64::INFINITY);
    }

    let ppy = f64::from(periods_per_year);
    Ok((mean(returns) - target) * ppy / (downside_deviation * ppy.sqrt()))
}

/// Annualised Information Ratio of `portfolio` against an aligned `benchmark`.
///
/// Mean active return divided by the tracking error (sample deviation of the
/// active returns). When the tracking error is zero the portfolio tracks the
/// benchmark exactly and the ratio is unbounded. Its sign follows the mean
/// active return: `f64::INFINITY` when it is zero or positive,
/// `f64::NEG_INFINITY` when it is negative. A tracking error below
/// [`DEVIATION_EPSILON`] counts as zero. Fewer than two observations cannot
/// have a tracking error and give 0.
pub fn information_ratio(
    portfolio: &[f64],
    benchmark: &[f64],
    periods_per_year: u32,
) -> Result<f64, AnalyticsError> {
    validate_equal_length(portfolio, benchmark)?;
    validate_non_empty("portfolio", portfolio)?;
    validate_finite("portfolio", portfolio)?;
    validate_finite("benchmark", benchmark)?;
    validate_positive_period(periods_per_year)?;

    if portfolio.len() < 2 {
        return Ok(0.0);
    }

    let active: Vec<f64> = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| p - b)
        .collect();
    let mean_active = mean(&active);
    let tracking_error = sample_std_dev(&active);

    if tracking_error == 0.0 {
        return Ok(if mean_active < 0.0 {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let ppy = f64::from(periods_per_year);
    Ok(mean_active * ppy / (tracking_error * ppy.sqrt()))
}
