//! Rolling alpha: annualised compound return of a portfolio minus that of its
//! benchmark, over a trailing window of whole years.
//!
//! The compounded growth of each window is maintained incrementally. Moving
//! the window by one period divides out the factor `1 + r` that leaves and
//! multiplies in the one that enters, so a full pass is linear in the series
//! length whatever the window size.

use crate::align::align;
use crate::error::AnalyticsError;
use crate::validation::{validate_finite, validate_positive_period};
use chrono::NaiveDate;
use core_types::ReturnPoint;
use serde::Serialize;

/// The standard trailing windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RollingWindow {
    ThreeYear,
    FiveYear,
    TenYear,
}

impl RollingWindow {
    pub const ALL: [RollingWindow; 3] = [Self::ThreeYear, Self::FiveYear, Self::TenYear];

    pub fn years(self) -> u32 {
        match self {
            Self::ThreeYear => 3,
            Self::FiveYear => 5,
            Self::TenYear => 10,
        }
    }
}

/// Rolling alphas for one date. A window is `None` until enough history exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingAlphaResult {
    pub date: NaiveDate,
    pub alpha_3yr: Option<f64>,
    pub alpha_5yr: Option<f64>,
    pub alpha_10yr: Option<f64>,
}

/// Running product of the `1 + r` factors inside a window.
///
/// Factors at or below zero (a loss of 100% or more) are counted instead of
/// multiplied in, so the product never has to be divided by zero when such a
/// period leaves the window. While one is inside, the window's growth is 0.
#[derive(Debug, Clone, Copy)]
struct WindowProduct {
    product: f64,
    wiped_out: usize,
}

impl WindowProduct {
    fn over(returns: &[f64]) -> Self {
        let mut acc = Self {
            product: 1.0,
            wiped_out: 0,
        };
        for &r in returns {
            acc.push(r);
        }
        acc
    }

    fn push(&mut self, r: f64) {
        let factor = 1.0 + r;
        if factor <= 0.0 {
            self.wiped_out += 1;
        } else {
            self.product *= factor;
        }
    }

    fn pop(&mut self, r: f64) {
        let factor = 1.0 + r;
        if factor <= 0.0 {
            self.wiped_out -= 1;
        } else {
            self.product /= factor;
        }
    }

    fn growth(&self) -> f64 {
        if self.wiped_out > 0 { 0.0 } else { self.product }
    }
}

/// Compounded growth of every full window, indexed by window end.
///
/// The running product is rebuilt from scratch once per `window` steps, which
/// keeps floating-point drift from repeated division bounded while staying linear.
/// It is also rebuilt as soon as it has overflowed or underflowed, since
/// dividing the offending factor back out cannot recover it.
fn rolling_growth(returns: &[f64], window: usize) -> Vec<f64> {
    let mut growth = Vec::with_capacity(returns.len() + 1 - window);
    let mut acc = WindowProduct::over(&returns[..window]);
    growth.push(acc.growth());

    for end in window..returns.len() {
        let start = end + 1 - window;
        if start % window == 0 || !acc.product.is_normal() {
            acc = WindowProduct::over(&returns[start..=end]);
        } else {
            acc.pop(returns[start - 1]);
            acc.push(returns[end]);
        }
        growth.push(acc.growth());
    }
    growth
}

/// Rolling alpha over windows of `window_years * periods_per_year` periods.
///
/// Produces one value per window end, from index `window - 1` to the last
/// index, so the output has `len - window + 1` elements. The result is empty
/// when either series is empty, when their lengths differ, or when the window
/// is longer than the series.
pub fn rolling_alpha(
    portfolio: &[f64],
    benchmark: &[f64],
    window_years: u32,
    periods_per_year: u32,
) -> Result<Vec<f64>, AnalyticsError> {
    validate_positive_period(periods_per_year)?;
    if window_years == 0 {
        return Err(AnalyticsError::InvalidInput(
            "rolling window must span at least one year".to_string(),
        ));
    }
    validate_finite("portfolio", portfolio)?;
    validate_finite("benchmark", benchmark)?;

    let window = window_years as usize * periods_per_year as usize;
    if portfolio.is_empty() || portfolio.len() != benchmark.len() || window > portfolio.len() {
        return Ok(Vec::new());
    }

    let exponent = 1.0 / f64::from(window_years);
    let alphas = rolling_growth(portfolio, window)
        .into_iter()
        .zip(rolling_growth(benchmark, window))
        .map(|(p, b)| (p.powf(exponent) - 1.0) - (b.powf(exponent) - 1.0))
        .collect();
    Ok(alphas)
}

pub fn rolling_alpha_3y(
    portfolio: &[f64],
    benchmark: &[f64],
    periods_per_year: u32,
) -> Result<Vec<f64>, AnalyticsError> {
    rolling_alpha(portfolio, benchmark, RollingWindow::ThreeYear.years(), periods_per_year)
}

pub fn rolling_alpha_5y(
    portfolio: &[f64],
    benchmark: &[f64],
    periods_per_year: u32,
) -> Result<Vec<f64>, AnalyticsError> {
    rolling_alpha(portfolio, benchmark, RollingWindow::FiveYear.years(), periods_per_year)
}

pub fn rolling_alpha_10y(
    portfolio: &[f64],
    benchmark: &[f64],
    periods_per_year: u32,
) -> Result<Vec<f64>, AnalyticsError> {
    rolling_alpha(portfolio, benchmark, RollingWindow::TenYear.years(), periods_per_year)
}

/// Aligns two dated series and reports the 3, 5 and 10 year alphas for every common date.
pub fn rolling_alpha_by_date(
    portfolio: &[ReturnPoint],
    benchmark: &[ReturnPoint],
    periods_per_year: u32,
) -> Result<Vec<RollingAlphaResult>, AnalyticsError> {
    let aligned = align(portfolio, benchmark);
    let len = aligned.len();

    let mut by_window = Vec::with_capacity(RollingWindow::ALL.len());
    for window in RollingWindow::ALL {
        let alphas = rolling_alpha(
            &aligned.portfolio,
            &aligned.benchmark,
            window.years(),
            periods_per_year,
        )?;
        // Alpha for the window ending at date index i sits at alphas[i - (len - alphas.len())].
        let offset = len - alphas.len();
        by_window.push((offset, alphas));
    }

    let at = |w: usize, i: usize| -> Option<f64> {
        let (offset, alphas) = &by_window[w];
        if alphas.is_empty() || i < *offset {
            None
        } else {
            Some(alphas[i - offset])
        }
    };

    Ok(aligned
        .dates
        .iter()
        .enumerate()
        .map(|(i, &date)| RollingAlphaResult {
            date,
            alpha_3yr: at(0, i),
            alpha_5yr: at(1, i),
            alpha_10yr: at(2, i),
        })
        .collect())
}
