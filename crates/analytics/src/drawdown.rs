//! Peak-to-trough analysis of a level series.
//!
//! Drawdowns are reported as positive decimals: `0.25` means the level sits
//! 25% below its running peak, `0.0` means it is at a new high.

use crate::error::AnalyticsError;
use crate::validation::{validate_finite, validate_non_empty};
use chrono::NaiveDate;
use core_types::PricePoint;
use serde::Serialize;

/// The drawdown observed at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub drawdown: f64,
}

/// Full drawdown analysis of a dated level series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownResult {
    /// Worst decline from a running peak, in `0..=1` for positive levels.
    pub max_drawdown: f64,
    /// Date of the peak that preceded the worst trough.
    pub max_drawdown_start: NaiveDate,
    /// Date of the worst trough.
    pub max_drawdown_end: NaiveDate,
    /// Drawdown at the last observation.
    pub current_drawdown: f64,
    pub drawdown_series: Vec<DrawdownPoint>,
}

/// Decline of `value` from `peak`. A non-positive peak has nothing to lose from.
fn drawdown_from(peak: f64, value: f64) -> f64 {
    if peak > 0.0 { (peak - value) / peak } else { 0.0 }
}

/// Walks the date-sorted series keeping the running peak and the worst drawdown.
pub fn analyze_drawdown(prices: &[PricePoint]) -> Result<DrawdownResult, AnalyticsError> {
    validate_non_empty("prices", prices)?;

    let mut sorted = prices.to_vec();
    sorted.sort_by_key(|p| p.date);

    let first = sorted[0];
    let mut peak = first.value;
    let mut peak_date = first.date;
    let mut max_drawdown = 0.0;
    let mut max_drawdown_start = first.date;
    let mut max_drawdown_end = first.date;
    let mut drawdown_series = Vec::with_capacity(sorted.len());

    for point in &sorted {
        if point.value > peak {
            peak = point.value;
            peak_date = point.date;
        }

        let drawdown = drawdown_from(peak, point.value);
        drawdown_series.push(DrawdownPoint {
            date: point.date,
            drawdown,
        });

        if drawdown > max_drawdown {
            max_drawdown = drawdown;
            max_drawdown_start = peak_date;
            max_drawdown_end = point.date;
        }
    }

    let current_drawdown = drawdown_series.last().map_or(0.0, |p| p.drawdown);

    Ok(DrawdownResult {
        max_drawdown,
        max_drawdown_start,
        max_drawdown_end,
        current_drawdown,
        drawdown_series,
    })
}

/// Maximum drawdown of an undated, chronological level series.
pub fn max_drawdown(values: &[f64]) -> Result<f64, AnalyticsError> {
    validate_non_empty("values", values)?;

    let mut peak = values[0];
    let mut max_drawdown: f64 = 0.0;
    for &value in values {
        if value > peak {
            peak = value;
        }
        max_drawdown = max_drawdown.max(drawdown_from(peak, value));
    }
    Ok(max_drawdown)
}

/// Maximum drawdown of the wealth index obtained by compounding `returns` from 1.0.
pub fn max_drawdown_from_returns(returns: &[f64]) -> Result<f64, AnalyticsError> {
    validate_non_empty("returns", returns)?;
    validate_finite("returns", returns)?;

    let mut wealth = Vec::with_capacity(returns.len() + 1);
    wealth.push(1.0);
    let mut level = 1.0;
    for r in returns {
        level *= 1.0 + r;
        wealth.push(level);
    }
    max_drawdown(&wealth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SeededRng;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn series(values: &[f64]) -> Vec<PricePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PricePoint::new(day(i as u32 + 1), v))
            .collect()
    }

    #[test]
    fn worst_drawdown_and_its_window() {
        let prices = series(&[100.0, 120.0, 90.0, 95.0, 110.0, 85.0, 100.0]);
        let result = analyze_drawdown(&prices).unwrap();

        assert!((result.max_drawdown - 0.2917).abs() < 1e-4);
        assert!((result.current_drawdown - 0.1667).abs() < 1e-4);
        assert_eq!(result.max_drawdown_start, day(2));
        assert_eq!(result.max_drawdown_end, day(6));
        assert_eq!(result.drawdown_series.len(), 7);
        assert_eq!(result.drawdown_series[1].drawdown, 0.0);
    }

    #[test]
    fn non_decreasing_path_has_no_drawdown() {
        let result = analyze_drawdown(&series(&[10.0, 10.0, 11.0, 15.0, 15.5])).unwrap();
        assert_eq!(result.max_drawdown, 0.0);
        assert_eq!(result.current_drawdown, 0.0);
        assert_eq!(result.max_drawdown_start, day(1));
        assert_eq!(result.max_drawdown_end, day(1));
    }

    #[test]
    fn unsorted_prices_are_analysed_in_date_order() {
        let mut prices = series(&[100.0, 120.0, 110.0, 90.0, 95.0, 130.0]);
        prices.reverse();
        let result = analyze_drawdown(&prices).unwrap();
        assert!((result.max_drawdown - 0.25).abs() < 1e-12);
        assert_eq!(result.max_drawdown_end, day(4));
        assert_eq!(result.current_drawdown, 0.0);
    }

    #[test]
    fn zero_and_negative_levels_do_not_fail() {
        let result = analyze_drawdown(&series(&[0.0, -5.0, 0.0, 10.0, 5.0])).unwrap();
        assert_eq!(result.drawdown_series[1].drawdown, 0.0);
        assert!((result.max_drawdown - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(analyze_drawdown(&[]), Err(AnalyticsError::EmptySeries("prices")));
        assert!(max_drawdown(&[]).is_err());
        assert!(max_drawdown_from_returns(&[]).is_err());
    }

    #[test]
    fn drawdown_of_compounded_returns() {
        let returns = [
            0.02, -0.01, 0.03, 0.015, 0.0, 0.025, -0.02, 0.01, 0.04, -0.015, 0.005, 0.02,
        ];
        let dd = max_drawdown_from_returns(&returns).unwrap();
        assert!((dd - 0.02).abs() < 1e-4);

        assert_eq!(max_drawdown_from_returns(&[0.0; 12]).unwrap(), 0.0);
    }

    #[test]
    fn drawdown_is_never_negative() {
        let mut rng = SeededRng::new(7);
        for _ in 0..50 {
            let returns: Vec<f64> = (0..60).map(|_| rng.next_gaussian(0.005, 0.04)).collect();
            let dd = max_drawdown_from_returns(&returns).unwrap();
            assert!(dd >= 0.0);
            assert!(dd <= 1.0);
        }
    }
}
