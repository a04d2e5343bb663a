//! Argument checks shared by every calculation in the crate.
//!
//! These only cover programmer-supplied invalid arguments. Each check either
//! passes or returns the matching [`AnalyticsError`] so callers can chain them
//! with `?` before producing any output.

use crate::error::AnalyticsError;

/// Fails with [`AnalyticsError::EmptySeries`] when `series` has no elements.
pub fn validate_non_empty<T>(name: &'static str, series: &[T]) -> Result<(), AnalyticsError> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptySeries(name));
    }
    Ok(())
}

/// Fails with [`AnalyticsError::LengthMismatch`] when the two series differ in length.
pub fn validate_equal_length<A, B>(left: &[A], right: &[B]) -> Result<(), AnalyticsError> {
    if left.len() != right.len() {
        return Err(AnalyticsError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Fails with [`AnalyticsError::NonFiniteValue`] on the first NaN or infinite element.
///
/// Meant for return series. Prices are not checked here since a zero price is legitimate.
pub fn validate_finite(name: &'static str, series: &[f64]) -> Result<(), AnalyticsError> {
    match series.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(AnalyticsError::NonFiniteValue {
            series: name,
            index,
            value: series[index],
        }),
        None => Ok(()),
    }
}

/// Fails with [`AnalyticsError::InvalidPeriod`] when `periods_per_year` is zero.
pub fn validate_positive_period(periods_per_year: u32) -> Result<(), AnalyticsError> {
    if periods_per_year == 0 {
        return Err(AnalyticsError::InvalidPeriod(periods_per_year));
    }
    Ok(())
}
