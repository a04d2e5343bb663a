//! Periodic returns derived from a price series.

use core_types::{PricePoint, ReturnPoint};

/// Returns the period-over-period change from `prev` to `curr`.
///
/// A zero starting level yields a signed infinity, and `None` when both levels
/// are zero because there is no observable change at all.
fn period_return(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        if curr == 0.0 {
            None
        } else if curr > 0.0 {
            Some(f64::INFINITY)
        } else {
            Some(f64::NEG_INFINITY)
        }
    } else {
        Some(curr / prev - 1.0)
    }
}

/// Lazily yields one [`ReturnPoint`] per consecutive pair of prices.
///
/// Created by [`calculate_returns`]. The iterator owns a date-sorted copy of
/// the input and is consumed as it goes.
#[derive(Debug, Clone)]
pub struct Returns {
    prices: Vec<PricePoint>,
    next: usize,
}

impl Iterator for Returns {
    type Item = ReturnPoint;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.prices.len() {
            let prev = self.prices[self.next - 1];
            let curr = self.prices[self.next];
            self.next += 1;
            if let Some(value) = period_return(prev.value, curr.value) {
                return Some(ReturnPoint::new(curr.date, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.prices.len().saturating_sub(self.next)))
    }
}

/// Derives periodic returns from a price series.
///
/// The input does not need to be sorted. Each return is stamped with the date
/// of the later price of its pair. An input with fewer than two prices yields
/// nothing.
pub fn calculate_returns(prices: &[PricePoint]) -> Returns {
    let mut sorted = prices.to_vec();
    sorted.sort_by_key(|p| p.date);
    Returns {
        prices: sorted,
        next: 1,
    }
}

/// The same rule as [`calculate_returns`] over an undated, already chronological slice.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|w| period_return(w[0], w[1]))
        .collect()
}

/// Splits dated returns into their plain values.
pub fn return_values(returns: &[ReturnPoint]) -> Vec<f64> {
    returns.iter().map(|r| r.value).collect()
}
