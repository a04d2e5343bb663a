//! Deterministic synthetic data for simulations and tests.
//!
//! [`SeededRng`] is an xorshift64* generator. The same seed always produces
//! the same sequence on every platform, so synthetic return series can be
//! reproduced exactly from their seed. It is the only stateful
//! object in the crate; the metric functions never touch it.

use chrono::{Months, NaiveDate};
use core_types::{PricePoint, ReturnPoint};
use std::f64::consts::PI;

/// Replacement state for a zero seed, which xorshift cannot leave.
const ZERO_SEED_STATE: u64 = 0x9E37_79B9_7F4A_7C15;
const MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { ZERO_SEED_STATE } else { seed };
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(MULTIPLIER)
    }

    /// Uniform sample in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Normal sample via the Box-Muller transform.
    pub fn next_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // u1 must stay away from zero for the logarithm.
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        z0 * std_dev + mean
    }

    /// `periods` normally distributed returns.
    pub fn returns(&mut self, periods: usize, mean: f64, std_dev: f64) -> Vec<f64> {
        (0..periods).map(|_| self.next_gaussian(mean, std_dev)).collect()
    }
}

/// A monthly price path starting at `start_price` on `start`, one point per month.
///
/// The path has `returns.len() + 1` points.
pub fn monthly_price_path(start: NaiveDate, start_price: f64, returns: &[f64]) -> Vec<PricePoint> {
    let mut prices = Vec::with_capacity(returns.len() + 1);
    prices.push(PricePoint::new(start, start_price));
    let mut level = start_price;
    for (i, r) in returns.iter().enumerate() {
        level *= 1.0 + r;
        prices.push(PricePoint::new(months_after(start, i + 1), level));
    }
    prices
}

/// Dates `returns` monthly, the first one falling a month after `start`.
pub fn monthly_return_points(start: NaiveDate, returns: &[f64]) -> Vec<ReturnPoint> {
    returns
        .iter()
        .enumerate()
        .map(|(i, &r)| ReturnPoint::new(months_after(start, i + 1), r))
        .collect()
}

/// Month arithmetic clamps to the end of shorter months (Jan 31 + 1 month = Feb 28/29).
fn months_after(start: NaiveDate, months: usize) -> NaiveDate {
    start
        .checked_add_months(Months::new(months as u32))
        .unwrap_or(NaiveDate::MAX)
}
