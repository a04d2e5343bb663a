//! Date alignment of two return series.

use chrono::NaiveDate;
use core_types::ReturnPoint;
use serde::Serialize;
use std::collections::BTreeMap;

/// Two return series restricted to the dates they have in common.
///
/// `dates`, `portfolio` and `benchmark` always have the same length and are
/// sorted by ascending date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub portfolio: Vec<f64>,
    pub benchmark: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The portfolio side as dated returns.
    pub fn portfolio_points(&self) -> Vec<ReturnPoint> {
        zip_points(&self.dates, &self.portfolio)
    }

    /// The benchmark side as dated returns.
    pub fn benchmark_points(&self) -> Vec<ReturnPoint> {
        zip_points(&self.dates, &self.benchmark)
    }
}

fn zip_points(dates: &[NaiveDate], values: &[f64]) -> Vec<ReturnPoint> {
    dates
        .iter()
        .zip(values)
        .map(|(&date, &value)| ReturnPoint::new(date, value))
        .collect()
}

fn index_by_date(name: &str, series: &[ReturnPoint]) -> BTreeMap<NaiveDate, f64> {
    let mut map = BTreeMap::new();
    for point in series {
        if map.insert(point.date, point.value).is_some() {
            tracing::warn!(
                series = name,
                date = %point.date,
                "Duplicate date, keeping the later observation."
            );
        }
    }
    map
}

/// Intersects two dated return series on their common dates.
///
/// Never fails: series with no date in common produce an empty pair.
pub fn align(portfolio: &[ReturnPoint], benchmark: &[ReturnPoint]) -> AlignedPair {
    let left = index_by_date("portfolio", portfolio);
    let right = index_by_date("benchmark", benchmark);

    let mut aligned = AlignedPair::default();
    for (date, value) in &left {
        if let Some(other) = right.get(date) {
            aligned.dates.push(*date);
            aligned.portfolio.push(*value);
            aligned.benchmark.push(*other);
        }
    }
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(m: u32, value: f64) -> ReturnPoint {
        ReturnPoint::new(NaiveDate::from_ymd_opt(2021, m, 1).unwrap(), value)
    }

    #[test]
    fn keeps_only_common_dates_in_ascending_order() {
        let portfolio = vec![point(3, 0.03), point(1, 0.01), point(2, 0.02)];
        let benchmark = vec![point(2, -0.02), point(3, -0.03), point(4, -0.04)];

        let aligned = align(&portfolio, &benchmark);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.portfolio, vec![0.02, 0.03]);
        assert_eq!(aligned.benchmark, vec![-0.02, -0.03]);
        assert!(aligned.dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(aligned.portfolio_points()[1], point(3, 0.03));
        assert_eq!(aligned.benchmark_points()[0], point(2, -0.02));
    }

    #[test]
    fn disjoint_dates_produce_an_empty_pair() {
        let aligned = align(&[point(1, 0.01), point(2, 0.02)], &[point(5, 0.01)]);
        assert!(aligned.is_empty());
        assert!(aligned.portfolio.is_empty());
        assert!(aligned.benchmark.is_empty());
    }

    #[test]
    fn later_duplicate_wins() {
        let aligned = align(&[point(1, 0.01), point(1, 0.05)], &[point(1, 0.0)]);
        assert_eq!(aligned.portfolio, vec![0.05]);
    }
}
