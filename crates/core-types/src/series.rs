use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated observation of an asset's level (a price or an index value).
///
/// The value may be zero or negative; it is up to each calculation to decide
/// whether it can work with such a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A fractional period-over-period change, stamped with the date the period ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    #[serde(rename = "return")]
    pub value: f64,
}

impl ReturnPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// A single month of quote data as delivered by the quote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    /// First day of the month the observation belongs to.
    pub date: NaiveDate,
    /// Adjusted close.
    pub price: f64,
    /// Month-on-month change. `None` for the first observation of a series.
    #[serde(rename = "return")]
    pub period_return: Option<f64>,
    /// Price rebased so that the first observation of the series is 100.
    pub index: f64,
}

impl MonthlyObservation {
    pub fn price_point(&self) -> PricePoint {
        PricePoint::new(self.date, self.price)
    }

    pub fn index_point(&self) -> PricePoint {
        PricePoint::new(self.date, self.index)
    }
}
