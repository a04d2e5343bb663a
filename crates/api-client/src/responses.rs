use crate::error::ApiError;
use chrono::{DateTime, Datelike, NaiveDate};
use core_types::MonthlyObservation;
use serde::Deserialize;

// Only the parts of the chart payload we read are modelled. Anything else the
// provider sends is ignored, and every field is optional because the provider
// omits or nulls them freely.

/// The response from `GET /v8/finance/chart/{ticker}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    /// Seconds since the Unix epoch, one per bar.
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Option<Vec<Option<f64>>>,
}

/// Represents an error reported inside the chart payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl ChartResponse {
    /// Zips timestamps with adjusted closes, skipping bars without a usable price.
    fn bars(&self) -> Vec<(i64, f64)> {
        let Some(result) = self.chart.result.as_ref().and_then(|r| r.first()) else {
            return Vec::new();
        };
        let timestamps = result.timestamp.as_deref().unwrap_or_default();
        let closes = result
            .indicators
            .as_ref()
            .and_then(|i| i.adjclose.as_ref())
            .and_then(|a| a.first())
            .and_then(|a| a.adjclose.as_deref())
            .unwrap_or_default();

        timestamps
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| match close {
                Some(price) if price.is_finite() && *price > 0.0 => Some((ts, *price)),
                Some(price) => {
                    tracing::warn!(timestamp = ts, price, "Skipping unusable adjusted close.");
                    None
                }
                None => None,
            })
            .collect()
    }
}

/// First day of the month containing `timestamp` (UTC).
fn month_start(timestamp: i64) -> Result<NaiveDate, ApiError> {
    let at = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {timestamp}")))?;
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {timestamp}")))
}

/// Converts a chart payload into a monthly series.
///
/// Dates are snapped to the first of their month. When the provider sends two
/// bars for the same month (the running month is often repeated) the later
/// one wins. Returns are month-on-month and the index is rebased to 100 at the
/// first observation.
pub fn to_monthly(
    ticker: &str,
    response: &ChartResponse,
) -> Result<Vec<MonthlyObservation>, ApiError> {
    if let Some(error) = &response.chart.error {
        return Err(ApiError::Provider {
            ticker: ticker.to_string(),
            code: error.code.clone(),
            description: error.description.clone(),
        });
    }

    let mut months: Vec<(NaiveDate, f64)> = Vec::new();
    for (timestamp, price) in response.bars() {
        let date = month_start(timestamp)?;
        match months.last_mut() {
            Some(last) if last.0 == date => last.1 = price,
            _ => months.push((date, price)),
        }
    }

    let Some(&(_, base)) = months.first() else {
        return Err(ApiError::InvalidData(format!("No prices returned for '{ticker}'")));
    };

    let series = months
        .iter()
        .enumerate()
        .map(|(i, &(date, price))| MonthlyObservation {
            date,
            price,
            period_return: (i > 0).then(|| price / months[i - 1].1 - 1.0),
            index: price / base * 100.0,
        })
        .collect();
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2020-01-01, 2020-02-01, 2020-03-01, 2020-03-20 (all 00:00 UTC)
    const FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "FAKE"},
                "timestamp": [1577836800, 1580515200, 1583020800, 1584662400],
                "indicators": {
                    "quote": [{"close": [1, 2, 3, 4]}],
                    "adjclose": [{"adjclose": [100.0, 110.0, null, 88.0]}]
                }
            }],
            "error": null
        }
    }"#;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converts_chart_payload_to_monthly_series() {
        let series = to_monthly("FAKE", &parse(FIXTURE)).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(series[0].period_return, None);
        assert_eq!(series[0].index, 100.0);
        assert!((series[1].period_return.unwrap() - 0.1).abs() < 1e-12);
        // The null bar on 2020-03-01 is dropped and the 2020-03-20 bar takes its month.
        assert_eq!(series[2].date, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert!((series[2].period_return.unwrap() + 0.2).abs() < 1e-12);
        assert!((series[2].index - 88.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_month_keeps_the_later_bar() {
        let json = r#"{"chart": {"result": [{
            "timestamp": [1577836800, 1578441600],
            "indicators": {"adjclose": [{"adjclose": [100.0, 105.0]}]}
        }]}}"#;
        let series = to_monthly("FAKE", &parse(json)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].price, 105.0);
    }

    #[test]
    fn provider_error_is_surfaced() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        match to_monthly("NOPE", &parse(json)) {
            Err(ApiError::Provider { ticker, code, .. }) => {
                assert_eq!(ticker, "NOPE");
                assert_eq!(code, "Not Found");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn payload_without_prices_is_invalid() {
        let json = r#"{"chart": {"result": [{"timestamp": [1577836800], "indicators": {"adjclose": [{"adjclose": [null]}]}}]}}"#;
        assert!(matches!(to_monthly("FAKE", &parse(json)), Err(ApiError::InvalidData(_))));

        let json = r#"{"chart": {"result": []}}"#;
        assert!(matches!(to_monthly("FAKE", &parse(json)), Err(ApiError::InvalidData(_))));
    }
}
