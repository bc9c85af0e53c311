//! Yahoo Finance chart API client
//!
//! Uses the public `v8/finance/chart/{symbol}` endpoint. The same payload
//! serves history (`timestamp` + `indicators.quote`) and ticker info
//! (`meta`).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{MarketDataProvider, TickerInfo};
use crate::error::{AppError, Result};
use crate::frame::Candle;
use crate::models::{HistoryRequest, Interval, Period};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Lower bound used when only an end date is given
const EARLIEST_DATE: (i32, u32, u32) = (1900, 1, 1);

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Map<String, Value>,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// HTTP client for the Yahoo Finance chart API
pub struct YahooFinance {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinance {
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://query1.finance.yahoo.com`
    /// * `timeout` - per request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Created Yahoo Finance client: base_url='{}'", base_url);
        Ok(Self { base_url, client })
    }

    fn chart_query(request: &HistoryRequest) -> Vec<(&'static str, String)> {
        let mut query = vec![("interval", request.interval.as_str().to_string())];
        if request.uses_date_range() {
            let (y, m, d) = EARLIEST_DATE;
            let start = request
                .start
                .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
                .map(unix_seconds)
                .unwrap_or(0);
            let end = request.end.map(unix_seconds).unwrap_or_else(|| Utc::now().timestamp());
            query.push(("period1", start.to_string()));
            query.push(("period2", end.to_string()));
        } else {
            query.push(("range", request.period.as_str().to_string()));
        }
        query.push(("includePrePost", "false".to_string()));
        query
    }

    async fn fetch_chart(&self, symbol: &str, query: &[(&'static str, String)]) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Sending request to: {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::provider(symbol, format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::provider(symbol, format!("failed to read response body: {}", e)))?;

        match parse_chart(symbol, &body) {
            Ok(result) => Ok(result),
            Err(e) if status.is_success() => Err(e),
            Err(AppError::Provider { message, .. }) => Err(AppError::provider(
                symbol,
                format!("status {}: {}", status, message),
            )),
            Err(e) => Err(e),
        }
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

fn parse_chart(symbol: &str, body: &str) -> Result<ChartResult> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| AppError::provider(symbol, format!("unexpected response: {}", e)))?;

    if let Some(err) = envelope.chart.error {
        let description = err.description.unwrap_or_default();
        return Err(AppError::provider(symbol, format!("{} {}", err.code, description).trim().to_string()));
    }

    envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AppError::provider(symbol, "empty result"))
}

/// Convert a chart payload into candles dated in the exchange's local time
fn chart_candles(chart: &ChartResult) -> Vec<Candle> {
    let offset = chart
        .meta
        .get("gmtoffset")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let quote = chart.indicators.quote.first();
    let at = |values: Option<&Vec<Option<f64>>>, i: usize| values.and_then(|v| v.get(i).copied().flatten());

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::<Utc>::from_timestamp(ts + offset, 0)?.date_naive();
            Some(Candle {
                date,
                open: at(quote.map(|q| &q.open), i),
                high: at(quote.map(|q| &q.high), i),
                low: at(quote.map(|q| &q.low), i),
                close: at(quote.map(|q| &q.close), i),
                volume: at(quote.map(|q| &q.volume), i).map(|v| v as i64),
            })
        })
        .collect()
}

#[async_trait]
impl MarketDataProvider for YahooFinance {
    async fn ticker_info(&self, symbol: &str) -> Result<TickerInfo> {
        let request = HistoryRequest {
            period: Period::OneDay,
            interval: Interval::OneDay,
            start: None,
            end: None,
        };
        let chart = self.fetch_chart(symbol, &Self::chart_query(&request)).await?;
        if chart.meta.is_empty() {
            return Err(AppError::provider(symbol, "no ticker info"));
        }
        Ok(chart.meta)
    }

    async fn ticker_history(&self, symbol: &str, request: &HistoryRequest) -> Result<Vec<Candle>> {
        let chart = self.fetch_chart(symbol, &Self::chart_query(request)).await?;
        let candles = chart_candles(&chart);
        debug!("{}: {} bars", symbol, candles.len());
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "INFY.NS", "currency": "INR", "gmtoffset": 19800, "longName": "Infosys Limited"},
                "timestamp": [1704166200, 1704252600, 1704339000],
                "indicators": {"quote": [{
                    "open": [1550.0, 1540.5, null],
                    "high": [1560.0, 1549.0, null],
                    "low": [1540.0, 1530.0, null],
                    "close": [1555.5, 1535.0, null],
                    "volume": [1000, 2000, null]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_candles() {
        let chart = parse_chart("INFY.NS", CHART).unwrap();
        let candles = chart_candles(&chart);
        assert_eq!(candles.len(), 3);
        // 03:30 UTC is 09:00 IST, dated in exchange time
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(candles[1].close, Some(1535.0));
        assert_eq!(candles[1].volume, Some(2000));
        assert!(!candles[2].is_complete());
        assert_eq!(chart.meta["longName"], Value::String("Infosys Limited".into()));
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart("XXXX.NS", body).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("XXXX.NS"));
        assert!(message.contains("No data found"));
    }

    #[test]
    fn test_parse_chart_garbage() {
        assert!(matches!(parse_chart("A", "<html>"), Err(AppError::Provider { .. })));
        assert!(parse_chart("A", r#"{"chart":{"result":[],"error":null}}"#).is_err());
    }

    #[test]
    fn test_chart_query_range_vs_dates() {
        let query = YahooFinance::chart_query(&HistoryRequest {
            period: Period::FiveDays,
            interval: Interval::OneDay,
            start: None,
            end: None,
        });
        assert!(query.contains(&("range", "5d".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "period1"));

        let query = YahooFinance::chart_query(&HistoryRequest {
            period: Period::Max,
            interval: Interval::OneWeek,
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 2, 1),
        });
        assert!(query.contains(&("interval", "1wk".to_string())));
        assert!(query.contains(&("period1", "1704067200".to_string())));
        assert!(query.contains(&("period2", "1706745600".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "range"));
    }
}
