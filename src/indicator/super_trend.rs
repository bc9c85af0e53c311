//! SuperTrend over history frames, with source column retention

use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use super::{Indicator, IndicatorData};
use crate::common::{nan_to_option, round_to};
use crate::error::{AppError, Result};
use crate::frame::{self, DATE};
use crate::models::validate_super_trend_params;
use crate::trend::super_trend;

pub const SUPER_TREND: &str = "super_trend";
pub const UPPER: &str = "upper";
pub const LOWER: &str = "lower";

/// Join key pairing each result row with the source row it came from
const ROW_KEY: &str = "__source_row";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperTrendParams {
    pub lookback_periods: usize,
    pub multiplier: f64,
}

impl Default for SuperTrendParams {
    fn default() -> Self {
        Self {
            lookback_periods: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Computed {
    Single(DataFrame),
    Bulk(BTreeMap<String, DataFrame>),
}

/// SuperTrend indicator
///
/// Result tables have the columns `date, <retained...>, super_trend, upper,
/// lower`. Values are rounded to 2 decimals and warm-up rows are removed.
/// `upper` is set on bearish rows, `lower` on bullish rows.
///
/// The first successful computation is cached; later calls return it
/// unchanged.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    data: IndicatorData,
    retain_source_column: Vec<String>,
    result: Option<Computed>,
}

impl SuperTrend {
    /// `retain_source_column` defaults to `["close"]`; an empty list keeps no source column.
    pub fn new(data: impl Into<IndicatorData>, retain_source_column: Option<Vec<String>>) -> Self {
        Self {
            data: data.into(),
            retain_source_column: retain_source_column
                .unwrap_or_else(|| vec![frame::CLOSE.to_string()]),
            result: None,
        }
    }

    pub fn retain_source_column(&self) -> &[String] {
        &self.retain_source_column
    }

    /// Retained columns in caller order, `date` excluded (reserved for the join) and repeats dropped
    fn retained(&self) -> Result<Vec<String>> {
        let mut columns: Vec<String> = Vec::new();
        for name in &self.retain_source_column {
            if name == DATE || columns.contains(name) {
                continue;
            }
            if [SUPER_TREND, UPPER, LOWER].contains(&name.as_str()) {
                return Err(AppError::Indicator(format!(
                    "cannot retain '{}', it is an indicator column",
                    name
                )));
            }
            columns.push(name.clone());
        }
        Ok(columns)
    }

    fn unit_result(&self, source: &DataFrame, params: SuperTrendParams, ticker: Option<&str>) -> Result<DataFrame> {
        validate_super_trend_params(params.lookback_periods, params.multiplier)?;

        let quotes = frame::quotes_from_frame(source)?;
        let series = super_trend(
            &quotes.highs,
            &quotes.lows,
            &quotes.closes,
            params.lookback_periods,
            params.multiplier,
        );
        let rows = series.condensed_rows();
        debug!(
            ticker = ticker.unwrap_or("-"),
            bars = quotes.len(),
            rows = rows.len(),
            "computed super trend"
        );

        let pick = |values: &[f64]| -> Vec<Option<f64>> {
            rows.iter().map(|&i| nan_to_option(round_to(values[i], 2))).collect()
        };
        let dates: Vec<_> = rows.iter().map(|&i| quotes.dates[i]).collect();
        let row_index: Vec<u32> = rows.iter().map(|&i| i as u32).collect();

        let result = DataFrame::new(vec![
            Series::new(ROW_KEY.into(), row_index).into(),
            frame::date_series(DATE, &dates)?.into(),
            Series::new(SUPER_TREND.into(), pick(&series.super_trend)).into(),
            Series::new(UPPER.into(), pick(&series.upper_band)).into(),
            Series::new(LOWER.into(), pick(&series.lower_band)).into(),
        ])?;

        let retained = self.retained()?;
        let mut columns: Vec<String> = vec![DATE.to_string()];
        columns.extend(retained.iter().cloned());
        columns.extend([SUPER_TREND, UPPER, LOWER].map(String::from));

        if retained.is_empty() {
            return Ok(result.select(columns)?);
        }

        for name in &retained {
            if !frame::has_column(source, name) {
                return Err(AppError::Indicator(format!(
                    "source data has no '{}' column to retain",
                    name
                )));
            }
        }

        let mut source_columns = vec![DATE.to_string()];
        source_columns.extend(retained.iter().cloned());
        let mut source_select = source.select(source_columns)?;
        let source_rows: Vec<u32> = (0..source_select.height() as u32).collect();
        source_select.with_column(Series::new(ROW_KEY.into(), source_rows))?;

        let joined = result
            .lazy()
            .join(
                source_select.lazy(),
                [col(ROW_KEY), col(DATE)],
                [col(ROW_KEY), col(DATE)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([ROW_KEY], Default::default())
            .select(columns.iter().map(|c| col(c.as_str())).collect::<Vec<_>>())
            .collect()?;

        Ok(joined)
    }
}

impl Indicator for SuperTrend {
    type Params = SuperTrendParams;

    fn calculate_per_security(&mut self, params: SuperTrendParams) -> Result<DataFrame> {
        let source = match &self.data {
            IndicatorData::Single(df) => df,
            IndicatorData::Bulk(_) => {
                return Err(AppError::Indicator(
                    "found multiple securities, use calculate_bulk instead".to_string(),
                ))
            }
        };
        if let Some(Computed::Single(df)) = &self.result {
            return Ok(df.clone());
        }
        let df = self.unit_result(source, params, None)?;
        self.result = Some(Computed::Single(df.clone()));
        Ok(df)
    }

    fn calculate_bulk(&mut self, params: SuperTrendParams) -> Result<BTreeMap<String, DataFrame>> {
        let sources = match &self.data {
            IndicatorData::Bulk(frames) => frames,
            IndicatorData::Single(_) => {
                return Err(AppError::Indicator(
                    "found single security, use calculate_per_security instead".to_string(),
                ))
            }
        };
        if let Some(Computed::Bulk(frames)) = &self.result {
            return Ok(frames.clone());
        }
        let mut frames = BTreeMap::new();
        for (ticker, source) in sources {
            frames.insert(ticker.clone(), self.unit_result(source, params, Some(ticker))?);
        }
        self.result = Some(Computed::Bulk(frames.clone()));
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{column_names, frame_to_records, history_frame, Candle};
    use chrono::NaiveDate;
    use serde_json::json;

    fn source() -> DataFrame {
        let highs = [10.0, 11.0, 12.0, 13.0, 11.0, 9.0, 13.0];
        let lows = [8.0, 9.0, 10.0, 11.0, 7.0, 7.0, 11.0];
        let closes = [9.0, 10.0, 11.0, 12.5, 7.5, 8.5, 12.9];
        let candles: Vec<Candle> = (0..7)
            .map(|i| Candle {
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + i as u32).unwrap(),
                open: Some(closes[i] - 0.5),
                high: Some(highs[i]),
                low: Some(lows[i]),
                close: Some(closes[i]),
                volume: Some(100 * (i as i64 + 1)),
            })
            .collect();
        history_frame(&candles).unwrap()
    }

    fn params() -> SuperTrendParams {
        SuperTrendParams {
            lookback_periods: 2,
            multiplier: 1.0,
        }
    }

    #[test]
    fn test_default_retains_close() {
        let mut st = SuperTrend::new(source(), None);
        let df = st.calculate_per_security(params()).unwrap();
        assert_eq!(column_names(&df), vec!["date", "close", "super_trend", "upper", "lower"]);
        assert_eq!(df.height(), 5);

        let rows = frame_to_records(&df).unwrap();
        assert_eq!(rows[0]["date"], json!("2024-03-03"));
        assert_eq!(rows[0]["close"], json!(11.0));
        assert_eq!(rows[0]["lower"], json!(9.0));
        assert_eq!(rows[0]["upper"], serde_json::Value::Null);
        assert_eq!(rows[3]["super_trend"], json!(10.88));
        assert_eq!(rows[4]["super_trend"], json!(8.31));
    }

    #[test]
    fn test_retain_order_and_reserved_date() {
        let retain = vec!["volume".to_string(), "date".to_string(), "open".to_string()];
        let mut st = SuperTrend::new(source(), Some(retain.clone()));
        let df = st.calculate_per_security(params()).unwrap();
        assert_eq!(
            column_names(&df),
            vec!["date", "volume", "open", "super_trend", "upper", "lower"]
        );
        // caller's list is left as given
        assert_eq!(st.retain_source_column(), retain.as_slice());

        let rows = frame_to_records(&df).unwrap();
        assert_eq!(rows[2]["volume"], json!(500));
        assert_eq!(rows[2]["open"], json!(7.0));
    }

    #[test]
    fn test_retain_nothing() {
        let mut st = SuperTrend::new(source(), Some(vec![]));
        let df = st.calculate_per_security(params()).unwrap();
        assert_eq!(column_names(&df), vec!["date", "super_trend", "upper", "lower"]);
    }

    #[test]
    fn test_missing_retained_column() {
        let mut st = SuperTrend::new(source(), Some(vec!["adj_close".to_string()]));
        let err = st.calculate_per_security(params()).unwrap_err();
        assert!(matches!(err, AppError::Indicator(_)));
        assert!(err.to_string().contains("adj_close"));
    }

    #[test]
    fn test_mode_mismatch() {
        let mut single = SuperTrend::new(source(), None);
        let err = single.calculate_bulk(params()).unwrap_err();
        assert_eq!(err.to_string(), "found single security, use calculate_per_security instead");

        let mut frames = BTreeMap::new();
        frames.insert("INFY".to_string(), source());
        let mut bulk = SuperTrend::new(frames, None);
        let err = bulk.calculate_per_security(params()).unwrap_err();
        assert_eq!(err.to_string(), "found multiple securities, use calculate_bulk instead");
    }

    #[test]
    fn test_bulk_and_cache() {
        let mut frames = BTreeMap::new();
        frames.insert("INFY".to_string(), source());
        frames.insert("TCS".to_string(), source().head(Some(2)));
        let mut st = SuperTrend::new(frames, None);

        let result = st.calculate_bulk(params()).unwrap();
        assert_eq!(result["INFY"].height(), 5);
        assert_eq!(result["TCS"].height(), 0);

        // cached: different params do not recompute
        let again = st
            .calculate_bulk(SuperTrendParams { lookback_periods: 4, multiplier: 2.0 })
            .unwrap();
        assert_eq!(again["INFY"].height(), 5);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let mut st = SuperTrend::new(source(), None);
        let err = st
            .calculate_per_security(SuperTrendParams { lookback_periods: 0, multiplier: 3.0 })
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
