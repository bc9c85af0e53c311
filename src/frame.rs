//! Tabular normalization of provider data
//!
//! Candles become a polars `DataFrame` keyed by a `date` column, and
//! frames are rendered back to row-major JSON for the API.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{AppError, Result};

pub const DATE: &str = "date";
pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One bar from the provider. Price fields may be missing on halted days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl Candle {
    pub fn is_complete(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some() && self.close.is_some()
    }
}

/// Columnar price inputs for indicator math
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quotes {
    pub dates: Vec<NaiveDate>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl Quotes {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

pub fn date_to_days(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Build a `Date` typed column from calendar dates
pub fn date_series(name: &str, dates: &[NaiveDate]) -> PolarsResult<Series> {
    let days: Vec<i32> = dates.iter().map(|d| date_to_days(*d)).collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// Normalize candles into `date, open, high, low, close, volume`
///
/// Incomplete bars are dropped and rows are ordered by date (stable for
/// repeated dates, which intraday intervals produce).
pub fn history_frame(candles: &[Candle]) -> PolarsResult<DataFrame> {
    let mut rows: Vec<&Candle> = candles.iter().filter(|c| c.is_complete()).collect();
    rows.sort_by_key(|c| c.date);

    let dates: Vec<NaiveDate> = rows.iter().map(|c| c.date).collect();
    let open: Vec<Option<f64>> = rows.iter().map(|c| c.open).collect();
    let high: Vec<Option<f64>> = rows.iter().map(|c| c.high).collect();
    let low: Vec<Option<f64>> = rows.iter().map(|c| c.low).collect();
    let close: Vec<Option<f64>> = rows.iter().map(|c| c.close).collect();
    let volume: Vec<Option<i64>> = rows.iter().map(|c| c.volume).collect();

    DataFrame::new(vec![
        date_series(DATE, &dates)?.into(),
        Series::new(OPEN.into(), open).into(),
        Series::new(HIGH.into(), high).into(),
        Series::new(LOW.into(), low).into(),
        Series::new(CLOSE.into(), close).into(),
        Series::new(VOLUME.into(), volume).into(),
    ])
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|c| c.to_string()).collect()
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    if !has_column(df, name) {
        return Err(AppError::Indicator(format!(
            "source data has no '{}' column",
            name
        )));
    }
    Ok(df.column(name)?)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = require_column(df, name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Read the dates of a frame's `date` column
pub fn date_values(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let series = require_column(df, DATE)?
        .as_materialized_series()
        .cast(&DataType::Int32)?;
    series
        .i32()?
        .into_iter()
        .map(|days| {
            days.and_then(days_to_date)
                .ok_or_else(|| AppError::Indicator("source data has a null date".to_string()))
        })
        .collect()
}

/// Extract the quote columns an indicator needs
pub fn quotes_from_frame(df: &DataFrame) -> Result<Quotes> {
    Ok(Quotes {
        dates: date_values(df)?,
        highs: f64_values(df, HIGH)?,
        lows: f64_values(df, LOW)?,
        closes: f64_values(df, CLOSE)?,
    })
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Float64(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::Float32(v) => Number::from_f64(v as f64).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::Date(days) => days_to_date(days)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

/// Row-major JSON rendering, column order preserved
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<Map<String, Value>>> {
    let columns = df.get_columns();
    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let mut row = Map::new();
        for column in columns {
            row.insert(column.name().to_string(), any_value_to_json(column.get(i)?));
        }
        rows.push(row);
    }
    Ok(rows)
}
