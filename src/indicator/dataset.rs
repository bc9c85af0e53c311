//! "SuperTrend recent N" dataset
//!
//! Keeps the tickers whose SuperTrend stayed bullish (a defined `lower`
//! band) on each of the latest `recent_n` bars.

use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use super::super_trend::LOWER;
use crate::error::Result;
use crate::frame::DATE;

pub const TICKER: &str = "ticker";

/// Reshape bulk SuperTrend results into the recent-N dataset
///
/// Each surviving frame gains a `ticker` column right after `date` and
/// holds its latest `recent_n` rows, newest first. Tickers with no rows
/// are dropped as well.
pub fn recent_trend_dataset(
    results: BTreeMap<String, DataFrame>,
    recent_n: usize,
) -> Result<BTreeMap<String, DataFrame>> {
    let mut kept = BTreeMap::new();
    for (ticker, df) in results {
        // stable ascending sort then reverse: bars sharing a date stay in source order
        let mut df = df
            .sort([DATE], SortMultipleOptions::default().with_maintain_order(true))?
            .reverse();
        df = df.head(Some(recent_n));

        if df.height() == 0 {
            debug!("no rows for {}, removing it", ticker);
            continue;
        }
        if df.column(LOWER)?.null_count() > 0 {
            debug!("found null in {}, removing it", ticker);
            continue;
        }

        let tickers = Series::new(TICKER.into(), vec![ticker.as_str(); df.height()]);
        df.insert_column(1, tickers)?;
        kept.insert(ticker, df);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{column_names, date_series, frame_to_records};
    use chrono::NaiveDate;
    use serde_json::json;

    fn result_frame(lower: Vec<Option<f64>>) -> DataFrame {
        let n = lower.len();
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| NaiveDate::from_ymd_opt(2024, 5, 1 + i as u32).unwrap())
            .collect();
        let upper: Vec<Option<f64>> = lower.iter().map(|l| if l.is_some() { None } else { Some(99.0) }).collect();
        let st: Vec<Option<f64>> = lower.iter().zip(&upper).map(|(l, u)| l.or(*u)).collect();
        DataFrame::new(vec![
            date_series(DATE, &dates).unwrap().into(),
            Series::new("close".into(), vec![100.0; n]).into(),
            Series::new("super_trend".into(), st).into(),
            Series::new("upper".into(), upper).into(),
            Series::new("lower".into(), lower).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_keeps_consistently_bullish_tickers() {
        let mut results = BTreeMap::new();
        // bearish long ago, bullish for the last three bars
        results.insert("INFY".to_string(), result_frame(vec![None, Some(1.0), Some(2.0), Some(3.0)]));
        // turned bearish on the latest bar
        results.insert("TCS".to_string(), result_frame(vec![Some(1.0), Some(2.0), Some(3.0), None]));

        let kept = recent_trend_dataset(results, 3).unwrap();
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["INFY"]);

        let infy = &kept["INFY"];
        assert_eq!(infy.height(), 3);
        assert_eq!(
            column_names(infy),
            vec!["date", "ticker", "close", "super_trend", "upper", "lower"]
        );
        let rows = frame_to_records(infy).unwrap();
        assert_eq!(rows[0]["date"], json!("2024-05-04"));
        assert_eq!(rows[0]["ticker"], json!("INFY"));
        assert_eq!(rows[2]["date"], json!("2024-05-02"));
    }

    #[test]
    fn test_drops_empty_results() {
        let mut results = BTreeMap::new();
        results.insert("NEW".to_string(), result_frame(vec![]));
        assert!(recent_trend_dataset(results, 5).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_dates_keep_latest_bars() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let dates = [NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), day, day, day];
        let df = DataFrame::new(vec![
            date_series(DATE, &dates).unwrap().into(),
            Series::new("super_trend".into(), vec![1.0, 2.0, 3.0, 4.0]).into(),
            Series::new("upper".into(), vec![None::<f64>; 4]).into(),
            Series::new("lower".into(), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]).into(),
        ])
        .unwrap();
        let mut results = BTreeMap::new();
        results.insert("INFY".to_string(), df);

        let kept = recent_trend_dataset(results, 2).unwrap();
        let rows = frame_to_records(&kept["INFY"]).unwrap();
        assert_eq!(rows[0]["lower"], json!(4.0));
        assert_eq!(rows[1]["lower"], json!(3.0));
    }

    #[test]
    fn test_recent_n_larger_than_history() {
        let mut results = BTreeMap::new();
        results.insert("INFY".to_string(), result_frame(vec![Some(1.0), Some(2.0)]));
        let kept = recent_trend_dataset(results, 10).unwrap();
        assert_eq!(kept["INFY"].height(), 2);
    }
}
