//! SuperTrend validation against hand-derived series
//!
//! Run with: cargo test --test super_trend_validation
//!
//! Fixtures use constant bar ranges so ATR is exact and every band value
//! can be worked out on paper.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use factor_investing::frame::{column_names, frame_to_records, history_frame, Candle};
use factor_investing::*;
use serde_json::json;
use std::collections::BTreeMap;

fn ramp(n: usize, step: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let highs: Vec<f64> = (0..n).map(|i| 100.0 + step * i as f64).collect();
    let lows: Vec<f64> = highs.iter().map(|h| h - 2.0).collect();
    // close sits half a point inside the bar, on the side the ramp moves to
    let closes: Vec<f64> = if step >= 0.0 {
        highs.iter().map(|h| h - 0.5).collect()
    } else {
        lows.iter().map(|l| l + 0.5).collect()
    };
    (highs, lows, closes)
}

fn candles(dates: &[NaiveDate], highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<Candle> {
    dates
        .iter()
        .enumerate()
        .map(|(i, d)| Candle {
            date: *d,
            open: Some(closes[i]),
            high: Some(highs[i]),
            low: Some(lows[i]),
            close: Some(closes[i]),
            volume: Some(1_000 + i as i64),
        })
        .collect()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

#[test]
fn test_atr_seed_is_mean_true_range() {
    let highs = vec![10.0, 11.0, 12.0, 13.0, 11.0, 9.0, 13.0];
    let lows = vec![8.0, 9.0, 10.0, 11.0, 7.0, 7.0, 11.0];
    let closes = vec![9.0, 10.0, 11.0, 12.5, 7.5, 8.5, 12.9];

    let tr = true_range(&highs, &lows, &closes);
    let values = atr(&highs, &lows, &closes, 3);
    assert!(values[..3].iter().all(|v| v.is_nan()));
    assert_relative_eq!(values[3], (tr[1] + tr[2] + tr[3]) / 3.0);
    assert_relative_eq!(values[4], values[3] + (tr[4] - values[3]) / 3.0);
}

#[test]
fn test_flat_market_holds_lower_band() {
    let n = 20;
    let highs = vec![11.0; n];
    let lows = vec![9.0; n];
    let closes = vec![10.0; n];

    // TR = 2, so the bands sit 3 * 2 around the midpoint of 10
    let st = super_trend(&highs, &lows, &closes, 3, 3.0);
    for i in 3..n {
        assert_relative_eq!(st.super_trend[i], 4.0);
        assert_relative_eq!(st.lower_band[i], 4.0);
        assert!(st.upper_band[i].is_nan());
    }
}

#[test]
fn test_uptrend_lower_band_trails_price() {
    let (highs, lows, closes) = ramp(30, 1.0);
    let st = super_trend(&highs, &lows, &closes, 3, 1.0);

    for i in 3..30 {
        // mid = 99 + i, ATR = 2
        assert_relative_eq!(st.lower_band[i], 97.0 + i as f64);
        assert_relative_eq!(st.super_trend[i], st.lower_band[i]);
        assert!(st.upper_band[i].is_nan());
    }
}

#[test]
fn test_downtrend_upper_band_trails_price() {
    let (highs, lows, closes) = ramp(30, -1.0);
    let st = super_trend(&highs, &lows, &closes, 3, 1.0);

    for i in 3..30 {
        // mid = 99 - i, ATR = 2
        assert_relative_eq!(st.upper_band[i], 101.0 - i as f64);
        assert_relative_eq!(st.super_trend[i], st.upper_band[i]);
        assert!(st.lower_band[i].is_nan());
    }
}

#[test]
fn test_repeated_dates_keep_row_alignment() {
    let highs = [10.0, 11.0, 12.0, 13.0, 11.0, 9.0, 13.0];
    let lows = [8.0, 9.0, 10.0, 11.0, 7.0, 7.0, 11.0];
    let closes = [9.0, 10.0, 11.0, 12.5, 7.5, 8.5, 12.9];
    // two bars per date, as intraday intervals produce
    let dates = [day(1), day(1), day(2), day(2), day(3), day(3), day(4)];
    let df = history_frame(&candles(&dates, &highs, &lows, &closes)).unwrap();

    let mut indicator = SuperTrend::new(df, None);
    let result = indicator
        .calculate_per_security(SuperTrendParams { lookback_periods: 2, multiplier: 1.0 })
        .unwrap();

    assert_eq!(result.height(), 5);
    let rows = frame_to_records(&result).unwrap();
    let retained: Vec<_> = rows.iter().map(|r| r["close"].clone()).collect();
    assert_eq!(retained, vec![json!(11.0), json!(12.5), json!(7.5), json!(8.5), json!(12.9)]);
    assert_eq!(rows[2]["upper"], json!(12.75));
    assert_eq!(rows[2]["date"], json!("2024-04-03"));
}

#[test]
fn test_bulk_matches_per_security() {
    let (highs, lows, closes) = ramp(15, 1.0);
    let dates: Vec<NaiveDate> = (1..=15).map(day).collect();
    let df = history_frame(&candles(&dates, &highs, &lows, &closes)).unwrap();
    let params = SuperTrendParams { lookback_periods: 5, multiplier: 2.0 };
    let retain = Some(vec!["high".to_string(), "low".to_string()]);

    let mut single = SuperTrend::new(df.clone(), retain.clone());
    let expected = single.calculate_per_security(params).unwrap();

    let mut frames = BTreeMap::new();
    frames.insert("TCS".to_string(), df.clone());
    frames.insert("INFY".to_string(), df);
    let mut bulk = SuperTrend::new(frames, retain);
    let results = bulk.calculate_bulk(params).unwrap();

    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["INFY", "TCS"]);
    for frame in results.values() {
        assert_eq!(
            column_names(frame),
            vec!["date", "high", "low", "super_trend", "upper", "lower"]
        );
        assert!(frame.equals_missing(&expected));
    }
    assert_eq!(expected.height(), 10);
}

#[test]
fn test_recent_dataset_over_bulk_results() {
    let dates: Vec<NaiveDate> = (1..=20).map(day).collect();
    let (uh, ul, uc) = ramp(20, 1.0);
    let (dh, dl, dc) = ramp(20, -1.0);

    let mut frames = BTreeMap::new();
    frames.insert("UP".to_string(), history_frame(&candles(&dates, &uh, &ul, &uc)).unwrap());
    frames.insert("DOWN".to_string(), history_frame(&candles(&dates, &dh, &dl, &dc)).unwrap());

    let mut indicator = SuperTrend::new(frames, None);
    let results = indicator.calculate_bulk(SuperTrendParams::default()).unwrap();
    let dataset = recent_trend_dataset(results, 3).unwrap();

    assert_eq!(dataset.keys().collect::<Vec<_>>(), vec!["UP"]);
    let up = &dataset["UP"];
    assert_eq!(up.height(), 3);
    assert_eq!(column_names(up)[..2], ["date".to_string(), "ticker".to_string()]);
    let rows = frame_to_records(up).unwrap();
    assert_eq!(rows[0]["date"], json!("2024-04-20"));
    assert_eq!(rows[0]["ticker"], json!("UP"));
}
