//! Trend indicators
//!
//! ATR band based trend following.

use crate::common::nan_vec;
use crate::volatility::atr;

/// Output of [`super_trend`]. Every vector has the input length.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTrendSeries {
    pub super_trend: Vec<f64>,
    /// Defined only on bearish bars
    pub upper_band: Vec<f64>,
    /// Defined only on bullish bars
    pub lower_band: Vec<f64>,
}

impl SuperTrendSeries {
    fn empty(n: usize) -> Self {
        Self {
            super_trend: nan_vec(n),
            upper_band: nan_vec(n),
            lower_band: nan_vec(n),
        }
    }

    pub fn len(&self) -> usize {
        self.super_trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.super_trend.is_empty()
    }

    /// Indices of rows that carry at least one value (warm-up rows dropped)
    pub fn condensed_rows(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| {
                !self.super_trend[i].is_nan()
                    || !self.upper_band[i].is_nan()
                    || !self.lower_band[i].is_nan()
            })
            .collect()
    }
}

/// SuperTrend
///
/// Determines the primary trend of closes from ATR band thresholds. The
/// active band acts as a trailing stop and flips when price crosses it.
///
/// Formula:
/// - Mid = (High + Low) / 2
/// - Upper = Mid + Multiplier * ATR, only allowed to tighten while price stays below it
/// - Lower = Mid - Multiplier * ATR, only allowed to tighten while price stays above it
/// - Bearish when Close <= active band, else bullish
///
/// The first `lookback_periods` bars are warm-up and stay NaN. Bands are
/// seeded on the first bar with a defined ATR, later than that when the
/// warm-up window holds a missing bar.
pub fn super_trend(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    lookback_periods: usize,
    multiplier: f64,
) -> SuperTrendSeries {
    let n = closes.len();
    let mut result = SuperTrendSeries::empty(n);
    if highs.len() != n || lows.len() != n || lookback_periods == 0 || n <= lookback_periods {
        return result;
    }

    let atr_values = atr(highs, lows, closes, lookback_periods);

    let mut seeded = false;
    let mut bullish = true;
    let mut upper = f64::NAN;
    let mut lower = f64::NAN;

    for i in lookback_periods..n {
        let range = atr_values[i];
        if range.is_nan() {
            continue;
        }

        let mid = (highs[i] + lows[i]) / 2.0;
        let prev_close = closes[i - 1];
        let upper_eval = mid + multiplier * range;
        let lower_eval = mid - multiplier * range;

        if !seeded {
            bullish = closes[i] >= mid;
            upper = upper_eval;
            lower = lower_eval;
            seeded = true;
        }

        if upper_eval < upper || prev_close > upper {
            upper = upper_eval;
        }
        if lower_eval > lower || prev_close < lower {
            lower = lower_eval;
        }

        let active = if bullish { lower } else { upper };
        if closes[i] <= active {
            result.super_trend[i] = upper;
            result.upper_band[i] = upper;
            bullish = false;
        } else {
            result.super_trend[i] = lower;
            result.lower_band[i] = lower;
            bullish = true;
        }
    }

    result
}
