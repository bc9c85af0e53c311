//! Volatility indicators
//!
//! Range measures that feed the band-based trend indicators.

use crate::common::nan_vec;
use crate::moving_averages::wilders_ma;

/// True Range
///
/// The greatest of:
/// - Current High - Current Low
/// - |Current High - Previous Close|
/// - |Current Low - Previous Close|
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    let n = highs.len();
    if n != lows.len() || n != closes.len() {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);

    // First value is NaN (needs previous close)
    for i in 1..n {
        let h_l = highs[i] - lows[i];
        let h_c = (highs[i] - closes[i - 1]).abs();
        let l_c = (lows[i] - closes[i - 1]).abs();
        result[i] = h_l.max(h_c).max(l_c);
    }
    result
}

/// ATR - Average True Range
///
/// Wilder's smoothing over true range. The first defined value sits at
/// index `period`.
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<f64> {
    let tr = true_range(highs, lows, closes);
    wilders_ma(&tr, period)
}
