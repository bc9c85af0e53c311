//! Moving averages
//!
//! Smoothing used by the volatility indicators.

use crate::common::{has_enough_data, nan_vec};

/// Wilder's Moving Average (used in RSI and ATR)
///
/// Formula: WMA = Previous WMA + (Value - Previous WMA) / Period
///
/// Seeded with the SMA of the first `period` non-NaN values, so a series
/// with a NaN prefix (like true range) starts one bar later.
pub fn wilders_ma(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    if !has_enough_data(n, period) {
        return nan_vec(n);
    }

    let mut result = nan_vec(n);

    let mut first_valid = 0;
    while first_valid < n && values[first_valid].is_nan() {
        first_valid += 1;
    }

    if first_valid + period > n {
        return result;
    }

    let first_sma: f64 = values[first_valid..(first_valid + period)].iter().sum::<f64>() / period as f64;
    let start_idx = first_valid + period - 1;
    result[start_idx] = first_sma;

    let alpha = 1.0 / period as f64;
    for i in (start_idx + 1)..n {
        if values[i].is_nan() {
            result[i] = result[i - 1];
            continue;
        }
        if result[i - 1].is_nan() {
            result[i] = values[i];
        } else {
            result[i] = result[i - 1] + alpha * (values[i] - result[i - 1]);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wilders_ma_seed_and_smoothing() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = wilders_ma(&values, 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_relative_eq!(result[2], 2.0);
        // 2 + (4 - 2) / 3
        assert_relative_eq!(result[3], 2.0 + 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wilders_ma_skips_nan_prefix() {
        let values = vec![f64::NAN, 3.0, 3.0, 6.0];
        let result = wilders_ma(&values, 2);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_relative_eq!(result[2], 3.0);
        assert_relative_eq!(result[3], 4.5);
    }

    #[test]
    fn test_wilders_ma_insufficient_data() {
        let result = wilders_ma(&[1.0, 2.0], 3);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
