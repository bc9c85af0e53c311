//! Common utilities shared across indicator and pipeline modules

/// Initialize a result vector with NaN values
#[inline]
pub fn nan_vec(len: usize) -> Vec<f64> {
    vec![f64::NAN; len]
}

/// Check if we have enough data for the given period
#[inline]
pub fn has_enough_data(len: usize, period: usize) -> bool {
    len >= period && period > 0
}

/// Round to a fixed number of decimals, NaN stays NaN
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if value.is_nan() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Map NaN to `None` for table/JSON output
#[inline]
pub fn nan_to_option(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Split `items` into consecutive batches of `batch_size` (last one may be shorter)
pub fn create_batches<T: Clone>(items: &[T], batch_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nan_vec() {
        let v = nan_vec(5);
        assert_eq!(v.len(), 5);
        assert!(v.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn test_has_enough_data() {
        assert!(has_enough_data(10, 10));
        assert!(!has_enough_data(9, 10));
        assert!(!has_enough_data(10, 0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.235001, 2), 1.24);
        assert_eq!(round_to(-7.777, 1), -7.8);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_nan_to_option() {
        assert_eq!(nan_to_option(2.5), Some(2.5));
        assert_eq!(nan_to_option(f64::NAN), None);
    }

    #[test]
    fn test_create_batches() {
        let batches = create_batches(&[1, 2, 3, 4, 5], 2);
        assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert!(create_batches::<i32>(&[], 3).is_empty());
        assert_eq!(create_batches(&[1, 2], 0), vec![vec![1], vec![2]]);
    }

    proptest! {
        #[test]
        fn batches_preserve_order_and_size(items in proptest::collection::vec(any::<u16>(), 0..200), size in 1usize..30) {
            let batches = create_batches(&items, size);
            prop_assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
            let flat: Vec<u16> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flat, items);
        }
    }
}
