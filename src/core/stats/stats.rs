//! Descriptive statistics and error measures shared by the baseline
//! predictors and the evaluator.

// ============================================================================
// Means
// ============================================================================

/// Arithmetic mean. Returns NaN for an empty slice.
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Weighted mean `sum(x * w) / sum(w)`.
///
/// The slices must have the same length. Returns NaN when the weights sum
/// to zero or the input is empty.
pub fn weighted_mean(x: &[f64], w: &[f64]) -> f64 {
    assert_eq!(x.len(), w.len(), "value and weight lengths differ");

    let mut numer = 0.0;
    let mut denom = 0.0;
    for (&xv, &wv) in x.iter().zip(w) {
        numer += xv * wv;
        denom += wv;
    }

    if denom == 0.0 {
        return f64::NAN;
    }
    numer / denom
}

/// Linearly increasing weights `(i + 1) / n` for `i` in `0..n`.
///
/// The first (oldest) entry is `1/n` and the last (most recent) is exactly 1.
pub fn linear_ramp(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64 / n as f64).collect()
}

// ============================================================================
// Pointwise error measures
// ============================================================================

/// Mean of squared differences between two equally long slices
pub fn mean_squared_error(predicted: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(predicted.len(), actual.len(), "length mismatch");
    if predicted.is_empty() {
        return f64::NAN;
    }

    let sum: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| {
            let diff = p - a;
            diff * diff
        })
        .sum();
    sum / predicted.len() as f64
}

/// Mean of absolute differences between two equally long slices
pub fn mean_absolute_error(predicted: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(predicted.len(), actual.len(), "length mismatch");
    if predicted.is_empty() {
        return f64::NAN;
    }

    let sum: f64 = predicted.iter().zip(actual).map(|(p, a)| (p - a).abs()).sum();
    sum / predicted.len() as f64
}

pub fn find_min_max(data: &[f64]) -> (f64, f64) {
    let mut min_val = f64::INFINITY;
    let mut max_val = f64::NEG_INFINITY;

    for &val in data {
        if val < min_val {
            min_val = val;
        }
        if val > max_val {
            max_val = val;
        }
    }

    (min_val, max_val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_weighted_mean_normalises_by_weight_sum() {
        let x = [10.0, 20.0];
        let w = [1.0, 3.0];
        assert!((weighted_mean(&x, &w) - 17.5).abs() < 1e-12);

        // Scaling every weight leaves the result unchanged
        let w2 = [0.25, 0.75];
        assert!((weighted_mean(&x, &w2) - 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_linear_ramp() {
        let w = linear_ramp(4);
        assert_eq!(w, vec![0.25, 0.5, 0.75, 1.0]);
        assert!(w.windows(2).all(|p| p[1] > p[0]));

        let w = linear_ramp(80);
        assert!((w[0] - 1.0 / 80.0).abs() < 1e-15);
        assert_eq!(w[79], 1.0);
    }

    #[test]
    fn test_mse_of_identical_series_is_zero() {
        let x = [3.5, -1.0, 7.25, 100.0];
        assert_eq!(mean_squared_error(&x, &x), 0.0);
        assert_eq!(mean_absolute_error(&x, &x), 0.0);
    }

    #[test]
    fn test_mse_and_mae() {
        let pred = [2.0, 3.0];
        let actual = [4.0, 5.0];
        assert!((mean_squared_error(&pred, &actual) - 4.0).abs() < 1e-12);
        assert!((mean_absolute_error(&pred, &actual) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_find_min_max() {
        let (lo, hi) = find_min_max(&[3.0, -2.0, 8.5, 0.0]);
        assert_eq!(lo, -2.0);
        assert_eq!(hi, 8.5);
    }
}
