/// Quantile of already-sorted `values`, interpolating linearly between order statistics.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let position = q.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let weight = position - lower as f64;
            sorted[lower] * (1.0 - weight) + sorted[upper] * weight
        }
    }
}

/// Finite values of `values`, ascending.
pub(crate) fn sorted_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// 75th minus 25th percentile; `0.0` for an empty distribution.
pub fn iqr(values: &[f64]) -> f64 {
    let sorted = sorted_finite(values.iter().copied());
    if sorted.is_empty() {
        return 0.0;
    }
    quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25)
}

/// Bessel-corrected standard deviation, `None` below two samples.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile_sorted(&sorted, 0.25), 1.75);
        assert_relative_eq!(quantile_sorted(&sorted, 0.75), 3.25);
        assert_relative_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_relative_eq!(quantile_sorted(&sorted, 1.0), 4.0);
    }

    #[test]
    fn iqr_of_empty_or_single_value_is_zero() {
        assert_eq!(iqr(&[]), 0.0);
        assert_eq!(iqr(&[42.0]), 0.0);
    }

    #[test]
    fn iqr_ignores_order_and_nan() {
        assert_relative_eq!(iqr(&[4.0, f64::NAN, 1.0, 3.0, 2.0]), 1.5);
    }

    #[test]
    fn std_dev_uses_n_minus_one() {
        assert_relative_eq!(sample_std_dev(&[2.0, 4.0]).unwrap(), 2.0_f64.sqrt());
        assert!(sample_std_dev(&[5.0]).is_none());
    }
}
