//! Small numeric helpers shared by the integrators, observers and tests.

/// Assert that the percentage deviation between two values is below a threshold
///
/// Handy for checking physical quantities where an absolute epsilon would
/// need rescaling for every magnitude.
///
/// # Examples
/// ```
/// use bioturbation::assert_deviation;
///
/// assert_deviation!(9.99, 10.0, 0.5);
/// ```
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.4}% >= {:.4}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.4}% >= {:.4}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Arithmetic mean of a slice
///
/// An empty slice has no mean and yields NaN, so an unpainted grid range
/// shows up as NaN in the layer series instead of a fabricated zero.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Difference between the largest and smallest value
///
/// Returns NaN when any value is NaN or the slice is empty.
pub fn spread(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    max - min
}

/// Percentage deviation of `actual` from `expected`
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}

/// Fractional change from `initial` to `current`, absolute when `initial` is zero
pub fn relative_drift(initial: f64, current: f64) -> f64 {
    let delta = (current - initial).abs();
    if initial.abs() < f64::EPSILON {
        delta
    } else {
        delta / initial.abs()
    }
}
