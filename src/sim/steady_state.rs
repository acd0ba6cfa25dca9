use crate::math_utils::spread;

/// True when every tracked value lies within `tol` of every other one.
///
/// The comparison is strict (`max - min < tol`). A NaN anywhere in `values`,
/// or an empty slice, is never steady.
pub fn is_steady(values: &[f64], tol: f64) -> bool {
    spread(values) < tol
}
