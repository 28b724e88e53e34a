//! Tolerance-based floating point comparison.

use num_traits::Float;

/// Default relative tolerance for [`float_cmp`].
pub const DEFAULT_RTOL: f64 = 1e-14;
/// Default absolute tolerance for [`float_cmp`].
pub const DEFAULT_ATOL: f64 = 1e-14;

/// `|x - y| <= atol + |y| * rtol`.
///
/// The comparison is not symmetric: `y` is the reference value.
#[inline]
pub fn float_cmp<T: Float>(x: T, y: T, rtol: T, atol: T) -> bool {
    (x - y).abs() <= atol + y.abs() * rtol
}

/// [`float_cmp`] over every component of two equally long slices.
pub fn float_cmp_all<T: Float>(x: &[T], y: &[T], rtol: T, atol: T) -> bool {
    x.len() == y.len() && x.iter().zip(y).all(|(&a, &b)| float_cmp(a, b, rtol, atol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scales_relative_tolerance() {
        assert!(float_cmp(1.0 + 1e-10, 1.0, 1e-9, 0.0));
        assert!(!float_cmp(1.0 + 1e-8, 1.0, 1e-9, 0.0));
        assert!(float_cmp(1e-15, 0.0, 0.0, DEFAULT_ATOL));
    }

    #[test]
    fn all_requires_equal_length() {
        assert!(!float_cmp_all(&[1.0], &[1.0, 2.0], 0.0, 0.0));
        assert!(float_cmp_all(&[1.0, 2.0], &[1.0, 2.0], 0.0, 0.0));
    }
}
