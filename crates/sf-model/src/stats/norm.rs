//! Normal distribution truncated to a bounded interval.

use statrs::function::erf::erf;
use std::f64::consts::{PI, SQRT_2};

/// Standard normal log-density at `z`.
pub fn standard_ln_pdf(z: f64) -> f64 {
    -0.5 * z * z - 0.5 * (2.0 * PI).ln()
}

/// Standard normal CDF at `z`.
pub fn standard_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Log-PDF of `N(mu, sigma)` truncated to `[a, b]`.
///
/// Returns `nil` outside the support. `sigma > 0` and `a < b` are the
/// caller's responsibility.
pub fn ln_pdf_truncated(x: f64, mu: f64, sigma: f64, a: f64, b: f64, nil: f64) -> f64 {
    debug_assert!(a < b);
    debug_assert!(sigma > 0.0);
    if !(a <= x && x <= b) {
        return nil;
    }
    let inv_sigma = 1.0 / sigma;
    let z = (x - mu) * inv_sigma;

    // Normalization Z = Phi(z_b) - Phi(z_a).
    let mut norm = standard_cdf((b - mu) * inv_sigma) - standard_cdf((a - mu) * inv_sigma);
    if !norm.is_finite() || norm <= 0.0 {
        // Underflow/degenerate: keep the value finite; this corresponds to
        // extreme truncation.
        norm = f64::MIN_POSITIVE;
    }

    standard_ln_pdf(z) - sigma.ln() - norm.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wide_bounds_match_untruncated_density() {
        // With bounds far in the tails the normalization is ~1.
        let lp = ln_pdf_truncated(0.3, 0.0, 1.0, -50.0, 50.0, f64::NEG_INFINITY);
        let expected = -0.5 * 0.3f64 * 0.3 - 0.5 * (2.0 * PI).ln();
        assert_relative_eq!(lp, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_truncation_raises_density() {
        let wide = ln_pdf_truncated(0.0, 0.0, 1.0, -50.0, 50.0, f64::NEG_INFINITY);
        let narrow = ln_pdf_truncated(0.0, 0.0, 1.0, -1.0, 1.0, f64::NEG_INFINITY);
        assert!(narrow > wide);
    }

    #[test]
    fn test_symmetric_truncation_normalizes() {
        // For mu centered in [a, b], Z = 2 * Phi(z_b) - 1.
        let lp = ln_pdf_truncated(0.5, 0.5, 2.0, -1.5, 2.5, f64::NEG_INFINITY);
        let z_b = (2.5 - 0.5) / 2.0;
        let norm = 2.0 * standard_cdf(z_b) - 1.0;
        let expected = standard_ln_pdf(0.0) - 2.0f64.ln() - norm.ln();
        assert_relative_eq!(lp, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds_is_nil() {
        assert_eq!(ln_pdf_truncated(3.0, 0.0, 1.0, -1.0, 1.0, f64::NEG_INFINITY), f64::NEG_INFINITY);
    }
}
