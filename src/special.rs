//! Standard normal distribution functions backed by `statrs`.

use statrs::function::erf;

/// Standard normal CDF, `Φ(z) = erfc(-z / √2) / 2`.
pub(crate) fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erf::erfc(-z / std::f64::consts::SQRT_2)
}

/// Standard normal quantile, `Φ⁻¹(p) = -√2 · erfc⁻¹(2p)`.
///
/// Returns `±∞` at `p = 0` and `p = 1`, NaN outside `[0, 1]`.
pub(crate) fn inverse_normal_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -std::f64::consts::SQRT_2 * erf::erfc_inv(2.0 * p)
}
