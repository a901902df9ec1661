//! Expected nonconformance and sigma quality level.
//!
//! Converts a process (mean, sigma) and a spec window into the expected
//! parts-per-million outside the window, and maps PPM onto the sigma quality
//! level using the standard 1.5-sigma shift convention:
//!
//! | Sigma | PPM (defects per million) |
//! |-------|--------------------------|
//! | 6.0   | 3.4                      |
//! | 4.0   | 6,210                    |
//! | 3.0   | 66,807                   |
//!
//! # References
//!
//! - Harry & Schroeder (2000), *Six Sigma: The Breakthrough Management
//!   Strategy Revolutionizing the World's Top Corporations*.
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Section 8.3.

use crate::measurement::SpecLimits;
use crate::special::{inverse_normal_cdf, standard_normal_cdf};

/// Expected PPM outside `[lsl, usl]` for a normal process.
///
/// ```text
/// PPM = 1,000,000 * (Phi((LSL - mean) / sigma) + Phi((mean - USL) / sigma))
/// ```
///
/// `None` if `sigma` is not positive and finite, or `mean` is not finite.
///
/// # Examples
///
/// ```
/// use u_spc::SpecLimits;
/// use u_spc::capability::expected_ppm;
///
/// // +/- 3 sigma window: ~2,700 PPM
/// let spec = SpecLimits::new(3.0, -3.0).unwrap();
/// let ppm = expected_ppm(0.0, 1.0, &spec).unwrap();
/// assert!((ppm - 2_699.8).abs() < 1.0);
/// ```
pub fn expected_ppm(mean: f64, sigma: f64, spec: &SpecLimits) -> Option<f64> {
    if !mean.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
        return None;
    }
    let below = standard_normal_cdf((spec.lsl - mean) / sigma);
    let above = standard_normal_cdf((mean - spec.usl) / sigma);
    Some(1_000_000.0 * (below + above))
}

/// Converts a sigma quality level to PPM, `1e6 * (1 - Phi(sigma - 1.5))`.
///
/// # Examples
///
/// ```
/// use u_spc::capability::sigma_to_ppm;
///
/// assert!((sigma_to_ppm(6.0) - 3.4).abs() < 1.0);
/// ```
pub fn sigma_to_ppm(sigma: f64) -> f64 {
    1_000_000.0 * standard_normal_cdf(1.5 - sigma)
}

/// Converts PPM to a sigma quality level, `Phi_inv(1 - PPM / 1e6) + 1.5`.
///
/// `None` for PPM outside `(0, 1_000_000)` or NaN. A process with zero
/// expected defects has no finite sigma level.
///
/// # Examples
///
/// ```
/// use u_spc::capability::ppm_to_sigma;
///
/// let sigma = ppm_to_sigma(66_807.0).unwrap();
/// assert!((sigma - 3.0).abs() < 0.01);
/// ```
pub fn ppm_to_sigma(ppm: f64) -> Option<f64> {
    if ppm.is_nan() || ppm <= 0.0 || ppm >= 1_000_000.0 {
        return None;
    }
    let z = inverse_normal_cdf(1.0 - ppm / 1_000_000.0);
    z.is_finite().then_some(z + 1.5)
}
