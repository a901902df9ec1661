//! Normality assessment for capability studies.
//!
//! Capability indices assume an approximately normal process. The tester
//! picks the test by sample size:
//!
//! - 3 ≤ n ≤ 5000: Shapiro-Wilk (Royston 1992/1995, AS R94); normal iff
//!   `p >= alpha`.
//! - n > 5000: Anderson-Darling with the Stephens (1986) small-sample
//!   correction; normal iff `A*² <` the critical value at `alpha`.
//!
//! A non-normal, strictly positive sample gets a Box-Cox suggestion.
//!
//! # References
//!
//! - Shapiro & Wilk (1965). "An analysis of variance test for normality".
//!   Biometrika, 52(3–4), 591–611.
//! - Royston (1995). "Remark AS R94: A remark on Algorithm AS 181".
//!   Applied Statistics, 44(4), 547–551.
//! - Stephens (1986). "Tests based on EDF statistics". In D'Agostino &
//!   Stephens (Eds.), Goodness-of-Fit Techniques. Marcel Dekker.
//! - Box & Cox (1964). "An analysis of transformations". JRSS B, 26(2).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::check_alpha;
use crate::error::{Result, SpcError};
use crate::special::{inverse_normal_cdf, standard_normal_cdf};
use crate::stats;

/// Largest sample handled by Shapiro-Wilk.
pub const SHAPIRO_WILK_MAX_N: usize = 5000;

/// Which test produced a [`NormalityResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalityTest {
    ShapiroWilk,
    AndersonDarling,
}

/// Variance-stabilizing transform recommended for non-normal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformKind {
    BoxCox,
}

/// Outcome of a normality assessment.
///
/// For Shapiro-Wilk, `statistic` is W and `threshold` is the significance
/// level compared against `p_value`. For Anderson-Darling, `statistic` is
/// the corrected A*² and `threshold` is the critical value it is compared
/// against.
///
/// A sample with zero variance has no defined statistic: `statistic` and
/// `p_value` are NaN and `is_normal` is `false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalityResult {
    pub test: NormalityTest,
    pub statistic: f64,
    pub p_value: f64,
    pub threshold: f64,
    pub is_normal: bool,
    pub transform_suggested: Option<TransformKind>,
}

/// Normality tester with a configurable significance level.
///
/// # Examples
///
/// ```
/// use u_spc::normality::{NormalityTest, NormalityTester};
///
/// let data = [-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5];
/// let r = NormalityTester::default().test(&data).unwrap();
/// assert_eq!(r.test, NormalityTest::ShapiroWilk);
/// assert!(r.is_normal);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NormalityTester {
    alpha: f64,
}

impl Default for NormalityTester {
    fn default() -> Self {
        Self { alpha: 0.05 }
    }
}

impl NormalityTester {
    /// A tester at significance level `alpha`. The Anderson-Darling critical
    /// value is only tabulated for `alpha` in `[0.01, 0.15]`; levels outside
    /// that range use the nearest end of the table.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidConfig`] unless `0 < alpha < 1`.
    pub fn new(alpha: f64) -> Result<Self> {
        check_alpha(alpha)?;
        Ok(Self { alpha })
    }

    /// Runs the size-appropriate test.
    ///
    /// # Errors
    ///
    /// - [`SpcError::InsufficientData`] if `values.len() < 3`.
    /// - [`SpcError::NonFiniteMeasurement`] if a value is NaN or infinite.
    pub fn test(&self, values: &[f64]) -> Result<NormalityResult> {
        let n = values.len();
        if n < 3 {
            return Err(SpcError::insufficient("normality test", 3, n));
        }
        if let Some(index) = stats::first_non_finite(values) {
            return Err(SpcError::NonFiniteMeasurement { index });
        }

        let x = stats::sorted(values);
        let test = if n <= SHAPIRO_WILK_MAX_N {
            NormalityTest::ShapiroWilk
        } else {
            NormalityTest::AndersonDarling
        };

        let result = match test {
            NormalityTest::ShapiroWilk => match shapiro_wilk(&x) {
                Some((w, p)) => self.finish(test, w, p, self.alpha, p >= self.alpha, &x),
                None => self.degenerate(test, self.alpha),
            },
            NormalityTest::AndersonDarling => {
                let critical = ad_critical_value(self.alpha);
                match anderson_darling(&x) {
                    Some((a2_star, p)) => {
                        self.finish(test, a2_star, p, critical, a2_star < critical, &x)
                    }
                    None => self.degenerate(test, critical),
                }
            }
        };

        debug!(
            n,
            test = ?result.test,
            statistic = result.statistic,
            p_value = result.p_value,
            is_normal = result.is_normal,
            "normality assessed"
        );
        Ok(result)
    }

    fn finish(
        &self,
        test: NormalityTest,
        statistic: f64,
        p_value: f64,
        threshold: f64,
        is_normal: bool,
        sorted: &[f64],
    ) -> NormalityResult {
        // sorted[0] is the minimum.
        let transform_suggested = (!is_normal && sorted[0] > 0.0).then_some(TransformKind::BoxCox);
        NormalityResult {
            test,
            statistic,
            p_value,
            threshold,
            is_normal,
            transform_suggested,
        }
    }

    fn degenerate(&self, test: NormalityTest, threshold: f64) -> NormalityResult {
        NormalityResult {
            test,
            statistic: f64::NAN,
            p_value: f64::NAN,
            threshold,
            is_normal: false,
            transform_suggested: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Shapiro-Wilk (Royston AS R94)
// ---------------------------------------------------------------------------

// Royston polynomial coefficients (AS R94)
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Returns `(W, p)` for sorted data, `None` when all values are identical.
fn shapiro_wilk(x: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    let mean = stats::mean(x)?;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    if x[n - 1] - x[0] < 1e-300 || ss < 1e-300 {
        return None;
    }

    if n == 3 {
        // a = [1/sqrt(2), 0, -1/sqrt(2)]; exact p = 1 - (6/pi) acos(sqrt(W)).
        let num = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = (num * num / ss).clamp(0.75, 1.0);
        let p = 1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos();
        return Some((w, p.clamp(0.0, 1.0)));
    }

    let a = sw_coefficients(n)?;
    let sa: f64 = a
        .iter()
        .enumerate()
        .map(|(i, ai)| ai * (x[n - 1 - i] - x[i]))
        .sum();
    let w = sa * sa / ss;
    if !(0.0..=1.0 + 1e-10).contains(&w) {
        return None;
    }
    let w = w.min(1.0);
    Some((w, sw_p_value(w, n).clamp(0.0, 1.0)))
}

// Horner evaluation of c[0] + c[1] x + c[2] x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

// Half-vector of coefficients a[0..n/2] (antisymmetric; sign folded into the
// x[n-1-i] - x[i] difference).
fn sw_coefficients(n: usize) -> Option<Vec<f64>> {
    let half = n / 2;
    let nf = n as f64;

    // Blom approximation of expected normal order statistics, lower half
    // negated so that m[i] >= 0 for the largest order statistics.
    let m: Vec<f64> = (0..half)
        .map(|i| -inverse_normal_cdf((i as f64 + 1.0 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / nf.sqrt();

    let mut a: Vec<f64> = m.iter().map(|v| v / ssumm2).collect();
    let a1 = a[0] + poly(&SW_C1, rsn);

    // n = 4, 5 correct only the first coefficient; larger n also the second.
    let corrected = if n <= 5 { 1 } else { 2 };
    let (fac_sq, one_minus) = if corrected == 1 {
        (summ2 - 2.0 * m[0] * m[0], 1.0 - 2.0 * a1 * a1)
    } else {
        let a2 = a[1] + poly(&SW_C2, rsn);
        a[1] = a2;
        (
            summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1],
            1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2,
        )
    };
    if fac_sq <= 0.0 || one_minus <= 0.0 {
        return None;
    }
    let fac = (fac_sq / one_minus).sqrt();
    a[0] = a1;
    for (ai, mi) in a.iter_mut().zip(&m).skip(corrected) {
        *ai = mi / fac;
    }
    Some(a)
}

fn sw_p_value(w: f64, n: usize) -> f64 {
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();
    let nf = n as f64;

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let s = poly(&SW_C4, nf).exp();
        (y2 - poly(&SW_C3, nf)) / s
    } else {
        let ln_n = nf.ln();
        let s = poly(&SW_C6, ln_n).exp();
        (y - poly(&SW_C5, ln_n)) / s
    };
    1.0 - standard_normal_cdf(z)
}

// ---------------------------------------------------------------------------
// Anderson-Darling
// ---------------------------------------------------------------------------

/// Returns `(A*², p)` for sorted data, `None` for zero variance.
fn anderson_darling(x: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    let nf = n as f64;
    let mean = stats::mean(x)?;
    let sd = stats::std_dev(x)?;
    if sd < 1e-300 {
        return None;
    }

    let cdf = |v: f64| standard_normal_cdf((v - mean) / sd).clamp(1e-15, 1.0 - 1e-15);
    let s: f64 = (0..n)
        .map(|i| {
            let coeff = (2 * i + 1) as f64;
            coeff * (cdf(x[i]).ln() + (1.0 - cdf(x[n - 1 - i])).ln())
        })
        .sum();
    let a2 = -nf - s / nf;
    let a2_star = a2 * (1.0 + 0.75 / nf + 2.25 / (nf * nf));

    // D'Agostino & Stephens (1986) piecewise approximation.
    let p = if a2_star >= 0.6 {
        (1.2937 - 5.709 * a2_star + 0.0186 * a2_star * a2_star).exp()
    } else if a2_star > 0.34 {
        (0.9177 - 4.279 * a2_star - 1.38 * a2_star * a2_star).exp()
    } else if a2_star > 0.2 {
        1.0 - (-8.318 + 42.796 * a2_star - 59.938 * a2_star * a2_star).exp()
    } else {
        1.0 - (-13.436 + 101.14 * a2_star - 223.73 * a2_star * a2_star).exp()
    };
    Some((a2_star, p.clamp(0.0, 1.0)))
}

// Stephens (1986) Table 4.7, case 3 (mean and variance estimated):
// (alpha, critical A*²), alpha descending.
const AD_CRITICAL: [(f64, f64); 5] = [
    (0.15, 0.576),
    (0.10, 0.656),
    (0.05, 0.787),
    (0.025, 0.918),
    (0.01, 1.092),
];

/// Critical A*² at `alpha`, log-linear between tabulated levels and clamped
/// to the table ends.
fn ad_critical_value(alpha: f64) -> f64 {
    let (first, last) = (AD_CRITICAL[0], AD_CRITICAL[AD_CRITICAL.len() - 1]);
    if alpha.is_nan() || alpha >= first.0 {
        return first.1;
    }
    if alpha <= last.0 {
        return last.1;
    }
    for pair in AD_CRITICAL.windows(2) {
        let ((a_hi, c_hi), (a_lo, c_lo)) = (pair[0], pair[1]);
        if alpha <= a_hi && alpha >= a_lo {
            let t = (a_hi.ln() - alpha.ln()) / (a_hi.ln() - a_lo.ln());
            return c_hi + t * (c_lo - c_hi);
        }
    }
    last.1
}
