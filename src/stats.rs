//! Descriptive statistics used by every analysis stage.
//!
//! All functions reject empty input and non-finite values by returning
//! `None`; callers translate that into [`SpcError`](crate::SpcError) at the
//! public boundary.
//!
//! # Algorithms
//!
//! - **Mean**: Neumaier compensated summation.
//! - **Variance**: Welford's online algorithm with Bessel's correction.
//!   Reference: Welford (1962), *Technometrics* 4(3), pp. 419–420.

/// Arithmetic mean with compensated summation.
///
/// `None` if `data` is empty or contains NaN/Inf.
pub(crate) fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(neumaier_sum(data) / data.len() as f64)
}

/// Sample variance (denominator `n - 1`).
///
/// `None` if `data.len() < 2` or contains NaN/Inf. Identical values yield
/// exactly `0.0`.
pub(crate) fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    let mut count = 0.0_f64;
    let mut running_mean = 0.0_f64;
    let mut m2 = 0.0_f64;
    for &x in data {
        count += 1.0;
        let delta = x - running_mean;
        running_mean += delta / count;
        m2 += delta * (x - running_mean);
    }
    Some((m2 / (count - 1.0)).max(0.0))
}

/// Sample standard deviation, `sqrt(variance(data))`.
pub(crate) fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Range (`max - min`) of a non-empty finite slice.
pub(crate) fn range(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    Some(hi - lo)
}

/// Returns a sorted copy of finite data.
pub(crate) fn sorted(data: &[f64]) -> Vec<f64> {
    let mut x = data.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    x
}

/// Index of the first non-finite value, if any.
pub(crate) fn first_non_finite(data: &[f64]) -> Option<usize> {
    data.iter().position(|x| !x.is_finite())
}

// Neumaier variant of Kahan summation; also handles addends larger than
// the running sum.
fn neumaier_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}
