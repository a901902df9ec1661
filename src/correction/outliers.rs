//! Z-score outlier flags.
//!
//! A value is flagged when `|value - mean| > threshold * s`, with `s` the
//! sample standard deviation (divisor n - 1). Flags are advisory: the
//! flagged values stay in the sequence and in every statistic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::check_positive;
use crate::error::{Result, SpcError};
use crate::stats;

/// Default outlier threshold in standard deviations.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

/// A value that lies too far from the sample mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFlag {
    /// Index into the analysed sequence.
    pub index: usize,
    /// The flagged value.
    pub value: f64,
    /// `(value - mean) / s`; the sign tells the side.
    pub z_score: f64,
}

/// Flags values more than `threshold` sample standard deviations from the
/// mean, in index order.
///
/// A sample with zero variance has no outliers.
///
/// # Errors
///
/// - [`SpcError::InvalidConfig`] if `threshold` is not a positive number.
/// - [`SpcError::InsufficientData`] if `values.len() < 2`.
/// - [`SpcError::NonFiniteMeasurement`] if a value is NaN or infinite.
///
/// # Examples
///
/// ```
/// use u_spc::correction::detect_outliers;
///
/// let mut values = vec![10.0; 19];
/// values.push(50.0);
/// let flags = detect_outliers(&values, 3.0).unwrap();
/// assert_eq!(flags.len(), 1);
/// assert_eq!(flags[0].index, 19);
/// ```
pub fn detect_outliers(values: &[f64], threshold: f64) -> Result<Vec<OutlierFlag>> {
    check_positive("outlier_threshold", threshold)?;
    if values.len() < 2 {
        return Err(SpcError::insufficient("outlier detection", 2, values.len()));
    }
    if let Some(index) = stats::first_non_finite(values) {
        return Err(SpcError::NonFiniteMeasurement { index });
    }
    let not_enough = || SpcError::insufficient("outlier detection", 2, values.len());
    let mean = stats::mean(values).ok_or_else(not_enough)?;
    let sd = stats::std_dev(values).ok_or_else(not_enough)?;

    if sd == 0.0 {
        return Ok(Vec::new());
    }

    let flags: Vec<OutlierFlag> = values
        .iter()
        .enumerate()
        .filter(|(_, &v)| (v - mean).abs() > threshold * sd)
        .map(|(index, &value)| OutlierFlag {
            index,
            value,
            z_score: (value - mean) / sd,
        })
        .collect();

    debug!(n = values.len(), mean, sd, threshold, flagged = flags.len(), "outlier scan");
    Ok(flags)
}
