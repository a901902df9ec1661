//! Partitioning a measurement sequence into rational subgroups.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpcError};
use crate::stats;

/// Subgroup means and ranges for X-bar/R analysis.
///
/// # Invariants
///
/// - `x_bar.len() == r.len() == values.len() / size`
/// - every `r[i] >= 0`
///
/// Values after the last complete window are not part of any subgroup; their
/// count is kept in `excluded_tail` so reports can state it. Full-sample
/// statistics (mean, overall sigma) still use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgrouping {
    /// Subgroup means, in time order.
    pub x_bar: Vec<f64>,
    /// Subgroup ranges (`max - min`), in time order.
    pub r: Vec<f64>,
    /// Subgroup size.
    pub size: usize,
    /// Number of trailing values left out of the subgrouping.
    pub excluded_tail: usize,
}

impl Subgrouping {
    /// Number of complete subgroups.
    pub fn len(&self) -> usize {
        self.x_bar.len()
    }

    /// `true` when no complete subgroup exists.
    pub fn is_empty(&self) -> bool {
        self.x_bar.is_empty()
    }

    /// Grand mean `x̿` of the subgroup means.
    pub fn grand_mean(&self) -> Option<f64> {
        stats::mean(&self.x_bar)
    }

    /// Average range `R̄`.
    pub fn r_bar(&self) -> Option<f64> {
        stats::mean(&self.r)
    }
}

/// Splits `values` into consecutive, non-overlapping windows of `size`.
///
/// # Errors
///
/// - [`SpcError::UnsupportedSubgroupSize`] if `size < 2`.
/// - [`SpcError::NonFiniteMeasurement`] if any value is NaN or infinite.
///
/// An input shorter than `size` yields an empty subgrouping; callers that
/// need at least one subgroup check [`Subgrouping::is_empty`].
///
/// # Examples
///
/// ```
/// use u_spc::spc::build_subgroups;
///
/// let values = [1.0, 3.0, 2.0, 4.0, 6.0, 5.0, 9.0];
/// let sg = build_subgroups(&values, 3).unwrap();
/// assert_eq!(sg.x_bar, vec![2.0, 5.0]);
/// assert_eq!(sg.r, vec![2.0, 2.0]);
/// assert_eq!(sg.excluded_tail, 1); // the trailing 9.0
/// ```
pub fn build_subgroups(values: &[f64], size: usize) -> Result<Subgrouping> {
    if size < 2 {
        return Err(SpcError::UnsupportedSubgroupSize { size });
    }
    if let Some(index) = stats::first_non_finite(values) {
        return Err(SpcError::NonFiniteMeasurement { index });
    }

    let count = values.len() / size;
    let mut x_bar = Vec::with_capacity(count);
    let mut r = Vec::with_capacity(count);

    // chunks_exact drops the remainder, which is exactly the tail policy.
    for window in values.chunks_exact(size) {
        x_bar.push(stats::mean(window).ok_or(SpcError::insufficient("subgroup", size, 0))?);
        r.push(stats::range(window).ok_or(SpcError::insufficient("subgroup", size, 0))?);
    }

    Ok(Subgrouping {
        x_bar,
        r,
        size,
        excluded_tail: values.len() % size,
    })
}
