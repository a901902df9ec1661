//! X-bar/R control limit calculation.
//!
//! # Algorithm
//!
//! 1. Grand mean `x̿` of the subgroup means and average range `R̄`.
//! 2. X-bar chart: `CL = x̿`, `UCL/LCL = x̿ ± A2 · R̄`.
//! 3. R chart: `CL = R̄`, `UCL = D4 · R̄`, `LCL = D3 · R̄`.
//!
//! # Reference
//!
//! Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.,
//! Chapter 6: Control Charts for Variables.

use tracing::debug;

use super::chart::{Chart, ChartLimits, ControlLimits};
use super::constants::ControlConstantsTable;
use super::rules;
use super::subgroup::Subgrouping;
use crate::error::{Result, SpcError};

/// Derives X-bar and R chart limits from a [`Subgrouping`].
///
/// # Examples
///
/// ```
/// use u_spc::spc::{build_subgroups, ControlConstantsTable, ControlLimitCalculator};
///
/// let table = ControlConstantsTable::standard();
/// let sg = build_subgroups(&[45.0, 47.0, 50.0, 53.0, 55.0], 5).unwrap();
/// let limits = ControlLimitCalculator::new(&table).calculate(&sg).unwrap();
///
/// // UCL = 50 + 0.577 * 10
/// assert!((limits.x_bar.ucl - 55.77).abs() < 1e-9);
/// assert_eq!(limits.r.lcl, 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ControlLimitCalculator<'a> {
    table: &'a ControlConstantsTable,
}

impl<'a> ControlLimitCalculator<'a> {
    pub fn new(table: &'a ControlConstantsTable) -> Self {
        Self { table }
    }

    /// Computes limits and screens the subgroup statistics against them.
    ///
    /// # Errors
    ///
    /// - [`SpcError::UnsupportedSubgroupSize`] if the table has no entry for
    ///   `subgrouping.size`.
    /// - [`SpcError::InsufficientData`] if the subgrouping is empty.
    pub fn calculate(&self, subgrouping: &Subgrouping) -> Result<ControlLimits> {
        let constants = self.table.get(subgrouping.size)?;

        let not_enough = || SpcError::insufficient("control limits", subgrouping.size, 0);
        let grand_mean = subgrouping.grand_mean().ok_or_else(not_enough)?;
        let r_bar = subgrouping.r_bar().ok_or_else(not_enough)?;

        let x_bar = ChartLimits {
            ucl: grand_mean + constants.a2 * r_bar,
            cl: grand_mean,
            lcl: grand_mean - constants.a2 * r_bar,
        };
        let r = ChartLimits {
            ucl: constants.d4 * r_bar,
            cl: r_bar,
            lcl: constants.d3 * r_bar,
        };

        let mut signals = rules::screen(Chart::XBar, &subgrouping.x_bar, &x_bar);
        signals.extend(rules::screen(Chart::Range, &subgrouping.r, &r));

        debug!(
            size = subgrouping.size,
            subgroups = subgrouping.len(),
            grand_mean,
            r_bar,
            signals = signals.len(),
            "control limits computed"
        );

        Ok(ControlLimits {
            x_bar,
            r,
            constants,
            signals,
        })
    }
}
