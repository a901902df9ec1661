//! Subgrouping and X-bar/R control charts.
//!
//! - [`build_subgroups`] — consecutive fixed-size windows with mean and range
//! - [`ControlConstantsTable`] — size-keyed A2, D3, D4, d2 factors
//! - [`ControlLimitCalculator`] — X-bar and R chart limits plus run-rule screening
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

mod chart;
mod constants;
mod limits;
mod rules;
mod subgroup;

pub use chart::{Chart, ChartLimits, ChartSignal, ControlLimits, RunRule};
pub use constants::{ControlConstants, ControlConstantsTable};
pub use limits::ControlLimitCalculator;
pub use subgroup::{build_subgroups, Subgrouping};
