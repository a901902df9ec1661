//! Control limit records for the X-bar and R charts.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use serde::{Deserialize, Serialize};

use super::constants::ControlConstants;

/// Upper control limit, center line, and lower control limit of one chart.
///
/// # Invariants
///
/// - `lcl <= cl <= ucl`
/// - All values are finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartLimits {
    /// Upper control limit.
    pub ucl: f64,
    /// Center line.
    pub cl: f64,
    /// Lower control limit.
    pub lcl: f64,
}

impl ChartLimits {
    /// `true` if `value` lies outside `[lcl, ucl]`.
    pub fn is_beyond(&self, value: f64) -> bool {
        value > self.ucl || value < self.lcl
    }
}

/// Which of the two charts a signal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Chart {
    XBar,
    Range,
}

/// Run rules screened on the subgroup statistics.
///
/// # Reference
///
/// Nelson, L.S. (1984). "The Shewhart Control Chart — Tests for Special Causes",
/// *Journal of Quality Technology* 16(4), pp. 237-239.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunRule {
    /// Point beyond the control limits (Nelson Rule 1).
    BeyondLimits,
    /// 9 points in a row on the same side of the center line (Nelson Rule 2).
    NineOneSide,
}

/// A subgroup that triggered a run rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSignal {
    pub chart: Chart,
    /// Zero-based subgroup index.
    pub subgroup: usize,
    pub rule: RunRule,
}

/// X-bar and R chart limits derived from one subgrouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Limits of the subgroup-mean chart.
    pub x_bar: ChartLimits,
    /// Limits of the subgroup-range chart.
    pub r: ChartLimits,
    /// Factors the limits were computed with.
    pub constants: ControlConstants,
    /// Run-rule signals on either chart, ordered by chart then subgroup.
    pub signals: Vec<ChartSignal>,
}

impl ControlLimits {
    /// `true` if no run rule fired on either chart.
    pub fn is_in_control(&self) -> bool {
        self.signals.is_empty()
    }
}
