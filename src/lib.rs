//! # u-spc
//!
//! Statistical process control for digitized inspection measurements.
//!
//! Turns a [`MeasurementSet`] (readings plus a spec window) into the
//! evidence used to certify a process: corrected values, subgroup
//! statistics, capability indices with a pass/fail verdict, X̄-R control
//! limits, and a normality assessment.
//!
//! ## Modules
//!
//! - [`correction`] — Outlier flags and corrections for acquisition errors
//! - [`spc`] — Subgrouping, control-chart constants, X̄-R limits with run rules
//! - [`capability`] — Process capability indices (Cp, Cpk, Pp, Ppk, Cpm) and PPM
//! - [`normality`] — Shapiro-Wilk and Anderson-Darling tests
//! - [`pipeline`] — One-pass analysis producing an [`AnalysisReport`]
//! - [`config`] — Tunable thresholds, loadable from TOML
//!
//! ## Design Philosophy
//!
//! - **No fabricated data**: corrections keep the original value, and
//!   ambiguous readings are reported instead of guessed
//! - **Numerical stability**: compensated summation and Welford variance
//! - **Research-backed**: constants and tests follow ASTM E2587 and Royston (1995)

pub mod capability;
pub mod config;
pub mod correction;
mod error;
mod measurement;
pub mod normality;
pub mod pipeline;
pub mod spc;
mod special;
mod stats;

pub use config::AnalysisConfig;
pub use error::{Result, SpcError};
pub use measurement::{MeasurementSet, Reading, SpecLimits};
pub use pipeline::{AnalysisReport, Analyzer};
