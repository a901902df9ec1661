//! Process capability analysis.
//!
//! Computes standard capability indices for assessing how well a process
//! meets specification limits, and the compliance verdict derived from Cpk.
//!
//! # Indices
//!
//! - **Cp** — Potential capability (spread vs tolerance)
//! - **Cpk** — Actual capability (centering considered)
//! - **Pp**, **Ppk** — Long-term performance indices
//! - **Cpm** — Taguchi capability (target deviation)
//!
//! # Nonconformance
//!
//! - [`expected_ppm`] — Expected PPM outside spec under normality
//! - [`sigma_to_ppm`] / [`ppm_to_sigma`] — Sigma quality level conversions
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod indices;
mod sigma_level;

pub use indices::{CapabilityCalculator, CapabilityResult, ComplianceStatus};
pub use sigma_level::{expected_ppm, ppm_to_sigma, sigma_to_ppm};
