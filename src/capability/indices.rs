//! Process capability indices (Cp, Cpk, Pp, Ppk, Cpm) and compliance verdict.
//!
//! Short-term indices (Cp, Cpk) use within-subgroup variation estimated as
//! `R̄ / d2`; long-term indices (Pp, Ppk) use the overall sample standard
//! deviation.
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.
//! - Chan, Cheng & Spiring (1988), "A New Measure of Process Capability: Cpm",
//!   *Journal of Quality Technology* 20(3), pp. 162--175.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sigma_level::{expected_ppm, ppm_to_sigma};
use crate::config::{check_positive, DEFAULT_MIN_CPK};
use crate::error::{Result, SpcError};
use crate::measurement::SpecLimits;
use crate::spc::{build_subgroups, ControlConstantsTable, Subgrouping};
use crate::stats;

/// Compliance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Pass,
    Fail,
}

/// Computed capability indices.
///
/// An index is `None` when it is undefined: its sigma is exactly zero. That
/// is a valid outcome for a report, not an error.
///
/// # Index interpretation
///
/// | Index | Value | Interpretation |
/// |-------|-------|----------------|
/// | Cp/Pp | >= 1.33 | Process is capable |
/// | Cpk/Ppk | >= 1.33 | Process is capable and centered |
///
/// Reference: Montgomery (2019), Chapter 8, Table 8.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResult {
    /// Mean of all values, including those outside complete subgroups.
    pub mean: f64,
    /// Sample standard deviation of all values (divisor n - 1).
    pub std_overall: f64,
    /// `R̄ / d2` over complete subgroups.
    pub std_within: f64,
    /// Cp = (USL - LSL) / (6 * sigma_within).
    pub cp: Option<f64>,
    /// Cpk = min(Cpu, Cpl).
    pub cpk: Option<f64>,
    /// Cpu = (USL - mean) / (3 * sigma_within).
    pub cpu: Option<f64>,
    /// Cpl = (mean - LSL) / (3 * sigma_within).
    pub cpl: Option<f64>,
    /// Pp = (USL - LSL) / (6 * sigma_overall).
    pub pp: Option<f64>,
    /// Ppk = min(Ppu, Ppl).
    pub ppk: Option<f64>,
    pub ppu: Option<f64>,
    pub ppl: Option<f64>,
    /// Cpm = Cp / sqrt(1 + ((mean - target) / sigma_within)^2), with the
    /// target at the midpoint of the spec window.
    pub cpm: Option<f64>,
    /// Expected parts per million outside spec, from mean and overall sigma.
    pub expected_ppm: Option<f64>,
    /// Sigma quality level (1.5-sigma shift convention) of `expected_ppm`.
    pub sigma_level: Option<f64>,
    /// Cpk threshold the verdict was judged against.
    pub min_cpk: f64,
    pub status: ComplianceStatus,
}

impl CapabilityResult {
    /// `true` if the within-subgroup sigma is zero and Cp/Cpk are undefined.
    pub fn is_degenerate(&self) -> bool {
        self.cpk.is_none()
    }
}

/// Computes capability indices from raw measurements.
///
/// # Examples
///
/// ```
/// use u_spc::SpecLimits;
/// use u_spc::capability::{CapabilityCalculator, ComplianceStatus};
/// use u_spc::spc::ControlConstantsTable;
///
/// let table = ControlConstantsTable::standard();
/// let spec = SpecLimits::new(11.0, 9.0).unwrap();
/// let data = [9.9, 10.0, 10.1, 10.0, 9.95, 10.05, 10.0, 9.9, 10.1, 10.0];
///
/// let result = CapabilityCalculator::new(&table).calculate(&data, &spec, 5).unwrap();
/// assert!(result.cpk.unwrap() > 1.33);
/// assert_eq!(result.status, ComplianceStatus::Pass);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CapabilityCalculator<'a> {
    table: &'a ControlConstantsTable,
    min_cpk: f64,
}

impl<'a> CapabilityCalculator<'a> {
    /// A calculator judging against [`DEFAULT_MIN_CPK`] (1.33).
    pub fn new(table: &'a ControlConstantsTable) -> Self {
        Self {
            table,
            min_cpk: DEFAULT_MIN_CPK,
        }
    }

    /// Overrides the Cpk compliance threshold.
    pub fn with_min_cpk(mut self, min_cpk: f64) -> Self {
        self.min_cpk = min_cpk;
        self
    }

    /// Computes all indices and the PASS/FAIL verdict.
    ///
    /// `status` is PASS iff `cpk >= min_cpk`. When `cpk` is undefined (zero
    /// within-subgroup variation), PASS iff `lsl < mean < usl`.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`SpcError::InvalidSpec`] if `usl <= lsl`.
    /// - [`SpcError::InvalidConfig`] if `min_cpk` is not a positive number.
    /// - [`SpcError::UnsupportedSubgroupSize`] if `subgroup_size < 2`.
    /// - [`SpcError::NonFiniteMeasurement`] if a value is NaN or infinite.
    /// - [`SpcError::InsufficientData`] if `values.len() < subgroup_size`.
    /// - [`SpcError::UnsupportedSubgroupSize`] if the table has no d2 for
    ///   `subgroup_size`.
    pub fn calculate(
        &self,
        values: &[f64],
        spec: &SpecLimits,
        subgroup_size: usize,
    ) -> Result<CapabilityResult> {
        spec.validate()?;
        check_positive("min_cpk", self.min_cpk)?;
        if subgroup_size < 2 {
            return Err(SpcError::UnsupportedSubgroupSize {
                size: subgroup_size,
            });
        }
        let subgroups = build_subgroups(values, subgroup_size)?;
        self.calculate_with(values, spec, &subgroups)
    }

    /// Same as [`calculate`](Self::calculate), reusing a subgrouping already
    /// built from `values`.
    ///
    /// # Errors
    ///
    /// As for [`calculate`](Self::calculate); the subgroup size is taken from
    /// `subgroups`.
    pub fn calculate_with(
        &self,
        values: &[f64],
        spec: &SpecLimits,
        subgroups: &Subgrouping,
    ) -> Result<CapabilityResult> {
        spec.validate()?;
        check_positive("min_cpk", self.min_cpk)?;
        let size = subgroups.size;
        if let Some(index) = stats::first_non_finite(values) {
            return Err(SpcError::NonFiniteMeasurement { index });
        }
        let not_enough = || SpcError::insufficient("capability analysis", size, values.len());
        if values.len() < size || subgroups.is_empty() {
            return Err(not_enough());
        }
        let d2 = self.table.get(size)?.d2;

        let r_bar = subgroups.r_bar().ok_or_else(not_enough)?;
        let mean = stats::mean(values).ok_or_else(not_enough)?;
        let std_overall = stats::std_dev(values).ok_or_else(not_enough)?;
        let std_within = r_bar / d2;

        let result = self.compute_indices(spec, mean, std_within, std_overall);
        debug!(
            mean,
            std_within,
            std_overall,
            cpk = ?result.cpk,
            status = ?result.status,
            "capability computed"
        );
        Ok(result)
    }

    fn compute_indices(
        &self,
        spec: &SpecLimits,
        mean: f64,
        std_within: f64,
        std_overall: f64,
    ) -> CapabilityResult {
        let within = IndexSet::new(spec, mean, std_within);
        let overall = IndexSet::new(spec, mean, std_overall);

        let cpm = within.p.map(|cp| {
            let deviation_ratio = (mean - spec.midpoint()) / std_within;
            cp / (1.0 + deviation_ratio * deviation_ratio).sqrt()
        });

        let expected_ppm = expected_ppm(mean, std_overall, spec);
        let sigma_level = expected_ppm.and_then(ppm_to_sigma);

        let passes = match within.pk {
            Some(cpk) => cpk >= self.min_cpk,
            None => spec.strictly_contains(mean),
        };

        CapabilityResult {
            mean,
            std_overall,
            std_within,
            cp: within.p,
            cpk: within.pk,
            cpu: within.pu,
            cpl: within.pl,
            pp: overall.p,
            ppk: overall.pk,
            ppu: overall.pu,
            ppl: overall.pl,
            cpm,
            expected_ppm,
            sigma_level,
            min_cpk: self.min_cpk,
            status: if passes {
                ComplianceStatus::Pass
            } else {
                ComplianceStatus::Fail
            },
        }
    }
}

// One family of indices (C or P) for a given sigma; all None at sigma == 0.
struct IndexSet {
    p: Option<f64>,
    pk: Option<f64>,
    pu: Option<f64>,
    pl: Option<f64>,
}

impl IndexSet {
    fn new(spec: &SpecLimits, mean: f64, sigma: f64) -> Self {
        if sigma == 0.0 {
            return Self {
                p: None,
                pk: None,
                pu: None,
                pl: None,
            };
        }
        let pu = (spec.usl - mean) / (3.0 * sigma);
        let pl = (mean - spec.lsl) / (3.0 * sigma);
        Self {
            p: Some(spec.tolerance() / (6.0 * sigma)),
            pk: Some(pu.min(pl)),
            pu: Some(pu),
            pl: Some(pl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec() -> SpecLimits {
        SpecLimits::new(10.5, 9.5).unwrap()
    }

    // Deterministic spread in [-5, 5] * scale around the center.
    fn spread(center: f64, scale: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| center + scale * (((i * 7) % 11) as f64 - 5.0))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Verdicts
    // -----------------------------------------------------------------------

    #[test]
    fn tight_process_passes() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.0, 0.02, 50);
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();
        let cpk = r.cpk.unwrap();
        assert!(cpk >= 1.33, "cpk = {cpk}");
        assert_eq!(r.status, ComplianceStatus::Pass);
    }

    #[test]
    fn wide_process_fails() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.0, 0.14, 50);
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();
        assert!(r.cpk.unwrap() < 1.33);
        assert_eq!(r.status, ComplianceStatus::Fail);
        assert!(r.expected_ppm.unwrap() > 1_000.0);
    }

    #[test]
    fn threshold_is_configurable() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.0, 0.02, 50);
        let strict = CapabilityCalculator::new(&table)
            .with_min_cpk(100.0)
            .calculate(&values, &spec(), 5)
            .unwrap();
        assert_eq!(strict.status, ComplianceStatus::Fail);
        assert!((strict.min_cpk - 100.0).abs() < f64::EPSILON);
    }

    // -----------------------------------------------------------------------
    // Formulas
    // -----------------------------------------------------------------------

    /// Two subgroups with ranges 0.4 and 0.2, n = 5:
    /// R-bar = 0.3, sigma_within = 0.3 / 2.326.
    #[test]
    fn exact_numerical_verification() {
        let table = ControlConstantsTable::standard();
        let values = [
            9.8, 10.0, 10.2, 10.0, 10.0, //
            10.1, 10.0, 9.9, 10.0, 10.0,
        ];
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();

        let sigma_w = 0.3 / 2.326;
        let mean = 10.0;
        assert!((r.mean - mean).abs() < 1e-12);
        assert!((r.std_within - sigma_w).abs() < 1e-12);
        assert!((r.cp.unwrap() - 1.0 / (6.0 * sigma_w)).abs() < 1e-9);
        assert!((r.cpu.unwrap() - (10.5 - mean) / (3.0 * sigma_w)).abs() < 1e-9);
        assert!((r.cpk.unwrap() - r.cpu.unwrap().min(r.cpl.unwrap())).abs() < 1e-15);

        let sigma_o = stats::std_dev(&values).unwrap();
        assert!((r.std_overall - sigma_o).abs() < 1e-15);
        assert!((r.pp.unwrap() - 1.0 / (6.0 * sigma_o)).abs() < 1e-9);
    }

    #[test]
    fn off_center_cpk_uses_nearer_limit() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.3, 0.02, 50);
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();
        assert!(r.cpu.unwrap() < r.cpl.unwrap());
        assert!((r.cpk.unwrap() - r.cpu.unwrap()).abs() < 1e-15);
        assert!(r.cpm.unwrap() < r.cp.unwrap());
    }

    #[test]
    fn mean_includes_trailing_values() {
        let table = ControlConstantsTable::standard();
        // One subgroup of 10.0 plus a trailing 10.6 outside any subgroup.
        let values = [10.0, 10.0, 10.1, 9.9, 10.0, 10.6];
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();
        assert!((r.mean - 10.1).abs() < 1e-12);
        // Within sigma only sees the first five values.
        assert!((r.std_within - 0.2 / 2.326).abs() < 1e-12);
    }

    // -----------------------------------------------------------------------
    // Degenerate cases
    // -----------------------------------------------------------------------

    #[test]
    fn zero_variance_inside_spec_passes() {
        let table = ControlConstantsTable::standard();
        let r = CapabilityCalculator::new(&table)
            .calculate(&[10.0; 20], &spec(), 5)
            .unwrap();
        assert_eq!(r.std_within, 0.0);
        assert_eq!(r.std_overall, 0.0);
        assert!(r.cp.is_none() && r.cpk.is_none() && r.pp.is_none() && r.ppk.is_none());
        assert!(r.is_degenerate());
        assert_eq!(r.status, ComplianceStatus::Pass);
    }

    #[test]
    fn zero_variance_outside_spec_fails() {
        let table = ControlConstantsTable::standard();
        let r = CapabilityCalculator::new(&table)
            .calculate(&[11.0; 10], &spec(), 5)
            .unwrap();
        assert_eq!(r.status, ComplianceStatus::Fail);
    }

    #[test]
    fn zero_variance_on_limit_fails() {
        let table = ControlConstantsTable::standard();
        let r = CapabilityCalculator::new(&table)
            .calculate(&[10.5; 10], &spec(), 5)
            .unwrap();
        assert_eq!(r.status, ComplianceStatus::Fail);
    }

    #[test]
    fn zero_within_but_nonzero_overall() {
        let table = ControlConstantsTable::standard();
        let values = [10.0, 10.0, 10.0, 10.0, 10.0, 10.2, 10.2, 10.2, 10.2, 10.2];
        let r = CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 5)
            .unwrap();
        assert!(r.cpk.is_none());
        assert!(r.ppk.is_some());
        assert_eq!(r.status, ComplianceStatus::Pass);
    }

    // -----------------------------------------------------------------------
    // Errors
    // -----------------------------------------------------------------------

    #[test]
    fn invalid_spec_is_checked_first() {
        let table = ControlConstantsTable::standard();
        let bad = SpecLimits { usl: 9.5, lsl: 10.5 };
        // Even with too few values, the spec error wins.
        assert_eq!(
            CapabilityCalculator::new(&table).calculate(&[10.0], &bad, 5),
            Err(SpcError::InvalidSpec { usl: 9.5, lsl: 10.5 })
        );
    }

    #[test]
    fn fewer_values_than_subgroup() {
        let table = ControlConstantsTable::standard();
        assert_eq!(
            CapabilityCalculator::new(&table).calculate(&[10.0, 10.1, 9.9], &spec(), 5),
            Err(SpcError::InsufficientData {
                operation: "capability analysis",
                required: 5,
                actual: 3,
            })
        );
    }

    #[test]
    fn unsupported_subgroup_size() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.0, 0.02, 30);
        assert_eq!(
            CapabilityCalculator::new(&table).calculate(&values, &spec(), 15),
            Err(SpcError::UnsupportedSubgroupSize { size: 15 })
        );
        assert!(CapabilityCalculator::new(&table)
            .calculate(&values, &spec(), 1)
            .is_err());
    }

    #[test]
    fn unusable_threshold_is_rejected() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.0, 0.02, 10);
        for min_cpk in [0.0, -1.33, f64::NAN] {
            assert!(matches!(
                CapabilityCalculator::new(&table)
                    .with_min_cpk(min_cpk)
                    .calculate(&values, &spec(), 5),
                Err(SpcError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn prebuilt_subgrouping_gives_same_result() {
        let table = ControlConstantsTable::standard();
        let values = spread(10.1, 0.03, 23);
        let calc = CapabilityCalculator::new(&table);
        let subgroups = build_subgroups(&values, 5).unwrap();
        assert_eq!(
            calc.calculate_with(&values, &spec(), &subgroups).unwrap(),
            calc.calculate(&values, &spec(), 5).unwrap()
        );

        let empty = build_subgroups(&values[..3], 5).unwrap();
        assert!(matches!(
            calc.calculate_with(&values[..3], &spec(), &empty),
            Err(SpcError::InsufficientData { .. })
        ));
    }

    #[test]
    fn rejects_nan() {
        let table = ControlConstantsTable::standard();
        let values = [10.0, 10.1, f64::NAN, 9.9, 10.0];
        assert_eq!(
            CapabilityCalculator::new(&table).calculate(&values, &spec(), 2),
            Err(SpcError::NonFiniteMeasurement { index: 2 })
        );
    }

    proptest! {
        #[test]
        fn dispersion_is_non_negative(
            values in proptest::collection::vec(9.0_f64..11.0, 5..=60),
            size in 2_usize..=10,
        ) {
            let table = ControlConstantsTable::standard();
            if let Ok(r) = CapabilityCalculator::new(&table).calculate(&values, &spec(), size) {
                prop_assert!(r.std_overall >= 0.0);
                prop_assert!(r.std_within >= 0.0);
                if let (Some(cp), Some(cpk)) = (r.cp, r.cpk) {
                    prop_assert!(cpk <= cp + 1e-12);
                }
                prop_assert_eq!(
                    r.status == ComplianceStatus::Pass,
                    match r.cpk {
                        Some(cpk) => cpk >= 1.33,
                        None => r.mean > 9.5 && r.mean < 10.5,
                    }
                );
            }
        }

        #[test]
        fn inverted_spec_always_rejected(
            values in proptest::collection::vec(-1e3_f64..1e3, 0..=20),
            usl in -1e3_f64..1e3,
            gap in 0.0_f64..100.0,
        ) {
            let table = ControlConstantsTable::standard();
            let bad = SpecLimits { usl, lsl: usl + gap };
            let is_invalid_spec = matches!(
                CapabilityCalculator::new(&table).calculate(&values, &bad, 5),
                Err(SpcError::InvalidSpec { .. })
            );
            prop_assert!(is_invalid_spec);
        }
    }
}
