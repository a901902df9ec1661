//! One-pass analysis of a [`MeasurementSet`].
//!
//! Stages run in a fixed order: correction, subgrouping, capability (which
//! also validates the sample size), control limits, outlier flags,
//! normality. Independent sets can be analysed in parallel with
//! [`Analyzer::analyze_batch`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::capability::{CapabilityCalculator, CapabilityResult};
use crate::config::AnalysisConfig;
use crate::correction::{
    detect_outliers, CorrectionRecord, DataCorrector, OutlierFlag, UnresolvedValue,
};
use crate::error::{Result, SpcError};
use crate::measurement::{MeasurementSet, SpecLimits};
use crate::normality::{NormalityResult, NormalityTester};
use crate::spc::{
    build_subgroups, ControlConstantsTable, ControlLimitCalculator, ControlLimits, Subgrouping,
};

/// Everything downstream consumers need for one measurement set.
///
/// Renderers, exporters, and storage read this record; none of them
/// recompute statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub label: String,
    pub spec_limits: SpecLimits,
    /// The sequence actually analysed: corrected values, without the
    /// readings listed in `excluded_indices`.
    pub values: Vec<f64>,
    pub corrections: Vec<CorrectionRecord>,
    /// Suspicious readings that were kept unchanged.
    pub unresolved: Vec<UnresolvedValue>,
    /// Readings left out of every statistic because no number could be
    /// recovered for them. Each one also appears in `unresolved`.
    pub excluded_indices: Vec<usize>,
    /// Outlier flags; `index` refers to the reading, not to `values`.
    pub outliers: Vec<OutlierFlag>,
    pub subgrouping: Subgrouping,
    pub capability: CapabilityResult,
    pub control_limits: ControlLimits,
    /// `None` when the sample is too small for a normality test.
    pub normality: Option<NormalityResult>,
}

/// Runs the full pipeline with one configuration and constants table.
///
/// # Examples
///
/// ```
/// use u_spc::{AnalysisConfig, Analyzer, MeasurementSet, SpecLimits};
/// use u_spc::capability::ComplianceStatus;
/// use u_spc::spc::ControlConstantsTable;
///
/// let analyzer = Analyzer::new(AnalysisConfig::default(), ControlConstantsTable::standard()).unwrap();
/// let values: Vec<f64> = (0..25).map(|i| 10.0 + 0.01 * ((i * 3) % 7) as f64 - 0.03).collect();
/// let set = MeasurementSet::from_values("bore-a", SpecLimits::new(10.5, 9.5).unwrap(), &values);
///
/// let report = analyzer.analyze(&set).unwrap();
/// assert_eq!(report.subgrouping.len(), 5);
/// assert_eq!(report.capability.status, ComplianceStatus::Pass);
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    table: ControlConstantsTable,
}

impl Analyzer {
    /// # Errors
    ///
    /// [`SpcError::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: AnalysisConfig, table: ControlConstantsTable) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn table(&self) -> &ControlConstantsTable {
        &self.table
    }

    /// Analyses one set.
    ///
    /// Readings that stay NaN or infinite after correction (unreadable, or
    /// ambiguous between several candidates) are excluded from the
    /// statistics and listed in [`AnalysisReport::excluded_indices`]; the
    /// report is still produced so the candidates can be reviewed.
    ///
    /// # Errors
    ///
    /// - [`SpcError::InvalidSpec`] for an invalid spec window.
    /// - [`SpcError::InsufficientData`] for an empty set, or fewer usable
    ///   values than one subgroup.
    /// - [`SpcError::UnsupportedSubgroupSize`] if the table lacks the
    ///   configured subgroup size.
    pub fn analyze(&self, set: &MeasurementSet) -> Result<AnalysisReport> {
        let span = info_span!("analyze", label = %set.label);
        let _guard = span.enter();

        set.validate()?;
        let spec = set.spec_limits;
        let size = self.config.subgroup_size;

        let outcome = DataCorrector::from_config(&self.config)?.correct(&set.readings, &spec)?;

        let mut kept = Vec::with_capacity(outcome.values.len());
        let mut values = Vec::with_capacity(outcome.values.len());
        let mut excluded_indices = Vec::new();
        for (index, &v) in outcome.values.iter().enumerate() {
            if v.is_finite() {
                kept.push(index);
                values.push(v);
            } else {
                excluded_indices.push(index);
            }
        }
        if !excluded_indices.is_empty() {
            warn!(
                excluded = ?excluded_indices,
                "unreadable measurements left out of the statistics"
            );
        }

        let subgrouping = build_subgroups(&values, size)?;
        let capability = CapabilityCalculator::new(&self.table)
            .with_min_cpk(self.config.min_cpk)
            .calculate_with(&values, &spec, &subgrouping)?;
        if subgrouping.excluded_tail > 0 {
            info!(
                excluded = subgrouping.excluded_tail,
                "trailing values outside complete subgroups"
            );
        }
        let control_limits = ControlLimitCalculator::new(&self.table).calculate(&subgrouping)?;
        let outliers = detect_outliers(&values, self.config.outlier_threshold)?
            .into_iter()
            .map(|flag| OutlierFlag {
                index: kept[flag.index],
                ..flag
            })
            .collect::<Vec<_>>();

        let normality = match NormalityTester::new(self.config.normality_alpha)?.test(&values) {
            Ok(result) => Some(result),
            Err(SpcError::InsufficientData { .. }) => {
                warn!(n = values.len(), "sample too small for a normality test");
                None
            }
            Err(e) => return Err(e),
        };

        info!(
            n = values.len(),
            corrections = outcome.records.len(),
            unresolved = outcome.unresolved.len(),
            outliers = outliers.len(),
            cpk = ?capability.cpk,
            status = ?capability.status,
            "analysis complete"
        );

        Ok(AnalysisReport {
            label: set.label.clone(),
            spec_limits: spec,
            values,
            corrections: outcome.records,
            unresolved: outcome.unresolved,
            excluded_indices,
            outliers,
            subgrouping,
            capability,
            control_limits,
            normality,
        })
    }

    /// Analyses independent sets in parallel; results keep input order.
    pub fn analyze_batch(&self, sets: &[MeasurementSet]) -> Vec<Result<AnalysisReport>> {
        sets.par_iter().map(|set| self.analyze(set)).collect()
    }
}
