//! Correction of plausible acquisition errors.
//!
//! A reading is examined when its value falls outside the plausible band or
//! its raw token shows the extractor failed on it (see
//! [`Reading::is_coerced`]); a coerced zero inside a band around zero is no
//! more trustworthy than one outside it. Every heuristic is tried
//! independently:
//!
//! - no in-band proposal: the value is kept and reported unresolved;
//! - one distinct proposal: it is applied and recorded with the original;
//! - several distinct proposals: the value is kept and reported ambiguous
//!   with every candidate, for a person to choose.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::heuristics::{
    char_substitution, missing_decimal, unit_noise, CorrectionCandidate, CorrectionReason,
    PlausibleBand,
};
use crate::config::{check_band_margin, check_decimal_shift, AnalysisConfig};
use crate::error::Result;
use crate::measurement::{Reading, SpecLimits};

/// An applied correction. The original is always kept next to the new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub index: usize,
    pub original: f64,
    pub corrected: f64,
    /// First heuristic, in check order, that produced the value.
    pub reason: CorrectionReason,
    /// Other heuristics that produced the same value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_matched: Vec<CorrectionReason>,
}

/// Why a suspicious reading was left as it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// No heuristic produced a value inside the plausible band.
    NoPlausibleCorrection,
    /// Heuristics disagree; all candidates are listed.
    Ambiguous { candidates: Vec<CorrectionCandidate> },
}

/// A suspicious reading the corrector would not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedValue {
    pub index: usize,
    pub original: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub reason: UnresolvedReason,
}

impl UnresolvedValue {
    /// `true` if more than one correction was possible.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.reason, UnresolvedReason::Ambiguous { .. })
    }
}

/// Result of a correction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// The sequence with applied corrections, same length and order as input.
    pub values: Vec<f64>,
    /// Applied corrections, in index order.
    pub records: Vec<CorrectionRecord>,
    /// Suspicious readings left unchanged, in index order.
    pub unresolved: Vec<UnresolvedValue>,
}

/// Proposes corrections for readings that cannot be genuine measurements.
///
/// # Examples
///
/// ```
/// use u_spc::{Reading, SpecLimits};
/// use u_spc::correction::{CorrectionReason, DataCorrector};
///
/// let spec = SpecLimits::new(10.5, 9.5).unwrap();
/// let readings = vec![
///     Reading::from(10.1),
///     Reading::from(101.0),                     // lost decimal point
///     Reading::with_token(f64::NAN, "9.9mm"),   // unit suffix
/// ];
/// let out = DataCorrector::default().correct(&readings, &spec).unwrap();
///
/// assert_eq!(out.values, vec![10.1, 10.1, 9.9]);
/// assert_eq!(out.records[0].reason, CorrectionReason::MissingDecimal);
/// assert_eq!(out.records[1].reason, CorrectionReason::UnitNoise);
/// assert!(out.unresolved.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataCorrector {
    band_margin: f64,
    max_decimal_shift: u32,
}

impl Default for DataCorrector {
    fn default() -> Self {
        let cfg = AnalysisConfig::default();
        Self {
            band_margin: cfg.band_margin,
            max_decimal_shift: cfg.max_decimal_shift,
        }
    }
}

impl DataCorrector {
    /// `band_margin` is a fraction of the tolerance added on both sides of
    /// the spec window; `max_decimal_shift` bounds the power of ten tried by
    /// the missing-decimal heuristic.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidConfig`](crate::SpcError::InvalidConfig) for a
    /// negative or non-finite margin, or a shift outside `1..=9`.
    pub fn new(band_margin: f64, max_decimal_shift: u32) -> Result<Self> {
        check_band_margin(band_margin)?;
        check_decimal_shift(max_decimal_shift)?;
        Ok(Self {
            band_margin,
            max_decimal_shift,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::new(config.band_margin, config.max_decimal_shift)
    }

    /// Runs every heuristic over the readings.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidSpec`](crate::SpcError::InvalidSpec) if the spec
    /// window is invalid; the band cannot be built without it.
    pub fn correct(&self, readings: &[Reading], spec: &SpecLimits) -> Result<CorrectionOutcome> {
        spec.validate()?;
        let band = PlausibleBand::around(spec, self.band_margin);

        let mut values = Vec::with_capacity(readings.len());
        let mut records = Vec::new();
        let mut unresolved = Vec::new();

        for (index, reading) in readings.iter().enumerate() {
            let original = reading.value;
            if band.contains(original) && !reading.is_coerced() {
                values.push(original);
                continue;
            }

            let candidates = self.candidates(reading, &band);
            let distinct = distinct_values(&candidates);
            match distinct.as_slice() {
                [] => {
                    warn!(index, original, "no plausible correction");
                    values.push(original);
                    unresolved.push(UnresolvedValue {
                        index,
                        original,
                        token: reading.token.clone(),
                        reason: UnresolvedReason::NoPlausibleCorrection,
                    });
                }
                [corrected] => {
                    let reason = candidates[0].reason;
                    let mut also_matched = Vec::new();
                    for c in &candidates[1..] {
                        if c.reason != reason && !also_matched.contains(&c.reason) {
                            also_matched.push(c.reason);
                        }
                    }
                    debug!(index, original, corrected, ?reason, ?also_matched, "correction applied");
                    values.push(*corrected);
                    records.push(CorrectionRecord {
                        index,
                        original,
                        corrected: *corrected,
                        reason,
                        also_matched,
                    });
                }
                _ => {
                    warn!(index, original, candidates = candidates.len(), "ambiguous correction");
                    values.push(original);
                    unresolved.push(UnresolvedValue {
                        index,
                        original,
                        token: reading.token.clone(),
                        reason: UnresolvedReason::Ambiguous { candidates },
                    });
                }
            }
        }

        Ok(CorrectionOutcome {
            values,
            records,
            unresolved,
        })
    }

    /// Convenience for plain values without raw tokens.
    pub fn correct_values(&self, values: &[f64], spec: &SpecLimits) -> Result<CorrectionOutcome> {
        let readings: Vec<Reading> = values.iter().copied().map(Reading::from).collect();
        self.correct(&readings, spec)
    }

    fn candidates(&self, reading: &Reading, band: &PlausibleBand) -> Vec<CorrectionCandidate> {
        let mut out: Vec<CorrectionCandidate> =
            missing_decimal(reading.value, band, self.max_decimal_shift)
                .into_iter()
                .map(|value| CorrectionCandidate {
                    reason: CorrectionReason::MissingDecimal,
                    value,
                })
                .collect();
        if let Some(token) = reading.token.as_deref() {
            if let Some(value) = unit_noise(reading.value, token, band) {
                out.push(CorrectionCandidate {
                    reason: CorrectionReason::UnitNoise,
                    value,
                });
            }
            if let Some(value) = char_substitution(token, band) {
                out.push(CorrectionCandidate {
                    reason: CorrectionReason::CharSubstitution,
                    value,
                });
            }
        }
        out
    }
}

// Candidate values with near-duplicates merged, in first-seen order.
fn distinct_values(candidates: &[CorrectionCandidate]) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    for c in candidates {
        let tol = 1e-9 * c.value.abs().max(1.0);
        if !out.iter().any(|v| (v - c.value).abs() <= tol) {
            out.push(c.value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpcError;
    use proptest::prelude::*;

    fn spec() -> SpecLimits {
        SpecLimits::new(10.5, 9.5).unwrap()
    }

    #[test]
    fn in_band_values_are_untouched() {
        let values = [9.0, 9.5, 10.0, 10.5, 11.0];
        let out = DataCorrector::default().correct_values(&values, &spec()).unwrap();
        assert_eq!(out.values, values.to_vec());
        assert!(out.records.is_empty());
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn missing_decimal_is_applied_and_recorded() {
        let out = DataCorrector::default()
            .correct_values(&[10.0, 105.0, 9.9], &spec())
            .unwrap();
        assert_eq!(out.values, vec![10.0, 10.5, 9.9]);
        assert_eq!(
            out.records,
            vec![CorrectionRecord {
                index: 1,
                original: 105.0,
                corrected: 10.5,
                reason: CorrectionReason::MissingDecimal,
                also_matched: Vec::new(),
            }]
        );
    }

    #[test]
    fn char_substitution_from_token() {
        let readings = vec![Reading::with_token(f64::NAN, "1O.3")];
        let out = DataCorrector::default().correct(&readings, &spec()).unwrap();
        assert_eq!(out.values, vec![10.3]);
        assert_eq!(out.records[0].reason, CorrectionReason::CharSubstitution);
        assert!(out.records[0].original.is_nan());
    }

    #[test]
    fn implausible_value_is_kept_and_reported() {
        let out = DataCorrector::default()
            .correct_values(&[10.0, 50.0], &spec())
            .unwrap();
        assert_eq!(out.values, vec![10.0, 50.0]);
        assert!(out.records.is_empty());
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.unresolved[0].index, 1);
        assert_eq!(out.unresolved[0].reason, UnresolvedReason::NoPlausibleCorrection);
    }

    #[test]
    fn nan_without_token_is_unresolved() {
        let out = DataCorrector::default()
            .correct_values(&[f64::NAN], &spec())
            .unwrap();
        assert!(out.values[0].is_nan());
        assert_eq!(out.unresolved.len(), 1);
    }

    #[test]
    fn disagreeing_heuristics_are_ambiguous() {
        // Value 98 -> missing decimal 9.8; token "l0.2" -> substitution 10.2.
        let readings = vec![Reading::with_token(98.0, "l0.2")];
        let out = DataCorrector::default().correct(&readings, &spec()).unwrap();

        assert_eq!(out.values, vec![98.0]);
        assert!(out.records.is_empty());
        let u = &out.unresolved[0];
        assert!(u.is_ambiguous());
        assert_eq!(u.token.as_deref(), Some("l0.2"));
        match &u.reason {
            UnresolvedReason::Ambiguous { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].reason, CorrectionReason::MissingDecimal);
                assert!((candidates[0].value - 9.8).abs() < 1e-12);
                assert_eq!(candidates[1].reason, CorrectionReason::CharSubstitution);
                assert!((candidates[1].value - 10.2).abs() < 1e-12);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn wide_band_makes_decimal_shift_ambiguous() {
        // Band [1, 150] admits 1050 / 10, 1050 / 100 and 1050 / 1000.
        let spec = SpecLimits::new(150.0, 1.0).unwrap();
        let corrector = DataCorrector::new(0.0, 4).unwrap();
        let out = corrector.correct_values(&[1050.0], &spec).unwrap();
        assert!(out.unresolved[0].is_ambiguous());
        assert_eq!(out.values, vec![1050.0]);
    }

    #[test]
    fn agreeing_heuristics_apply_once() {
        // 105 -> 10.5 by decimal shift; token "1O.5" -> 10.5 by substitution.
        let readings = vec![Reading::with_token(105.0, "1O.5")];
        let out = DataCorrector::default().correct(&readings, &spec()).unwrap();
        assert_eq!(out.values, vec![10.5]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].reason, CorrectionReason::MissingDecimal);
        assert_eq!(
            out.records[0].also_matched,
            vec![CorrectionReason::CharSubstitution]
        );
    }

    fn around_zero() -> SpecLimits {
        SpecLimits::new(1.0, 0.0).unwrap()
    }

    #[test]
    fn coerced_zero_inside_band_is_recovered() {
        // Band [-0.5, 1.5] holds the coerced zeros; the tokens still decide.
        let readings = vec![
            Reading::with_token(0.0, "0.35mm"),
            Reading::with_token(0.0, "O.42"),
            Reading::with_token(0.61, "0.61"),
        ];
        let out = DataCorrector::default().correct(&readings, &around_zero()).unwrap();

        assert_eq!(out.values, vec![0.35, 0.42, 0.61]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].reason, CorrectionReason::UnitNoise);
        assert_eq!(out.records[0].original, 0.0);
        assert_eq!(out.records[1].reason, CorrectionReason::CharSubstitution);
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn coerced_zero_without_recovery_is_reported() {
        let readings = vec![Reading::with_token(0.0, "n/a")];
        let out = DataCorrector::default().correct(&readings, &around_zero()).unwrap();
        assert_eq!(out.values, vec![0.0]);
        assert!(out.records.is_empty());
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.unresolved[0].reason, UnresolvedReason::NoPlausibleCorrection);
    }

    #[test]
    fn genuine_zero_is_untouched() {
        let readings = vec![Reading::with_token(0.0, "0.00"), Reading::from(0.0)];
        let out = DataCorrector::default().correct(&readings, &around_zero()).unwrap();
        assert_eq!(out.values, vec![0.0, 0.0]);
        assert!(out.records.is_empty());
        assert!(out.unresolved.is_empty());
    }

    #[test]
    fn tuning_is_validated() {
        assert!(matches!(
            DataCorrector::new(-0.1, 4),
            Err(SpcError::InvalidConfig { ref field, .. }) if field == "band_margin"
        ));
        assert!(DataCorrector::new(f64::NAN, 4).is_err());
        assert!(DataCorrector::new(0.5, 0).is_err());
        assert!(DataCorrector::new(0.5, 4).is_ok());

        let config = AnalysisConfig {
            band_margin: -1.0,
            ..AnalysisConfig::default()
        };
        assert!(DataCorrector::from_config(&config).is_err());
    }

    #[test]
    fn corrected_sequence_is_a_fixed_point() {
        let readings = vec![
            Reading::from(10.0),
            Reading::from(102.0),
            Reading::with_token(0.0, "9.7 mm"),
            Reading::from(77.0),
            Reading::with_token(f64::NAN, "??"),
        ];
        let corrector = DataCorrector::default();
        let first = corrector.correct(&readings, &spec()).unwrap();
        assert_eq!(first.records.len(), 2);

        let second = corrector.correct_values(&first.values, &spec()).unwrap();
        assert!(second.records.is_empty());
        assert_eq!(second.values.len(), first.values.len());
        for (a, b) in first.values.iter().zip(&second.values) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn invalid_spec() {
        let bad = SpecLimits { usl: 1.0, lsl: 2.0 };
        assert!(matches!(
            DataCorrector::default().correct_values(&[1.5], &bad),
            Err(SpcError::InvalidSpec { .. })
        ));
    }

    proptest! {
        #[test]
        fn correction_is_idempotent(
            values in proptest::collection::vec(-1e4_f64..1e4, 0..=40),
        ) {
            let corrector = DataCorrector::default();
            let first = corrector.correct_values(&values, &spec()).unwrap();
            prop_assert_eq!(first.values.len(), values.len());
            let second = corrector.correct_values(&first.values, &spec()).unwrap();
            prop_assert!(second.records.is_empty());
            prop_assert_eq!(second.values, first.values);
        }
    }
}
