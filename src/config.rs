//! Analysis configuration.
//!
//! Every tunable that a quality standard may redefine lives here with a
//! documented default, so a plant can switch standards by editing a TOML
//! file instead of code.
//!
//! ```
//! use u_spc::AnalysisConfig;
//!
//! let cfg = AnalysisConfig::from_toml_str("min_cpk = 1.67\nsubgroup_size = 4").unwrap();
//! assert_eq!(cfg.subgroup_size, 4);
//! assert!((cfg.min_cpk - 1.67).abs() < 1e-12);
//! // Unspecified fields keep their defaults.
//! assert!((cfg.outlier_threshold - 3.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpcError};

/// Default compliance threshold for Cpk (AIAG / ISO 22514 convention).
pub const DEFAULT_MIN_CPK: f64 = 1.33;

/// Configuration for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Subgroup size for X-bar/R analysis. Default: 5.
    pub subgroup_size: usize,
    /// Outlier threshold in sample standard deviations. Default: 3.0.
    pub outlier_threshold: f64,
    /// Minimum Cpk for a PASS verdict. Default: 1.33.
    pub min_cpk: f64,
    /// Significance level of the normality test. Default: 0.05.
    pub normality_alpha: f64,
    /// Margin added on both sides of the spec window when judging whether a
    /// corrected value is plausible, as a fraction of `usl - lsl`.
    /// Default: 0.5.
    pub band_margin: f64,
    /// Largest power of ten tried when restoring a missing decimal point.
    /// Default: 4.
    pub max_decimal_shift: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            subgroup_size: 5,
            outlier_threshold: 3.0,
            min_cpk: DEFAULT_MIN_CPK,
            normality_alpha: 0.05,
            band_margin: 0.5,
            max_decimal_shift: 4,
        }
    }
}

impl AnalysisConfig {
    /// Parses a TOML document and validates the result.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidConfig`] on parse failure or if [`validate`](Self::validate) fails.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s).map_err(|e| SpcError::InvalidConfig {
            field: "toml".into(),
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.subgroup_size < 2 {
            return Err(invalid("subgroup_size", "must be at least 2"));
        }
        check_positive("outlier_threshold", self.outlier_threshold)?;
        check_positive("min_cpk", self.min_cpk)?;
        check_alpha(self.normality_alpha)?;
        check_band_margin(self.band_margin)?;
        check_decimal_shift(self.max_decimal_shift)
    }
}

pub(crate) fn check_positive(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive number"))
    }
}

pub(crate) fn check_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(invalid("normality_alpha", "must lie strictly between 0 and 1"))
    }
}

pub(crate) fn check_band_margin(margin: f64) -> Result<()> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(())
    } else {
        Err(invalid("band_margin", "must be a non-negative number"))
    }
}

pub(crate) fn check_decimal_shift(shift: u32) -> Result<()> {
    if (1..=9).contains(&shift) {
        Ok(())
    } else {
        Err(invalid("max_decimal_shift", "must be in 1..=9"))
    }
}

fn invalid(field: &str, message: &str) -> SpcError {
    SpcError::InvalidConfig {
        field: field.into(),
        message: message.into(),
    }
}
