//! Input records handed over by the extraction stage.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpcError};

/// Two-sided specification window.
///
/// # Invariants
///
/// `usl > lsl`, both finite. Enforced by [`SpecLimits::new`] and re-checked
/// by [`SpecLimits::validate`] before any computation, since deserialized
/// values bypass the constructor.
///
/// # Examples
///
/// ```
/// use u_spc::SpecLimits;
///
/// let spec = SpecLimits::new(10.5, 9.5).unwrap();
/// assert!((spec.tolerance() - 1.0).abs() < 1e-12);
/// assert!(SpecLimits::new(9.5, 10.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    /// Upper specification limit.
    pub usl: f64,
    /// Lower specification limit.
    pub lsl: f64,
}

impl SpecLimits {
    /// Creates a validated specification window.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidSpec`] if `usl <= lsl` or either limit is not finite.
    pub fn new(usl: f64, lsl: f64) -> Result<Self> {
        let spec = Self { usl, lsl };
        spec.validate()?;
        Ok(spec)
    }

    /// Re-checks the `usl > lsl` invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.usl.is_finite() || !self.lsl.is_finite() || self.usl <= self.lsl {
            return Err(SpcError::InvalidSpec {
                usl: self.usl,
                lsl: self.lsl,
            });
        }
        Ok(())
    }

    /// Width of the window, `usl - lsl`.
    pub fn tolerance(&self) -> f64 {
        self.usl - self.lsl
    }

    /// Midpoint of the window.
    pub fn midpoint(&self) -> f64 {
        (self.usl + self.lsl) / 2.0
    }

    /// `true` if `lsl < x < usl`.
    pub fn strictly_contains(&self, x: f64) -> bool {
        x > self.lsl && x < self.usl
    }
}

/// One extracted measurement.
///
/// `value` is what the extractor produced; `token` is the raw text it was
/// parsed from, when available. Tokens let the corrector recover values
/// that were coerced to NaN or zero during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Reading {
    /// A reading with a raw extraction token attached.
    pub fn with_token(value: f64, token: impl Into<String>) -> Self {
        Self {
            value,
            token: Some(token.into()),
        }
    }

    /// `true` if the extractor evidently failed on the token: the value is
    /// NaN, or zero while the token does not read as zero.
    ///
    /// Such a value says nothing about the part, wherever it falls.
    pub fn is_coerced(&self) -> bool {
        let Some(token) = self.token.as_deref() else {
            return false;
        };
        self.value.is_nan()
            || (self.value == 0.0 && token.trim().parse::<f64>().map_or(true, |v| v != 0.0))
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Self { value, token: None }
    }
}

/// A labelled sequence of measurements for one inspected dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSet {
    pub label: String,
    pub spec_limits: SpecLimits,
    pub readings: Vec<Reading>,
}

impl MeasurementSet {
    /// Builds a set from plain values (no raw tokens).
    pub fn from_values(label: impl Into<String>, spec_limits: SpecLimits, values: &[f64]) -> Self {
        Self {
            label: label.into(),
            spec_limits,
            readings: values.iter().copied().map(Reading::from).collect(),
        }
    }

    /// The reading values in order.
    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }

    /// Checks the spec window and that at least one reading exists.
    pub fn validate(&self) -> Result<()> {
        self.spec_limits.validate()?;
        if self.readings.is_empty() {
            return Err(SpcError::insufficient("measurement set", 1, 0));
        }
        Ok(())
    }
}
