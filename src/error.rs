//! Error type shared by every analysis stage.

/// Errors returned by the analysis operations.
///
/// Every variant is recoverable at the call site. Degenerate numeric outcomes
/// (zero variance) are not errors; they are reported as undefined indices in
/// the results. Ambiguous corrections are likewise reported in the
/// [`CorrectionOutcome`](crate::correction::CorrectionOutcome), not here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpcError {
    /// The sample is too small for the requested operation.
    #[error("insufficient data for {operation}: need at least {required} values, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    /// Specification limits with `usl <= lsl` (or non-finite limits).
    #[error("invalid specification limits: USL ({usl}) must be greater than LSL ({lsl})")]
    InvalidSpec { usl: f64, lsl: f64 },

    /// No control-chart constants are registered for the subgroup size.
    #[error("no control-chart constants registered for subgroup size {size}")]
    UnsupportedSubgroupSize { size: usize },

    /// A NaN or infinite value reached an analysis stage.
    #[error("measurement at index {index} is not a finite number")]
    NonFiniteMeasurement { index: usize },

    /// Configuration failed to parse or validate.
    #[error("invalid configuration for {field}: {message}")]
    InvalidConfig { field: String, message: String },
}

impl SpcError {
    pub(crate) fn insufficient(operation: &'static str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            operation,
            required,
            actual,
        }
    }
}

/// Shorthand result type for this crate.
pub type Result<T> = std::result::Result<T, SpcError>;
