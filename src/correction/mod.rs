//! Data-quality validation ahead of the statistics.
//!
//! - [`detect_outliers`] — z-score flags (advisory; values are kept)
//! - [`DataCorrector`] — proposals for acquisition errors (missing decimal
//!   point, unit noise, look-alike characters), never discarding originals

mod corrector;
mod heuristics;
mod outliers;

pub use corrector::{
    CorrectionOutcome, CorrectionRecord, DataCorrector, UnresolvedReason, UnresolvedValue,
};
pub use heuristics::{CorrectionCandidate, CorrectionReason};
pub use outliers::{detect_outliers, OutlierFlag, DEFAULT_OUTLIER_THRESHOLD};
