//! Acquisition-error heuristics.
//!
//! Each heuristic looks at one reading in isolation and proposes at most one
//! replacement value per interpretation. A proposal only counts if it lands
//! inside the plausible band; the corrector decides what to do when several
//! heuristics disagree.

use serde::{Deserialize, Serialize};

use crate::measurement::SpecLimits;

/// Why a value was (or could be) corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionReason {
    /// The decimal point was lost, e.g. `105` read for `10.5`.
    MissingDecimal,
    /// Unit or stray characters trailing the number, e.g. `10.5mm`.
    UnitNoise,
    /// Letters read in place of look-alike digits, e.g. `1O.5`.
    CharSubstitution,
}

/// One possible interpretation of a suspicious reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionCandidate {
    pub reason: CorrectionReason,
    pub value: f64,
}

/// Closed interval `[lsl - margin, usl + margin]` of believable values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PlausibleBand {
    lo: f64,
    hi: f64,
}

impl PlausibleBand {
    /// Expands the spec window by `margin * (usl - lsl)` on both sides.
    pub(crate) fn around(spec: &SpecLimits, margin: f64) -> Self {
        let pad = margin * spec.tolerance();
        Self {
            lo: spec.lsl - pad,
            hi: spec.usl + pad,
        }
    }

    pub(crate) fn contains(&self, x: f64) -> bool {
        x.is_finite() && x >= self.lo && x <= self.hi
    }
}

/// Divides by `10^k` for `k` in `1..=max_shift`, keeping every in-band result.
pub(crate) fn missing_decimal(value: f64, band: &PlausibleBand, max_shift: u32) -> Vec<f64> {
    if !value.is_finite() || value == 0.0 {
        return Vec::new();
    }
    (1..=max_shift)
        .map(|k| value / 10f64.powi(k as i32))
        .filter(|&v| band.contains(v))
        .collect()
}

/// Recovers the numeric prefix of a token with trailing junk, when the
/// extractor coerced the token to NaN or zero.
pub(crate) fn unit_noise(value: f64, token: &str, band: &PlausibleBand) -> Option<f64> {
    if !(value.is_nan() || value == 0.0) {
        return None;
    }
    let token = token.trim();
    let split = numeric_prefix_len(token);
    let (prefix, rest) = token.split_at(split);
    if prefix.is_empty() || rest.trim().is_empty() {
        return None;
    }
    prefix
        .parse::<f64>()
        .ok()
        .filter(|&v| band.contains(v))
}

/// Replaces look-alike letters with digits and parses the result.
pub(crate) fn char_substitution(token: &str, band: &PlausibleBand) -> Option<f64> {
    let token = token.trim();
    let mut substituted = false;
    let mapped: String = token
        .chars()
        .map(|c| match confusable_digit(c) {
            Some(d) => {
                substituted = true;
                d
            }
            None => c,
        })
        .collect();
    if !substituted {
        return None;
    }
    mapped.parse::<f64>().ok().filter(|&v| band.contains(v))
}

// Letters commonly misread for digits by OCR.
fn confusable_digit(c: char) -> Option<char> {
    let d = match c {
        'O' | 'o' | 'D' | 'Q' => '0',
        'I' | 'l' | '|' => '1',
        'Z' | 'z' => '2',
        'A' => '4',
        'S' | 's' => '5',
        'G' | 'b' => '6',
        'T' => '7',
        'B' => '8',
        'g' | 'q' => '9',
        _ => return None,
    };
    Some(d)
}

// Byte length of the leading `[+-]?digits[.digits]` run.
fn numeric_prefix_len(s: &str) -> usize {
    let mut seen_dot = false;
    let mut seen_digit = false;
    let mut end = 0;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if seen_digit {
        end
    } else {
        0
    }
}
