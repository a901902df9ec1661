//! Control chart factor table keyed by subgroup size.
//!
//! The standard entries (n = 2..=10) are sourced from ASTM E2587,
//! Standard Practice for Use of Control Charts in Statistical Process
//! Control. Further sizes are plain data: register them with
//! [`ControlConstantsTable::register`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpcError};

/// Factors relating subgroup ranges to control limits and sigma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlConstants {
    /// X-bar limits: `x̿ ± A2 · R̄`.
    pub a2: f64,
    /// R chart lower limit: `D3 · R̄`.
    pub d3: f64,
    /// R chart upper limit: `D4 · R̄`.
    pub d4: f64,
    /// Mean of the relative range; `σ̂ = R̄ / d2`.
    pub d2: f64,
}

// (n, A2, D3, D4, d2), ASTM E2587.
const STANDARD: [(usize, f64, f64, f64, f64); 9] = [
    (2, 1.880, 0.0, 3.267, 1.128),
    (3, 1.023, 0.0, 2.575, 1.693),
    (4, 0.729, 0.0, 2.282, 2.059),
    (5, 0.577, 0.0, 2.114, 2.326),
    (6, 0.483, 0.0, 2.004, 2.534),
    (7, 0.419, 0.076, 1.924, 2.704),
    (8, 0.373, 0.136, 1.864, 2.847),
    (9, 0.337, 0.184, 1.816, 2.970),
    (10, 0.308, 0.223, 1.777, 3.078),
];

/// Size-keyed table of [`ControlConstants`].
///
/// # Examples
///
/// ```
/// use u_spc::spc::{ControlConstants, ControlConstantsTable};
///
/// let mut table = ControlConstantsTable::standard();
/// assert!((table.get(5).unwrap().d4 - 2.114).abs() < 1e-12);
/// assert!(table.get(11).is_err());
///
/// table.register(11, ControlConstants { a2: 0.285, d3: 0.256, d4: 1.744, d2: 3.173 });
/// assert!(table.get(11).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConstantsTable {
    entries: BTreeMap<usize, ControlConstants>,
}

impl ControlConstantsTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// The ASTM E2587 factors for n = 2..=10.
    pub fn standard() -> Self {
        let entries = STANDARD
            .iter()
            .map(|&(n, a2, d3, d4, d2)| (n, ControlConstants { a2, d3, d4, d2 }))
            .collect();
        Self { entries }
    }

    /// Adds or replaces the entry for `size`, returning the previous one.
    pub fn register(&mut self, size: usize, constants: ControlConstants) -> Option<ControlConstants> {
        self.entries.insert(size, constants)
    }

    /// Looks up the constants for `size`.
    ///
    /// # Errors
    ///
    /// [`SpcError::UnsupportedSubgroupSize`] if no entry exists.
    pub fn get(&self, size: usize) -> Result<ControlConstants> {
        self.entries
            .get(&size)
            .copied()
            .ok_or(SpcError::UnsupportedSubgroupSize { size })
    }

    /// Registered subgroup sizes in ascending order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for ControlConstantsTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_covers_two_to_ten() {
        let table = ControlConstantsTable::standard();
        let sizes: Vec<usize> = table.sizes().collect();
        assert_eq!(sizes, (2..=10).collect::<Vec<_>>());
    }

    #[test]
    fn n5_factors() {
        let c = ControlConstantsTable::standard().get(5).unwrap();
        assert!((c.a2 - 0.577).abs() < f64::EPSILON);
        assert_eq!(c.d3, 0.0);
        assert!((c.d4 - 2.114).abs() < f64::EPSILON);
        assert!((c.d2 - 2.326).abs() < f64::EPSILON);
    }

    #[test]
    fn d3_nonzero_from_seven() {
        let table = ControlConstantsTable::standard();
        for n in 2..=6 {
            assert_eq!(table.get(n).unwrap().d3, 0.0, "n = {n}");
        }
        for n in 7..=10 {
            assert!(table.get(n).unwrap().d3 > 0.0, "n = {n}");
        }
    }

    #[test]
    fn unsupported_size() {
        let table = ControlConstantsTable::standard();
        assert_eq!(
            table.get(1),
            Err(SpcError::UnsupportedSubgroupSize { size: 1 })
        );
        assert!(ControlConstantsTable::empty().get(5).is_err());
    }

    #[test]
    fn register_replaces_entry() {
        let mut table = ControlConstantsTable::standard();
        let custom = ControlConstants {
            a2: 0.5,
            d3: 0.0,
            d4: 2.0,
            d2: 2.5,
        };
        let previous = table.register(5, custom);
        assert!((previous.unwrap().d4 - 2.114).abs() < f64::EPSILON);
        assert_eq!(table.get(5).unwrap(), custom);
    }
}
