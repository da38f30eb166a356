//! Valid numeric ranges for declared parameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosedBounds {
    /// Lower edge (may be `-inf`).
    pub lower: f64,
    /// Upper edge (may be `+inf`).
    pub upper: f64,
}

impl ClosedBounds {
    /// Create bounds, rejecting NaN edges and inverted intervals.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(Error::Validation(format!(
                "invalid bounds: expected lower <= upper, got ({lower}, {upper})"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Unbounded interval.
    pub fn unbounded() -> Self {
        Self { lower: f64::NEG_INFINITY, upper: f64::INFINITY }
    }

    /// True if `x` lies inside the interval.
    pub fn contains(&self, x: f64) -> bool {
        self.lower <= x && x <= self.upper
    }

    /// `x` clipped to the interval.
    pub fn clip(&self, x: f64) -> f64 {
        x.clamp(self.lower, self.upper)
    }
}

/// Map from flat parameter names to their valid ranges.
///
/// Absent names are treated as unbounded; this is declared metadata
/// defaulting, distinct from [`crate::params::Params`] lookups, which never
/// default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    map: HashMap<String, ClosedBounds>,
}

impl ParamBounds {
    /// Empty set: every parameter unbounded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bounds for a flat parameter name.
    pub fn insert(&mut self, name: impl Into<String>, bounds: ClosedBounds) -> &mut Self {
        self.map.insert(name.into(), bounds);
        self
    }

    /// Declared bounds for a flat name, if any.
    pub fn get(&self, name: &str) -> Option<&ClosedBounds> {
        self.map.get(name)
    }

    /// Copy with every name prefixed as `prefix.name`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let map = self
            .map
            .iter()
            .map(|(name, bounds)| (format!("{prefix}.{name}"), *bounds))
            .collect();
        Self { map }
    }

    /// Merge several bound sets; later entries win on collision.
    pub fn merged(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut map = HashMap::new();
        for part in parts {
            map.extend(part.map);
        }
        Self { map }
    }
}
