//! Scaling transforms between generator outputs and physical parameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A scalar transform applied to one flat parameter column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamScaler {
    /// No transformation.
    Identity,
    /// `offset + scale * x`.
    Linear {
        /// Multiplicative factor (non-zero).
        scale: f64,
        /// Additive shift.
        offset: f64,
    },
}

impl ParamScaler {
    /// Create a linear scaler, rejecting degenerate factors.
    pub fn linear(scale: f64, offset: f64) -> Result<Self> {
        if !scale.is_finite() || scale == 0.0 || !offset.is_finite() {
            return Err(Error::Validation(format!(
                "linear scaler requires finite non-zero scale, got scale={scale}, offset={offset}"
            )));
        }
        Ok(Self::Linear { scale, offset })
    }

    /// Map a generator-space value to the physical parameter space.
    pub fn transform(&self, x: f64) -> f64 {
        match *self {
            Self::Identity => x,
            Self::Linear { scale, offset } => offset + scale * x,
        }
    }

    /// Map a physical value back to generator space.
    pub fn inverse(&self, x: f64) -> f64 {
        match *self {
            Self::Identity => x,
            Self::Linear { scale, offset } => (x - offset) / scale,
        }
    }
}

/// Map from flat parameter names to scalers; absent names are identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamScalers {
    map: HashMap<String, ParamScaler>,
}

impl ParamScalers {
    /// Empty set: every parameter identity-scaled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scaler for a flat parameter name.
    pub fn insert(&mut self, name: impl Into<String>, scaler: ParamScaler) -> &mut Self {
        self.map.insert(name.into(), scaler);
        self
    }

    /// Scaler for a flat name; identity when undeclared.
    pub fn get(&self, name: &str) -> ParamScaler {
        self.map.get(name).copied().unwrap_or(ParamScaler::Identity)
    }

    /// Copy with every name prefixed as `prefix.name`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let map = self
            .map
            .iter()
            .map(|(name, scaler)| (format!("{prefix}.{name}"), *scaler))
            .collect();
        Self { map }
    }

    /// Merge several scaler sets; later entries win on collision.
    pub fn merged(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut map = HashMap::new();
        for part in parts {
            map.extend(part.map);
        }
        Self { map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_roundtrip() {
        let s = ParamScaler::linear(2.0, -1.0).unwrap();
        let y = s.transform(0.25);
        assert_relative_eq!(y, -0.5, epsilon = 1e-12);
        assert_relative_eq!(s.inverse(y), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(ParamScaler::linear(0.0, 0.0).is_err());
    }

    #[test]
    fn test_undeclared_is_identity() {
        let scalers = ParamScalers::new();
        assert_eq!(scalers.get("weight"), ParamScaler::Identity);
    }
}
