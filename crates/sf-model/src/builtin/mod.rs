//! Built-in leaf models.

use sf_core::array::ArrayNamespace;
use sf_core::data::Data;
use sf_core::params::{ParamBounds, ParamNameDecl, ParamNames, Params};
use sf_core::{Error, Result};

mod exponential;
mod normal;

pub use self::exponential::ExponentialBackground;
pub use self::normal::NormalStream;

/// One data coordinate a leaf model reads, with its support bounds.
#[derive(Debug, Clone)]
pub struct CoordSpec {
    /// Column name in the data table.
    pub name: String,
    /// Support bounds `(low, high)` used for density normalization.
    pub bounds: (f64, f64),
}

impl CoordSpec {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, bounds: (f64, f64)) -> Self {
        Self { name: name.into(), bounds }
    }
}

pub(crate) fn validate_coords(coords: &[CoordSpec]) -> Result<()> {
    if coords.is_empty() {
        return Err(Error::Validation("model requires at least one coordinate".into()));
    }
    for c in coords {
        let (lo, hi) = c.bounds;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(Error::Validation(format!(
                "invalid bounds for coordinate '{}': expected low < high, got ({lo}, {hi})",
                c.name
            )));
        }
    }
    for (i, c) in coords.iter().enumerate() {
        if coords[..i].iter().any(|o| o.name == c.name) {
            return Err(Error::Validation(format!("duplicate coordinate '{}'", c.name)));
        }
    }
    Ok(())
}

/// Resolve the availability indicator for one coordinate.
///
/// A missing mask means all rows are available, unless the model requires an
/// explicit mask.
pub(crate) fn resolve_indicator<A: ArrayNamespace>(
    coord: &str,
    n_rows: usize,
    mask: Option<&Data<A>>,
    require_mask: bool,
) -> Result<A::Array> {
    match mask {
        Some(mask) => {
            let indicator = mask.column(coord)?;
            if A::len(indicator) != n_rows {
                return Err(Error::Validation(format!(
                    "mask length mismatch for '{coord}': expected {n_rows}, got {}",
                    A::len(indicator)
                )));
            }
            Ok(indicator.clone())
        }
        None if require_mask => Err(Error::Validation("mask is required".into())),
        None => Ok(A::ones(n_rows)),
    }
}

/// Base elementwise log-prior from declared parameter bounds: rows where any
/// declared parameter leaves its range contribute `-inf`.
pub(crate) fn ln_prior_from_bounds<A: ArrayNamespace>(
    names: &ParamNames,
    bounds: &ParamBounds,
    mpars: &Params<A::Array>,
    n_rows: usize,
) -> Result<A::Array> {
    let mut lp = A::zeros(n_rows);
    let ones = A::ones(n_rows);
    for decl in names.decls() {
        match decl {
            ParamNameDecl::Coord(coord) => {
                if let Some(b) = bounds.get(coord) {
                    let value = mpars.get(coord)?;
                    let outside = A::sub(&ones, &A::within(value, b.lower, b.upper));
                    lp = A::where_set(&lp, &outside, A::NEG_INF);
                }
            }
            ParamNameDecl::WithSub { coord, params } => {
                for name in params {
                    let flat = format!("{coord}.{name}");
                    if let Some(b) = bounds.get(&flat) {
                        let value = mpars.get_sub(coord, name)?;
                        let outside = A::sub(&ones, &A::within(value, b.lower, b.upper));
                        lp = A::where_set(&lp, &outside, A::NEG_INF);
                    }
                }
            }
        }
    }
    Ok(lp)
}
