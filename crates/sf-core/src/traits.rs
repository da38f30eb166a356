//! Core traits for streamfit
//!
//! This module defines the trait seams that keep model logic independent of
//! concrete collaborators: parameter-generating networks plug in behind
//! [`ParamGenerator`], and post-hoc constraints plug in behind
//! [`PriorPlugin`].

use crate::array::ArrayNamespace;
use crate::data::Data;
use crate::params::{
    ParamBounds, ParamNameDecl, ParamNames, ParamScaler, ParamScalers, Params, ParamsBuilder,
};
use crate::prob::LnProbability;
use crate::{Error, Result};

/// A mixture component: probability operations plus the construction-time
/// parameter index and the forward parameter-prediction pass.
pub trait Model<A: ArrayNamespace>: LnProbability<A> {
    /// Declared parameter structure (fixes forward-output column order).
    fn param_names(&self) -> &ParamNames;

    /// Declared parameter ranges.
    fn param_bounds(&self) -> &ParamBounds;

    /// Declared parameter scalers.
    fn param_scalers(&self) -> &ParamScalers;

    /// Data coordinates this model reads.
    fn coord_names(&self) -> &[String];

    /// Forward parameter-prediction pass over an input batch.
    ///
    /// A model with no free parameters returns a zero-width matrix.
    fn forward(&self, batch: &Data<A>) -> Result<A::Matrix>;

    /// Restructure a forward-pass output into a [`Params`] container.
    ///
    /// Columns are consumed in flat declaration order; the width must match
    /// [`ParamNames::n_flat`].
    fn unpack_params(&self, arr: &A::Matrix) -> Result<Params<A::Array>> {
        let names = self.param_names();
        if A::n_cols(arr) != names.n_flat() {
            return Err(Error::Validation(format!(
                "forward output width mismatch: expected {}, got {}",
                names.n_flat(),
                A::n_cols(arr)
            )));
        }

        let mut builder = ParamsBuilder::new();
        let mut j = 0;
        for decl in names.decls() {
            match decl {
                ParamNameDecl::Coord(coord) => {
                    builder.insert(coord.clone(), A::column(arr, j)?);
                    j += 1;
                }
                ParamNameDecl::WithSub { coord, params } => {
                    for name in params {
                        builder.insert_sub(coord.clone(), name.clone(), A::column(arr, j)?);
                        j += 1;
                    }
                }
            }
        }
        builder.freeze()
    }

    /// Inverse of [`Model::unpack_params`]: pack a container back into a
    /// flat-ordered matrix.
    fn pack_params(&self, mpars: &Params<A::Array>) -> Result<A::Matrix> {
        let names = self.param_names();
        let mut columns = Vec::with_capacity(names.n_flat());
        for decl in names.decls() {
            match decl {
                ParamNameDecl::Coord(coord) => columns.push(mpars.get(coord)?.clone()),
                ParamNameDecl::WithSub { coord, params } => {
                    for name in params {
                        columns.push(mpars.get_sub(coord, name)?.clone());
                    }
                }
            }
        }
        A::stack(&columns)
    }
}

/// Seam to the parameter-generating networks living outside this workspace.
pub trait ParamGenerator<A: ArrayNamespace>: Send + Sync {
    /// Output width (number of flat parameters produced).
    fn n_outputs(&self) -> usize;

    /// Produce an `(n_rows, n_outputs)` prediction for an input batch.
    fn forward(&self, batch: &Data<A>) -> Result<A::Matrix>;
}

/// Trivial generator broadcasting one fixed row to every data row.
///
/// Useful for frozen models and as a stand-in where no trained network is
/// wired up.
#[derive(Debug, Clone)]
pub struct ConstantGenerator {
    row: Vec<f64>,
}

impl ConstantGenerator {
    /// Create a generator that repeats `row` for every input row.
    pub fn new(row: Vec<f64>) -> Self {
        Self { row }
    }
}

impl<A: ArrayNamespace> ParamGenerator<A> for ConstantGenerator {
    fn n_outputs(&self) -> usize {
        self.row.len()
    }

    fn forward(&self, batch: &Data<A>) -> Result<A::Matrix> {
        let n = batch.n_rows();
        let mut data = Vec::with_capacity(n * self.row.len());
        for _ in 0..n {
            data.extend_from_slice(&self.row);
        }
        A::matrix_from_vec(data, n, self.row.len())
    }
}

/// A post-hoc constraint owned by a model, with two application modes.
///
/// Plugins receive the owning model and the full parameter container, so a
/// plugin may address parameters outside its own declaration scope (a
/// thresholding prior locates the mixture weight through the combined
/// parameter-name index). This reach is intentional, not incidental.
pub trait PriorPlugin<A: ArrayNamespace>: Send + Sync {
    /// Log-probability adjustment: fold the running elementwise log-prior
    /// into an updated running total.
    fn ln_prior(
        &self,
        current: &A::Array,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        model: &dyn Model<A>,
    ) -> Result<A::Array>;

    /// Forward-pass transform: fold the running parameter-prediction matrix
    /// into an updated matrix.
    fn forward(
        &self,
        output: &A::Matrix,
        batch: &Data<A>,
        model: &dyn Model<A>,
    ) -> Result<A::Matrix>;
}

/// Apply scalers and bound clipping to a raw generator output, column by
/// column in flat declaration order.
pub fn scale_and_clip_output<A: ArrayNamespace>(
    raw: &A::Matrix,
    names: &ParamNames,
    bounds: &ParamBounds,
    scalers: &ParamScalers,
) -> Result<A::Matrix> {
    if A::n_cols(raw) != names.n_flat() {
        return Err(Error::Validation(format!(
            "generator output width mismatch: expected {}, got {}",
            names.n_flat(),
            A::n_cols(raw)
        )));
    }
    let mut out = raw.clone();
    for (j, flat) in names.flat().iter().enumerate() {
        let scaler = scalers.get(flat);
        let clip = bounds.get(flat);
        if scaler == ParamScaler::Identity && clip.is_none() {
            continue;
        }
        let col = A::to_vec(&A::column(&out, j)?);
        let mapped = col
            .into_iter()
            .map(|v| {
                let v = scaler.transform(v);
                match clip {
                    Some(b) => b.clip(v),
                    None => v,
                }
            })
            .collect();
        out = A::with_column(&out, j, &A::from_vec(mapped))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::CpuBackend;
    use crate::params::{ClosedBounds, ParamScaler};

    #[test]
    fn test_constant_generator_broadcasts() {
        let data =
            Data::<CpuBackend>::from_columns(vec![("x".into(), vec![1.0, 2.0, 3.0])]).unwrap();
        let gen = ConstantGenerator::new(vec![0.5, -1.0]);
        let out = ParamGenerator::<CpuBackend>::forward(&gen, &data).unwrap();
        assert_eq!(CpuBackend::n_rows(&out), 3);
        assert_eq!(CpuBackend::n_cols(&out), 2);
        assert_eq!(CpuBackend::column(&out, 1).unwrap(), vec![-1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_scale_and_clip_output() {
        let names = ParamNames::new(vec![ParamNameDecl::Coord("weight".into())]).unwrap();
        let mut bounds = ParamBounds::new();
        bounds.insert("weight", ClosedBounds::new(0.0, 1.0).unwrap());
        let mut scalers = ParamScalers::new();
        scalers.insert("weight", ParamScaler::linear(2.0, 0.0).unwrap());

        let raw = CpuBackend::matrix_from_vec(vec![0.25, 0.75, -0.5], 3, 1).unwrap();
        let out =
            scale_and_clip_output::<CpuBackend>(&raw, &names, &bounds, &scalers).unwrap();
        // 2x scale then clipped to [0, 1]
        assert_eq!(CpuBackend::column(&out, 0).unwrap(), vec![0.5, 1.0, 0.0]);
    }
}
