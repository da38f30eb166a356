//! Exponential background model, tilted separately in each coordinate.

use sf_core::array::ArrayNamespace;
use sf_core::data::Data;
use sf_core::params::{ClosedBounds, ParamBounds, ParamNameDecl, ParamNames, ParamScalers, Params};
use sf_core::prob::LnProbability;
use sf_core::traits::{scale_and_clip_output, Model, ParamGenerator, PriorPlugin};
use sf_core::{Error, Result};

use super::{ln_prior_from_bounds, resolve_indicator, validate_coords, CoordSpec};
use crate::stats::{exponential, uniform};

/// Background component with a tilted exponential density per coordinate.
///
/// Each coordinate with a declared `slope` parameter `m` follows the bounded
/// exponential on its coordinate bounds; a coordinate with no declared slope
/// is treated as having slope exactly zero, i.e. uniform. Per-coordinate
/// contributions are masked by the availability indicator and summed to one
/// log-likelihood per row.
pub struct ExponentialBackground<A: ArrayNamespace> {
    coord_names: Vec<String>,
    coord_bounds: Vec<(f64, f64)>,
    coord_err_names: Option<Vec<String>>,
    param_names: ParamNames,
    param_bounds: ParamBounds,
    param_scalers: ParamScalers,
    priors: Vec<Box<dyn PriorPlugin<A>>>,
    net: Option<Box<dyn ParamGenerator<A>>>,
    require_mask: bool,
}

impl<A: ArrayNamespace> ExponentialBackground<A> {
    /// Create a background model.
    ///
    /// `slope_coords` selects which coordinates declare a `slope` parameter;
    /// the rest stay uniform. A model without a generator is frozen: its
    /// forward pass contributes no columns.
    pub fn new(
        coords: Vec<CoordSpec>,
        slope_coords: &[&str],
        net: Option<Box<dyn ParamGenerator<A>>>,
        priors: Vec<Box<dyn PriorPlugin<A>>>,
        require_mask: bool,
    ) -> Result<Self> {
        validate_coords(&coords)?;
        for s in slope_coords {
            if !coords.iter().any(|c| c.name == *s) {
                return Err(Error::Validation(format!(
                    "slope coordinate '{s}' is not a declared coordinate"
                )));
            }
        }

        let mut decls = vec![ParamNameDecl::Coord("weight".into())];
        for c in &coords {
            if slope_coords.contains(&c.name.as_str()) {
                decls.push(ParamNameDecl::WithSub {
                    coord: c.name.clone(),
                    params: vec!["slope".into()],
                });
            }
        }
        let param_names = ParamNames::new(decls)?;

        let mut param_bounds = ParamBounds::new();
        param_bounds.insert("weight", ClosedBounds::new(0.0, 1.0)?);

        if let Some(net) = &net {
            if net.n_outputs() != param_names.n_flat() {
                return Err(Error::Validation(format!(
                    "generator output width mismatch: expected {}, got {}",
                    param_names.n_flat(),
                    net.n_outputs()
                )));
            }
        }

        let coord_names = coords.iter().map(|c| c.name.clone()).collect();
        let coord_bounds = coords.iter().map(|c| c.bounds).collect();
        Ok(Self {
            coord_names,
            coord_bounds,
            coord_err_names: None,
            param_names,
            param_bounds,
            param_scalers: ParamScalers::new(),
            priors,
            net,
            require_mask,
        })
    }

    /// Declare per-coordinate measurement-error columns.
    ///
    /// The convolved likelihood for this configuration is not available;
    /// evaluation fails deterministically instead of producing a wrong
    /// result.
    pub fn with_coord_errors(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.coord_names.len() {
            return Err(Error::Validation(format!(
                "expected {} error columns, got {}",
                self.coord_names.len(),
                names.len()
            )));
        }
        self.coord_err_names = Some(names);
        Ok(self)
    }
}

impl<A: ArrayNamespace> LnProbability<A> for ExponentialBackground<A> {
    fn ln_likelihood(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        if self.coord_err_names.is_some() {
            return Err(Error::NotImplemented(
                "exponential background with per-coordinate measurement errors".into(),
            ));
        }

        let n = data.n_rows();
        let mut total = vec![0.0f64; n];

        for (coord, &(a, b)) in self.coord_names.iter().zip(&self.coord_bounds) {
            let indicator =
                A::to_vec(&resolve_indicator::<A>(coord, n, mask, self.require_mask)?);
            let xs = A::to_vec(data.column(coord)?);

            // An undeclared slope is exactly zero (uniform limit).
            let slopes = if self.param_names.contains_sub(coord, "slope") {
                Some(A::to_vec(mpars.get_sub(coord, "slope")?))
            } else {
                None
            };

            for i in 0..n {
                if indicator[i] == 0.0 {
                    continue;
                }
                let m = slopes.as_ref().map_or(0.0, |s| s[i]);
                total[i] += if m == 0.0 {
                    uniform::ln_pdf(xs[i], a, b, A::NEG_INF)
                } else {
                    exponential::ln_pdf(xs[i], m, a, b, A::NEG_INF)
                };
            }
        }

        Ok(A::from_vec(total))
    }

    fn ln_prior(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<A::Array> {
        let mut lp = ln_prior_from_bounds::<A>(
            &self.param_names,
            &self.param_bounds,
            mpars,
            data.n_rows(),
        )?;
        for prior in &self.priors {
            lp = prior.ln_prior(&lp, mpars, data, self)?;
        }
        Ok(lp)
    }
}

impl<A: ArrayNamespace> Model<A> for ExponentialBackground<A> {
    fn param_names(&self) -> &ParamNames {
        &self.param_names
    }

    fn param_bounds(&self) -> &ParamBounds {
        &self.param_bounds
    }

    fn param_scalers(&self) -> &ParamScalers {
        &self.param_scalers
    }

    fn coord_names(&self) -> &[String] {
        &self.coord_names
    }

    fn forward(&self, batch: &Data<A>) -> Result<A::Matrix> {
        let Some(net) = &self.net else {
            return Ok(A::matrix_empty(batch.n_rows()));
        };
        let raw = net.forward(batch)?;
        if A::n_rows(&raw) != batch.n_rows() {
            return Err(Error::Validation(format!(
                "generator row mismatch: expected {}, got {}",
                batch.n_rows(),
                A::n_rows(&raw)
            )));
        }
        let mut out = scale_and_clip_output::<A>(
            &raw,
            &self.param_names,
            &self.param_bounds,
            &self.param_scalers,
        )?;
        for prior in &self.priors {
            out = prior.forward(&out, batch, self)?;
        }
        Ok(out)
    }
}
