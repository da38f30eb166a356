//! Truncated-normal stream model.

use sf_core::array::ArrayNamespace;
use sf_core::data::Data;
use sf_core::params::{ClosedBounds, ParamBounds, ParamNameDecl, ParamNames, ParamScalers, Params};
use sf_core::prob::LnProbability;
use sf_core::traits::{scale_and_clip_output, Model, ParamGenerator, PriorPlugin};
use sf_core::{Error, Result};

use super::{ln_prior_from_bounds, resolve_indicator, validate_coords, CoordSpec};
use crate::stats::norm;

/// Stream component: per-coordinate normal density truncated to the
/// coordinate bounds, with `mu` and `sigma` parameters per coordinate.
pub struct NormalStream<A: ArrayNamespace> {
    coord_names: Vec<String>,
    coord_bounds: Vec<(f64, f64)>,
    param_names: ParamNames,
    param_bounds: ParamBounds,
    param_scalers: ParamScalers,
    priors: Vec<Box<dyn PriorPlugin<A>>>,
    net: Option<Box<dyn ParamGenerator<A>>>,
    require_mask: bool,
}

impl<A: ArrayNamespace> NormalStream<A> {
    /// Create a stream model over the given coordinates.
    ///
    /// Each coordinate declares `mu` (bounded to the coordinate support) and
    /// `sigma`. A model without a generator is frozen.
    pub fn new(
        coords: Vec<CoordSpec>,
        net: Option<Box<dyn ParamGenerator<A>>>,
        priors: Vec<Box<dyn PriorPlugin<A>>>,
        require_mask: bool,
    ) -> Result<Self> {
        validate_coords(&coords)?;

        let mut decls = vec![ParamNameDecl::Coord("weight".into())];
        let mut param_bounds = ParamBounds::new();
        param_bounds.insert("weight", ClosedBounds::new(0.0, 1.0)?);
        for c in &coords {
            decls.push(ParamNameDecl::WithSub {
                coord: c.name.clone(),
                params: vec!["mu".into(), "sigma".into()],
            });
            let (lo, hi) = c.bounds;
            param_bounds.insert(format!("{}.mu", c.name), ClosedBounds::new(lo, hi)?);
        }
        let param_names = ParamNames::new(decls)?;

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
            param_names,
            param_bounds,
            param_scalers: ParamScalers::new(),
            priors,
            net,
            require_mask,
        })
    }
}

impl<A: ArrayNamespace> LnProbability<A> for NormalStream<A> {
    fn ln_likelihood(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        let n = data.n_rows();
        let mut total = vec![0.0f64; n];

        for (coord, &(a, b)) in self.coord_names.iter().zip(&self.coord_bounds) {
            let indicator =
                A::to_vec(&resolve_indicator::<A>(coord, n, mask, self.require_mask)?);
            let xs = A::to_vec(data.column(coord)?);
            let mus = A::to_vec(mpars.get_sub(coord, "mu")?);
            let sigmas = A::to_vec(mpars.get_sub(coord, "sigma")?);

            for i in 0..n {
                if indicator[i] == 0.0 {
                    continue;
                }
                let sigma = sigmas[i];
                if !sigma.is_finite() || sigma <= 0.0 {
                    return Err(Error::Validation(format!(
                        "'{coord}.sigma' must be finite and > 0, got {sigma} at row {i}"
                    )));
                }
                total[i] += norm::ln_pdf_truncated(xs[i], mus[i], sigma, a, b, A::NEG_INF);
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

impl<A: ArrayNamespace> Model<A> for NormalStream<A> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sf_core::array::CpuBackend;
    use sf_core::params::ParamsBuilder;

    type Stream = NormalStream<CpuBackend>;

    fn data() -> Data<CpuBackend> {
        Data::from_columns(vec![("phi2".into(), vec![-0.5, 0.0, 0.5])]).unwrap()
    }

    fn params(mu: f64, sigma: f64) -> Params<Vec<f64>> {
        let mut b = ParamsBuilder::new();
        b.insert("weight", vec![0.5; 3]);
        b.insert_sub("phi2", "mu", vec![mu; 3]);
        b.insert_sub("phi2", "sigma", vec![sigma; 3]);
        b.freeze().unwrap()
    }

    #[test]
    fn test_matches_truncated_normal_kernel() {
        let model =
            Stream::new(vec![CoordSpec::new("phi2", (-1.0, 1.0))], None, vec![], false).unwrap();
        let lnlik = model.ln_likelihood(&params(0.2, 0.4), &data(), None).unwrap();
        for (i, &x) in [-0.5, 0.0, 0.5].iter().enumerate() {
            assert_relative_eq!(
                lnlik[i],
                norm::ln_pdf_truncated(x, 0.2, 0.4, -1.0, 1.0, f64::NEG_INFINITY),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn test_non_positive_sigma_fails() {
        let model =
            Stream::new(vec![CoordSpec::new("phi2", (-1.0, 1.0))], None, vec![], false).unwrap();
        let err = model.ln_likelihood(&params(0.0, 0.0), &data(), None);
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn test_mu_bounds_feed_the_prior() {
        let model =
            Stream::new(vec![CoordSpec::new("phi2", (-1.0, 1.0))], None, vec![], false).unwrap();
        let lp = model.ln_prior(&params(2.0, 0.4), &data()).unwrap();
        // mu outside the coordinate support is excluded everywhere
        assert!(lp.iter().all(|v| *v == f64::NEG_INFINITY));
        let lp = model.ln_prior(&params(0.2, 0.4), &data()).unwrap();
        assert!(lp.iter().all(|v| *v == 0.0));
    }
}
