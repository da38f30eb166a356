//! Hard weight threshold inside a coordinate window.

use sf_core::array::ArrayNamespace;
use sf_core::data::Data;
use sf_core::params::Params;
use sf_core::traits::{Model, PriorPlugin};
use sf_core::{Error, Result};

/// Suppress a component wherever its weight falls below a threshold inside a
/// coordinate window.
///
/// As a log-prior adjustment, rows with the coordinate in `[lower, upper]`
/// and the weight below `threshold` are forced to `-inf`; other rows pass the
/// running total through unchanged. As a forward transform, the weight column
/// (located by flat name in the owning model's parameter index) is
/// hard-thresholded: values below the cutoff become zero, others pass
/// through. When no row falls inside the window, the whole column is
/// thresholded.
#[derive(Debug, Clone)]
pub struct BoundedHardThreshold {
    threshold: f64,
    param_name: String,
    coord_name: String,
    lower: f64,
    upper: f64,
}

impl BoundedHardThreshold {
    /// Create a threshold prior on `param_name` over the window
    /// `[lower, upper]` of `coord_name`.
    pub fn new(
        threshold: f64,
        param_name: impl Into<String>,
        coord_name: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(Error::Validation(format!(
                "threshold must be finite, got {threshold}"
            )));
        }
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(Error::Validation(format!(
                "invalid window: expected lower <= upper, got ({lower}, {upper})"
            )));
        }
        Ok(Self {
            threshold,
            param_name: param_name.into(),
            coord_name: coord_name.into(),
            lower,
            upper,
        })
    }

    /// Threshold applied over the whole coordinate range.
    pub fn unbounded(
        threshold: f64,
        param_name: impl Into<String>,
        coord_name: impl Into<String>,
    ) -> Result<Self> {
        Self::new(threshold, param_name, coord_name, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// The cutoff value.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<A: ArrayNamespace> PriorPlugin<A> for BoundedHardThreshold {
    fn ln_prior(
        &self,
        current: &A::Array,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        _model: &dyn Model<A>,
    ) -> Result<A::Array> {
        let weight = mpars.get(&self.param_name)?;
        let coord = data.column(&self.coord_name)?;
        let in_window = A::within(coord, self.lower, self.upper);
        let below = A::lt(weight, self.threshold);
        let suppressed = A::mul(&in_window, &below);
        Ok(A::where_set(current, &suppressed, A::NEG_INF))
    }

    fn forward(
        &self,
        output: &A::Matrix,
        batch: &Data<A>,
        model: &dyn Model<A>,
    ) -> Result<A::Matrix> {
        let j = model.param_names().flat_index(&self.param_name).ok_or_else(|| {
            Error::KeyLookup(format!("no parameter '{}' in model index", self.param_name))
        })?;

        let coord = batch.column(&self.coord_name)?;
        let in_window = A::within(coord, self.lower, self.upper);
        let column = A::column(output, j)?;
        let below = A::lt(&column, self.threshold);

        let zeroed = if A::any(&in_window) {
            A::mul(&in_window, &below)
        } else {
            below
        };
        let thresholded = A::where_set(&column, &zeroed, 0.0);
        A::with_column(output, j, &thresholded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{CoordSpec, NormalStream};
    use crate::mixture::MixtureModel;
    use sf_core::array::CpuBackend;
    use sf_core::params::ParamsBuilder;

    fn host_model() -> MixtureModel<CpuBackend> {
        let stream =
            NormalStream::new(vec![CoordSpec::new("phi1", (-2.0, 2.0))], None, vec![], false)
                .unwrap();
        MixtureModel::new(
            vec![("stream".into(), Box::new(stream) as Box<dyn Model<CpuBackend>>)],
            vec![],
        )
        .unwrap()
    }

    fn data() -> Data<CpuBackend> {
        Data::from_columns(vec![("phi1".into(), vec![-1.0, 0.0, 1.0, 3.0])]).unwrap()
    }

    fn params(weights: Vec<f64>) -> Params<Vec<f64>> {
        let n = weights.len();
        let mut b = ParamsBuilder::new();
        b.insert("stream.weight", weights);
        b.insert_sub("stream.phi1", "mu", vec![0.0; n]);
        b.insert_sub("stream.phi1", "sigma", vec![1.0; n]);
        b.freeze().unwrap()
    }

    #[test]
    fn test_ln_prior_suppresses_below_threshold_in_window() {
        let prior =
            BoundedHardThreshold::new(0.005, "stream.weight", "phi1", -2.0, 2.0).unwrap();
        let model = host_model();
        let current = vec![0.0; 4];
        let eps = 1e-6;

        let lp = prior
            .ln_prior(&current, &params(vec![0.005 - eps; 4]), &data(), &model)
            .unwrap();
        // rows 0-2 sit inside the window, row 3 outside
        assert_eq!(lp, vec![f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0]);

        let lp = prior
            .ln_prior(&current, &params(vec![0.005 + eps; 4]), &data(), &model)
            .unwrap();
        assert_eq!(lp, vec![0.0; 4]);
    }

    #[test]
    fn test_ln_prior_folds_running_total() {
        let prior =
            BoundedHardThreshold::new(0.005, "stream.weight", "phi1", -2.0, 2.0).unwrap();
        let model = host_model();
        let current = vec![-1.0, -2.0, -3.0, -4.0];
        let lp = prior.ln_prior(&current, &params(vec![0.5; 4]), &data(), &model).unwrap();
        // nothing suppressed: the running total passes through
        assert_eq!(lp, current);
    }

    #[test]
    fn test_forward_thresholds_only_in_window() {
        let prior = BoundedHardThreshold::new(0.3, "stream.weight", "phi1", -2.0, 2.0).unwrap();
        let model = host_model();
        // columns: weight, mu, sigma
        let out = CpuBackend::matrix_from_vec(
            vec![
                0.1, 0.0, 1.0, //
                0.4, 0.0, 1.0, //
                0.2, 0.0, 1.0, //
                0.1, 0.0, 1.0, //
            ],
            4,
            3,
        )
        .unwrap();
        let transformed = prior.forward(&out, &data(), &model).unwrap();
        // row 3 is outside the window and keeps its sub-threshold weight
        assert_eq!(CpuBackend::column(&transformed, 0).unwrap(), vec![0.0, 0.4, 0.0, 0.1]);
        // other columns untouched
        assert_eq!(CpuBackend::column(&transformed, 1).unwrap(), vec![0.0; 4]);
        assert_eq!(CpuBackend::column(&transformed, 2).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn test_forward_thresholds_everywhere_when_window_is_empty() {
        let prior = BoundedHardThreshold::new(0.3, "stream.weight", "phi1", 10.0, 20.0).unwrap();
        let model = host_model();
        let out = CpuBackend::matrix_from_vec(
            vec![
                0.1, 0.0, 1.0, //
                0.4, 0.0, 1.0, //
                0.2, 0.0, 1.0, //
                0.1, 0.0, 1.0, //
            ],
            4,
            3,
        )
        .unwrap();
        let transformed = prior.forward(&out, &data(), &model).unwrap();
        assert_eq!(CpuBackend::column(&transformed, 0).unwrap(), vec![0.0, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_forward_unknown_parameter_fails() {
        let prior = BoundedHardThreshold::unbounded(0.3, "halo.weight", "phi1").unwrap();
        let model = host_model();
        let out = CpuBackend::matrix_from_vec(vec![0.0; 12], 4, 3).unwrap();
        let err = PriorPlugin::<CpuBackend>::forward(&prior, &out, &data(), &model);
        assert!(matches!(err, Err(Error::KeyLookup(_))));
    }
}
