//! The probability protocol every model satisfies.
//!
//! A concrete model implements the elementwise log operations of
//! [`LnProbability`]; the total and direct-probability variants are derived
//! mechanically by blanket extension traits, so `likelihood` is always
//! `exp(ln_likelihood)` and every `*_tot` is the row sum of its elementwise
//! form.

use crate::array::ArrayNamespace;
use crate::data::Data;
use crate::params::Params;
use crate::Result;

/// Elementwise log-probability operations, one value per data row.
pub trait LnProbability<A: ArrayNamespace>: Send + Sync {
    /// Elementwise log-likelihood `ln p(X | theta)`.
    ///
    /// `mask` is an optional availability table with indicator columns;
    /// `None` evaluates all rows.
    fn ln_likelihood(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array>;

    /// Elementwise log-prior `ln p(theta)`.
    fn ln_prior(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<A::Array>;

    /// Elementwise log-evidence `ln p(X)`.
    ///
    /// Defaults to zero (improper evidence), so the posterior reduces to
    /// likelihood times prior.
    fn ln_evidence(&self, data: &Data<A>) -> Result<A::Array> {
        Ok(A::zeros(data.n_rows()))
    }

    /// Elementwise log-posterior
    /// `ln p(theta | X) = ln p(X | theta) + ln p(theta) - ln p(X)`.
    fn ln_posterior(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        let lik = self.ln_likelihood(mpars, data, mask)?;
        let prior = self.ln_prior(mpars, data)?;
        let evidence = self.ln_evidence(data)?;
        Ok(A::sub(&A::add(&lik, &prior), &evidence))
    }
}

/// Dataset-aggregated log-probabilities, derived by row summation.
pub trait TotalLnProbability<A: ArrayNamespace>: LnProbability<A> {
    /// Total log-likelihood over the data set.
    fn ln_likelihood_tot(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<f64> {
        Ok(A::sum(&self.ln_likelihood(mpars, data, mask)?))
    }

    /// Total log-prior over the data set.
    fn ln_prior_tot(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<f64> {
        Ok(A::sum(&self.ln_prior(mpars, data)?))
    }

    /// Total log-evidence over the data set.
    fn ln_evidence_tot(&self, data: &Data<A>) -> Result<f64> {
        Ok(A::sum(&self.ln_evidence(data)?))
    }

    /// Total log-posterior over the data set.
    fn ln_posterior_tot(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<f64> {
        Ok(A::sum(&self.ln_posterior(mpars, data, mask)?))
    }
}

impl<A: ArrayNamespace, M: LnProbability<A> + ?Sized> TotalLnProbability<A> for M {}

/// Direct (non-log) probabilities, derived by elementwise exponentiation.
pub trait Probability<A: ArrayNamespace>: LnProbability<A> {
    /// Elementwise likelihood.
    fn likelihood(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        Ok(A::exp(&self.ln_likelihood(mpars, data, mask)?))
    }

    /// Elementwise prior.
    fn prior(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<A::Array> {
        Ok(A::exp(&self.ln_prior(mpars, data)?))
    }

    /// Elementwise evidence.
    fn evidence(&self, data: &Data<A>) -> Result<A::Array> {
        Ok(A::exp(&self.ln_evidence(data)?))
    }

    /// Elementwise posterior.
    fn posterior(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        Ok(A::exp(&self.ln_posterior(mpars, data, mask)?))
    }
}

impl<A: ArrayNamespace, M: LnProbability<A> + ?Sized> Probability<A> for M {}

/// Dataset-aggregated direct probabilities.
pub trait TotalProbability<A: ArrayNamespace>: TotalLnProbability<A> {
    /// Total likelihood over the data set.
    fn likelihood_tot(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<f64> {
        Ok(self.ln_likelihood_tot(mpars, data, mask)?.exp())
    }

    /// Total prior over the data set.
    fn prior_tot(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<f64> {
        Ok(self.ln_prior_tot(mpars, data)?.exp())
    }

    /// Total evidence over the data set.
    fn evidence_tot(&self, data: &Data<A>) -> Result<f64> {
        Ok(self.ln_evidence_tot(data)?.exp())
    }

    /// Total posterior over the data set.
    fn posterior_tot(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<f64> {
        Ok(self.ln_posterior_tot(mpars, data, mask)?.exp())
    }
}

impl<A: ArrayNamespace, M: LnProbability<A> + ?Sized> TotalProbability<A> for M {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::CpuBackend;
    use approx::assert_relative_eq;

    struct FixedModel {
        lik: Vec<f64>,
        prior: Vec<f64>,
    }

    impl LnProbability<CpuBackend> for FixedModel {
        fn ln_likelihood(
            &self,
            _mpars: &Params<Vec<f64>>,
            _data: &Data<CpuBackend>,
            _mask: Option<&Data<CpuBackend>>,
        ) -> Result<Vec<f64>> {
            Ok(self.lik.clone())
        }

        fn ln_prior(&self, _mpars: &Params<Vec<f64>>, _data: &Data<CpuBackend>) -> Result<Vec<f64>> {
            Ok(self.prior.clone())
        }
    }

    fn fixtures() -> (FixedModel, Params<Vec<f64>>, Data<CpuBackend>) {
        let model = FixedModel { lik: vec![-1.0, -2.0, -3.0], prior: vec![0.0, -0.5, 0.5] };
        let data = Data::from_columns(vec![("x".into(), vec![1.0, 2.0, 3.0])]).unwrap();
        (model, Params::new(), data)
    }

    #[test]
    fn test_direct_variants_exponentiate() {
        let (model, mpars, data) = fixtures();
        let lik = model.likelihood(&mpars, &data, None).unwrap();
        let ln_lik = model.ln_likelihood(&mpars, &data, None).unwrap();
        for (l, ll) in lik.iter().zip(&ln_lik) {
            assert_relative_eq!(*l, ll.exp(), epsilon = 1e-15);
        }
    }

    #[test]
    fn test_total_variants_sum_rows() {
        let (model, mpars, data) = fixtures();
        let tot = model.ln_likelihood_tot(&mpars, &data, None).unwrap();
        assert_relative_eq!(tot, -6.0, epsilon = 1e-12);
        let lik_tot = model.likelihood_tot(&mpars, &data, None).unwrap();
        assert_relative_eq!(lik_tot, (-6.0f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn test_posterior_identity() {
        let (model, mpars, data) = fixtures();
        let post = model.ln_posterior(&mpars, &data, None).unwrap();
        // default evidence is zero
        assert_relative_eq!(post[1], -2.5, epsilon = 1e-12);
        assert_relative_eq!(
            model.ln_posterior_tot(&mpars, &data, None).unwrap(),
            -6.0 + 0.0,
            epsilon = 1e-12
        );
    }
}
