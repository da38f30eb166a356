//! Mixture of named component models.

use std::collections::HashMap;

use sf_core::array::ArrayNamespace;
use sf_core::data::Data;
use sf_core::params::{ParamBounds, ParamNames, ParamScalers, Params};
use sf_core::prob::LnProbability;
use sf_core::traits::{Model, PriorPlugin};
use sf_core::{Error, Result};

/// A mixture over a frozen, ordered set of named component models.
///
/// Component parameters are addressed through the component name: a child
/// declaring `weight` and `phi2.mu` appears in the combined index as
/// `stream.weight` and `stream.phi2.mu`. Evaluation delegates each child its
/// own slice via [`Params::get_prefixed`].
///
/// In probability space the mixture is `p(x) = sum_k p(x | k)`, so the
/// elementwise log-likelihood is the log-sum-exp of the stacked component
/// log-likelihoods; component log-priors instead combine additively, since
/// they constrain independent parameter sets rather than compete as
/// alternative explanations.
pub struct MixtureModel<A: ArrayNamespace> {
    components: Vec<(String, Box<dyn Model<A>>)>,
    index: HashMap<String, usize>,
    priors: Vec<Box<dyn PriorPlugin<A>>>,
    param_names: ParamNames,
    param_bounds: ParamBounds,
    param_scalers: ParamScalers,
    coord_names: Vec<String>,
}

impl<A: ArrayNamespace> MixtureModel<A> {
    /// Create a mixture from ordered `(name, model)` pairs and a prior chain.
    ///
    /// Both orderings are semantically significant: component order fixes the
    /// stacking order of the log-sum-exp and the forward concatenation;
    /// plugin order fixes the fold order of the prior chain.
    pub fn new(
        components: Vec<(String, Box<dyn Model<A>>)>,
        priors: Vec<Box<dyn PriorPlugin<A>>>,
    ) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::Validation("MixtureModel requires at least one component".into()));
        }

        let mut index = HashMap::with_capacity(components.len());
        for (pos, (name, _)) in components.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Validation("component names must be non-empty".into()));
            }
            if name.contains('.') {
                return Err(Error::Validation(format!(
                    "component name '{name}' must not contain '.'"
                )));
            }
            if index.insert(name.clone(), pos).is_some() {
                return Err(Error::Validation(format!("duplicate component name '{name}'")));
            }
        }

        let param_names = ParamNames::merged(
            components.iter().map(|(name, model)| model.param_names().with_prefix(name)),
        )?;
        let param_bounds = ParamBounds::merged(
            components.iter().map(|(name, model)| model.param_bounds().with_prefix(name)),
        );
        let param_scalers = ParamScalers::merged(
            components.iter().map(|(name, model)| model.param_scalers().with_prefix(name)),
        );

        let mut coord_names: Vec<String> = Vec::new();
        for (_, model) in &components {
            for coord in model.coord_names() {
                if !coord_names.contains(coord) {
                    coord_names.push(coord.clone());
                }
            }
        }

        Ok(Self {
            components,
            index,
            priors,
            param_names,
            param_bounds,
            param_scalers,
            coord_names,
        })
    }

    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    /// Component names in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    /// Look up a component by name.
    pub fn component(&self, name: &str) -> Result<&dyn Model<A>> {
        let pos = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| Error::KeyLookup(format!("no component '{name}'")))?;
        Ok(self.components[pos].1.as_ref())
    }

    /// Number of registered prior plugins.
    pub fn n_priors(&self) -> usize {
        self.priors.len()
    }
}

impl<A: ArrayNamespace> LnProbability<A> for MixtureModel<A> {
    fn ln_likelihood(
        &self,
        mpars: &Params<A::Array>,
        data: &Data<A>,
        mask: Option<&Data<A>>,
    ) -> Result<A::Array> {
        let mut columns = Vec::with_capacity(self.components.len());
        for (name, model) in &self.components {
            let sub = mpars.get_prefixed(name);
            columns.push(model.ln_likelihood(&sub, data, mask)?);
        }
        let stacked = A::stack(&columns)?;
        Ok(A::logsumexp_rows(&stacked))
    }

    fn ln_prior(&self, mpars: &Params<A::Array>, data: &Data<A>) -> Result<A::Array> {
        let mut columns = Vec::with_capacity(self.components.len());
        for (name, model) in &self.components {
            let sub = mpars.get_prefixed(name);
            columns.push(model.ln_prior(&sub, data)?);
        }
        let stacked = A::stack(&columns)?;
        let mut lp = A::sum_rows(&stacked);

        for prior in &self.priors {
            lp = prior.ln_prior(&lp, mpars, data, self)?;
        }
        Ok(lp)
    }
}

impl<A: ArrayNamespace> Model<A> for MixtureModel<A> {
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
        let mut blocks = Vec::with_capacity(self.components.len());
        for (_, model) in &self.components {
            let out = model.forward(batch)?;
            // A zero-width output is a component with no free parameters;
            // it contributes nothing to the concatenation.
            if A::n_cols(&out) == 0 {
                continue;
            }
            blocks.push(out);
        }

        let mut out = if blocks.is_empty() {
            A::matrix_empty(batch.n_rows())
        } else {
            A::concatenate(&blocks)?
        };

        for prior in &self.priors {
            out = prior.forward(&out, batch, self)?;
        }
        Ok(out)
    }
}
