// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{AssemblyError, EvaluationError};
use crate::jacobian::{Differentiation, Partials, Sparsity};
use crate::variables::{DiscreteValues, Values, VariableRegistry};
use num_dual::Dual64;

/// The atomic unit of computation in a model.
///
/// A component declares its variables once, then behaves as a pure function
/// of its inputs: the only state it may hold is configuration resolved at
/// construction. Components never see the model around them; the driver hands
/// them their inputs by local name and collects their outputs.
pub trait Component: Send + Sync {
    /// Type label used in logs.
    fn name(&self) -> &'static str;

    /// Declare every input and output.
    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError>;

    /// Declare the structurally nonzero Jacobian blocks. Dense over all
    /// continuous outputs and inputs unless overridden.
    fn declare_partials(&self, vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_dense(vars);
    }

    /// Evaluate continuous outputs. Inputs outside the valid domain fail with
    /// [`EvaluationError::Domain`].
    fn compute(
        &self,
        inputs: &Values<f64>,
        discrete: &DiscreteValues,
        outputs: &mut Values<f64>,
    ) -> Result<(), EvaluationError>;

    /// Evaluate discrete outputs. Most components have none.
    fn compute_discrete(
        &self,
        _inputs: &Values<f64>,
        _discrete: &DiscreteValues,
        _outputs: &mut DiscreteValues,
    ) -> Result<(), EvaluationError> {
        Ok(())
    }

    /// Exact partials for every declared block.
    fn compute_partials(
        &self,
        inputs: &Values<f64>,
        _discrete: &DiscreteValues,
        _partials: &mut Partials,
    ) -> Result<(), EvaluationError> {
        Err(EvaluationError::NotDifferentiable {
            component: inputs.owner().to_string(),
            reason: format!("{} provides no analytic partials", self.name()),
        })
    }

    /// The same computation as [`Component::compute`] carried out on dual
    /// numbers.
    fn compute_dual(
        &self,
        inputs: &Values<Dual64>,
        _discrete: &DiscreteValues,
        _outputs: &mut Values<Dual64>,
    ) -> Result<(), EvaluationError> {
        Err(EvaluationError::NotDifferentiable {
            component: inputs.owner().to_string(),
            reason: format!("{} has no dual-number evaluation", self.name()),
        })
    }

    /// Strategy used when the component is added without an explicit one.
    fn differentiation(&self) -> Differentiation {
        Differentiation::Analytic
    }
}
