// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Small general-purpose components used to glue physics blocks together.

use crate::errors::{AssemblyError, EvaluationError};
use crate::jacobian::{Differentiation, Partials, Sparsity};
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};
use std::collections::HashMap;
use std::fmt;

type Expression = dyn Fn(&[Dual64]) -> Vec<Dual64> + Send + Sync;

/// A component defined by a closure over scalar inputs.
///
/// The closure receives the inputs in declaration order and returns one
/// value per output. It is evaluated on dual numbers, so partials come for
/// free.
///
/// ```
/// use tokamak_mdo::components::util::ExecComp;
/// use tokamak_mdo::engine::Problem;
///
/// let margin = ExecComp::new(&["B"], &["con"], |x| vec![-x[0] + 18.0]).units("B", "T");
/// let mut problem = Problem::from_component("margin", margin).unwrap();
/// problem.set_scalar("B", 12.0).unwrap();
/// problem.run().unwrap();
/// assert_eq!(problem.get_scalar("con").unwrap(), 6.0);
/// ```
pub struct ExecComp {
    inputs: Vec<String>,
    outputs: Vec<String>,
    units: HashMap<String, String>,
    defaults: HashMap<String, f64>,
    expression: Box<Expression>,
}

impl ExecComp {
    pub fn new<F>(inputs: &[&str], outputs: &[&str], expression: F) -> Self
    where
        F: Fn(&[Dual64]) -> Vec<Dual64> + Send + Sync + 'static,
    {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            units: HashMap::new(),
            defaults: HashMap::new(),
            expression: Box::new(expression),
        }
    }

    /// Attach units to an input or output.
    pub fn units(mut self, name: &str, units: &str) -> Self {
        self.units.insert(name.to_string(), units.to_string());
        self
    }

    /// Default value of an input or output.
    pub fn default(mut self, name: &str, value: f64) -> Self {
        self.defaults.insert(name.to_string(), value);
        self
    }

    fn var(&self, name: &str) -> Var {
        let mut var = Var::scalar(name);
        if let Some(units) = self.units.get(name) {
            var = var.units(units);
        }
        if let Some(value) = self.defaults.get(name) {
            var = var.default(*value);
        }
        var
    }

    fn apply(&self, inputs: &Values<Dual64>, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        let args = self
            .inputs
            .iter()
            .map(|name| inputs.scalar(name))
            .collect::<Result<Vec<_>, _>>()?;
        let results = (self.expression)(&args);
        if results.len() != self.outputs.len() {
            let missing = self.outputs.get(results.len()).cloned().unwrap_or_default();
            return Err(EvaluationError::MissingOutput {
                component: inputs.owner().to_string(),
                output: missing,
            });
        }
        for (name, value) in self.outputs.iter().zip(results) {
            outputs.set_scalar(name, value);
        }
        Ok(())
    }
}

impl fmt::Debug for ExecComp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecComp")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

impl Component for ExecComp {
    fn name(&self) -> &'static str {
        "ExecComp"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        for name in &self.inputs {
            vars.input(self.var(name))?;
        }
        for name in &self.outputs {
            vars.output(self.var(name))?;
        }
        Ok(())
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let mut lifted = Values::new(inputs.owner());
        self.apply(&inputs.map(Dual64::from), &mut lifted)?;
        for name in &self.outputs {
            outputs.set_scalar(name, lifted.scalar(name)?.re);
        }
        Ok(())
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.apply(inputs, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

/// Elementwise difference of two squared-distance arrays, c = a − b.
#[derive(Debug, Clone, Copy)]
pub struct SquaredLengthSubtraction {
    len: usize,
}

impl SquaredLengthSubtraction {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Component for SquaredLengthSubtraction {
    fn name(&self) -> &'static str {
        "SquaredLengthSubtraction"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::array("a", self.len).units("m**2").desc("Squared distance to the outer curve"))?;
        vars.input(Var::array("b", self.len).units("m**2").desc("Squared distance to the inner curve"))?;
        vars.output(Var::array("c", self.len).units("m**2").desc("a − b"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_diagonal("c", "a");
        sparsity.declare_diagonal("c", "b");
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let a = inputs.array("a")?;
        let b = inputs.array("b")?;
        outputs.set_array("c", a.iter().zip(b).map(|(a, b)| a - b).collect());
        Ok(())
    }

    fn compute_partials(&self, _inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("c", "a", 1.0)?;
        partials.set("c", "b", -1.0)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        let a = inputs.array("a")?;
        let b = inputs.array("b")?;
        outputs.set_array("c", a.iter().zip(b).map(|(a, b)| *a - *b).collect());
        Ok(())
    }
}

/// Kreisselmeier–Steinhauser aggregation of the constraint array `g`:
///
/// ```text
/// KS = max(g − upper) + ln Σ exp(ρ (g_i − upper − max)) / ρ
/// ```
///
/// A smooth, conservative upper bound on the largest entry, so `KS ≤ 0`
/// implies every `g_i ≤ upper`.
#[derive(Debug, Clone, Copy)]
pub struct KsAggregate {
    width: usize,
    rho: f64,
    upper: f64,
}

impl KsAggregate {
    pub fn new(width: usize, rho: f64, upper: f64) -> Self {
        Self { width, rho, upper }
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let g = inputs.array("g")?;
        let shifted: Vec<T> = g.iter().map(|&g| g - self.upper).collect();
        let peak = shifted
            .iter()
            .map(|g| g.re())
            .fold(f64::NEG_INFINITY, f64::max);
        let sum = shifted
            .iter()
            .fold(T::from(0.0f64), |acc, &g| acc + ((g - peak) * self.rho).exp());
        outputs.set_scalar("KS", sum.ln() / self.rho + peak);
        Ok(())
    }
}

impl Component for KsAggregate {
    fn name(&self) -> &'static str {
        "KsAggregate"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::array("g", self.width).units("m**2").default(0.0).desc("Constraint values"))?;
        vars.output(Var::scalar("KS").units("m**2").desc("Aggregated constraint"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let g = inputs.array("g")?;
        let peak = g.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = g.iter().map(|g| ((g - peak) * self.rho).exp()).collect();
        let total: f64 = weights.iter().sum();
        let gradient: Vec<f64> = weights.iter().map(|w| w / total).collect();
        partials.set_values("KS", "g", &gradient)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;

    #[test]
    fn test_exec_comp_values_and_partials() {
        let comp = ExecComp::new(&["x", "y"], &["f", "g"], |v| vec![v[0] * v[1], v[0].sin() - v[1] * 3.0])
            .default("x", 2.0)
            .units("y", "m");
        let mut problem = Problem::from_component("exec", comp).unwrap();
        problem.set_scalar("y", 4.0).unwrap();
        problem.run().unwrap();
        assert_eq!(problem.get_scalar("f").unwrap(), 8.0);
        assert!((problem.get_scalar("g").unwrap() - (2.0f64.sin() - 12.0)).abs() < 1e-15);

        let dg = problem.total_derivative("g", "x").unwrap();
        assert!((dg[(0, 0)] - 2.0f64.cos()).abs() < 1e-12);
        let report = problem.check_partials(&CheckOptions::finite_difference()).unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn test_exec_comp_output_count() {
        let comp = ExecComp::new(&["x"], &["a", "b"], |v| vec![v[0]]);
        let mut problem = Problem::from_component("short", comp).unwrap();
        assert!(matches!(
            problem.run(),
            Err(EvaluationError::MissingOutput { ref output, .. }) if output == "b"
        ));
    }

    #[test]
    fn test_squared_length_subtraction() {
        let mut problem = Problem::from_component("margin", SquaredLengthSubtraction::new(3)).unwrap();
        problem
            .set_inputs(&[("a", vec![4.0, 5.0, 6.0]), ("b", vec![1.0, 1.0, 7.0])])
            .unwrap();
        problem.run().unwrap();
        assert_eq!(problem.get("c").unwrap(), &[3.0, 4.0, -1.0]);

        let db = problem.total_derivative("c", "b").unwrap();
        assert_eq!(db[(1, 1)], -1.0);
        assert_eq!(db[(0, 1)], 0.0);
        let report = problem.check_partials(&CheckOptions::dual()).unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn test_ks_bounds_the_maximum() {
        let mut problem = Problem::from_component("ks", KsAggregate::new(4, 10.0, 0.0)).unwrap();
        problem.set_input("g", &[-1.0, 0.5, 0.2, -3.0]).unwrap();
        problem.run().unwrap();

        let ks = problem.get_scalar("KS").unwrap();
        assert!(ks >= 0.5);
        assert!(ks <= 0.5 + 4.0f64.ln() / 10.0);

        for options in [CheckOptions::finite_difference(), CheckOptions::dual()] {
            let report = problem.check_partials(&options).unwrap();
            assert!(report.passed(), "{}", report.to_json().unwrap());
        }
    }

    #[test]
    fn test_ks_upper_shift() {
        let mut problem = Problem::from_component("ks", KsAggregate::new(1, 10.0, 2.0)).unwrap();
        problem.set_input("g", &[3.0]).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("KS").unwrap() - 1.0).abs() < 1e-12);
    }
}
