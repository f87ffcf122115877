// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cross-checks declared partials against numeric estimates.
//!
//! Diagnostic only: the driver never calls this while running a model.

use super::strategy::local_jacobian;
use super::{Differentiation, Matrix, Partials, Sparsity};
use crate::errors::{EvaluationError, VerificationError};
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, VariableRegistry};
use serde::Serialize;

/// Reference method and tolerances. An entry fails when
/// `|declared - numeric| > atol + rtol * |numeric|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckOptions {
    pub method: Differentiation,
    pub rtol: f64,
    pub atol: f64,
}

impl CheckOptions {
    pub fn finite_difference() -> Self {
        Self {
            method: Differentiation::central_difference(),
            rtol: 1e-4,
            atol: 1e-6,
        }
    }

    pub fn dual() -> Self {
        Self {
            method: Differentiation::Dual,
            rtol: 1e-5,
            atol: 1e-10,
        }
    }
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self::finite_difference()
    }
}

/// Comparison of one (output, input) block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialCheck {
    pub component: String,
    pub of: String,
    pub wrt: String,
    /// False when the block was not declared but the estimate is nonzero.
    pub declared: bool,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    pub passed: bool,
    pub computed: Matrix,
    pub numeric: Matrix,
}

impl PartialCheck {
    fn mismatch(&self, rtol: f64, atol: f64) -> Option<VerificationError> {
        for row in 0..self.computed.nrows() {
            for col in 0..self.computed.ncols() {
                let declared = self.computed[(row, col)];
                let numeric = self.numeric[(row, col)];
                let abs_error = (declared - numeric).abs();
                if abs_error > atol + rtol * numeric.abs() {
                    return Some(VerificationError::JacobianMismatch {
                        component: self.component.clone(),
                        of: self.of.clone(),
                        wrt: self.wrt.clone(),
                        row,
                        col,
                        declared,
                        numeric,
                        abs_error,
                        rel_error: relative(abs_error, numeric),
                    });
                }
            }
        }
        None
    }
}

/// Every block checked for one or more components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialsReport {
    pub options: CheckOptions,
    pub checks: Vec<PartialCheck>,
}

impl PartialsReport {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            checks: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PartialCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// The first failing entry as an error.
    pub fn into_result(self) -> Result<Self, VerificationError> {
        let first = self
            .failures()
            .find_map(|c| c.mismatch(self.options.rtol, self.options.atol));
        match first {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn relative(abs_error: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        abs_error
    } else {
        abs_error / reference.abs()
    }
}

/// Compare the partials `strategy` produces for one component against the
/// reference method of `options`, over every continuous (output, input) pair.
#[allow(clippy::too_many_arguments)]
pub fn check_component(
    component: &dyn Component,
    strategy: Differentiation,
    vars: &VariableRegistry,
    template: &Partials,
    inputs: &Values<f64>,
    discrete: &DiscreteValues,
    options: &CheckOptions,
) -> Result<Vec<PartialCheck>, EvaluationError> {
    let declared = local_jacobian(strategy, component, vars, template, inputs, discrete)?;

    let mut dense = Sparsity::new();
    dense.declare_dense(vars);
    let dense = dense
        .validate(vars)
        .map_err(|errors| EvaluationError::NotDifferentiable {
            component: vars.owner().to_string(),
            reason: format!("{} invalid variable declaration(s)", errors.len()),
        })?;
    let numeric = local_jacobian(options.method, component, vars, &dense, inputs, discrete)?;

    let mut checks = Vec::new();
    for block in numeric.blocks() {
        let computed = declared.get(&block.of, &block.wrt);
        if computed.is_none() && block.values.iter().all(|v| *v == 0.0) {
            continue;
        }
        let computed = computed
            .cloned()
            .unwrap_or_else(|| Matrix::zeros(block.values.nrows(), block.values.ncols()));

        let mut max_abs_error: f64 = 0.0;
        let mut max_rel_error: f64 = 0.0;
        let mut passed = true;
        for (c, n) in computed.iter().zip(block.values.iter()) {
            let abs_error = (c - n).abs();
            max_abs_error = max_abs_error.max(abs_error);
            max_rel_error = max_rel_error.max(relative(abs_error, *n));
            passed &= abs_error <= options.atol + options.rtol * n.abs();
        }
        checks.push(PartialCheck {
            component: vars.owner().to_string(),
            of: block.of.clone(),
            wrt: block.wrt.clone(),
            declared: declared.get(&block.of, &block.wrt).is_some(),
            max_abs_error,
            max_rel_error,
            passed,
            computed,
            numeric: block.values.clone(),
        });
    }
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssemblyError;
    use crate::variables::Var;

    /// y = a * b, with a deliberately wrong d(y)/d(b) and an undeclared d(y)/d(c).
    struct Faulty;

    impl Component for Faulty {
        fn name(&self) -> &'static str {
            "Faulty"
        }

        fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
            vars.input(Var::scalar("a"))?;
            vars.input(Var::scalar("b"))?;
            vars.input(Var::scalar("c"))?;
            vars.output(Var::scalar("y"))
        }

        fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
            sparsity.declare_all(&["y"], &["a", "b"]);
        }

        fn compute(&self, inputs: &Values<f64>, _d: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
            let y = inputs.scalar("a")? * inputs.scalar("b")? + inputs.scalar("c")?;
            outputs.set_scalar("y", y);
            Ok(())
        }

        fn compute_partials(&self, inputs: &Values<f64>, _d: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
            partials.set("y", "a", inputs.scalar("b")?)?;
            partials.set("y", "b", 2.0 * inputs.scalar("a")?)
        }
    }

    fn run_check() -> Vec<PartialCheck> {
        let mut vars = VariableRegistry::new("faulty");
        Faulty.declare(&mut vars).unwrap();
        let mut sparsity = Sparsity::new();
        Faulty.declare_partials(&vars, &mut sparsity);
        let template = sparsity.validate(&vars).unwrap();
        let mut inputs = Values::new("faulty");
        inputs.set_scalar("a", 3.0);
        inputs.set_scalar("b", 4.0);
        inputs.set_scalar("c", 1.0);
        let discrete = DiscreteValues::new("faulty");
        check_component(
            &Faulty,
            Differentiation::Analytic,
            &vars,
            &template,
            &inputs,
            &discrete,
            &CheckOptions::finite_difference(),
        )
        .unwrap()
    }

    #[test]
    fn test_flags_wrong_and_undeclared_blocks() {
        let checks = run_check();
        let by_wrt = |w: &str| checks.iter().find(|c| c.wrt == w).unwrap();

        assert!(by_wrt("a").passed);
        assert!(!by_wrt("b").passed);
        assert!(!by_wrt("c").declared);
        assert!(!by_wrt("c").passed);
    }

    #[test]
    fn test_report_converts_to_mismatch_error() {
        let mut report = PartialsReport::new(CheckOptions::finite_difference());
        report.checks = run_check();
        assert!(!report.passed());
        assert!(report.to_json().unwrap().contains("\"max_rel_error\""));
        match report.into_result() {
            Err(VerificationError::JacobianMismatch { of, wrt, declared, .. }) => {
                assert_eq!(of, "y");
                assert_eq!(wrt, "b");
                assert_eq!(declared, 6.0);
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }
}
