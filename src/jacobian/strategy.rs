// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The three interchangeable ways of producing a component's local Jacobian.

use super::{Partials, Pattern};
use crate::config::consts::DEFAULT_FD_STEP;
use crate::errors::EvaluationError;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, VariableRegistry};
use num_dual::Dual64;
use serde::Serialize;
use std::fmt;

/// Difference formula used by [`Differentiation::FiniteDifference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FdForm {
    Forward,
    Central,
}

/// How partials of a component instance are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum Differentiation {
    /// Hand-written `compute_partials`.
    Analytic,
    /// Perturb each input element by `step * max(1, |x|)`.
    FiniteDifference { step: f64, form: FdForm },
    /// Forward-mode dual numbers through `compute_dual`; exact to rounding.
    Dual,
}

impl Differentiation {
    pub fn central_difference() -> Self {
        Differentiation::FiniteDifference {
            step: DEFAULT_FD_STEP,
            form: FdForm::Central,
        }
    }

    pub fn forward_difference() -> Self {
        Differentiation::FiniteDifference {
            step: DEFAULT_FD_STEP,
            form: FdForm::Forward,
        }
    }
}

impl fmt::Display for Differentiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Differentiation::Analytic => write!(f, "analytic"),
            Differentiation::FiniteDifference { step, form } => {
                let form = match form {
                    FdForm::Forward => "forward",
                    FdForm::Central => "central",
                };
                write!(f, "{} difference (step {:e})", form, step)
            }
            Differentiation::Dual => write!(f, "dual number"),
        }
    }
}

/// Run `compute` into a fresh output set owned by the same component.
pub fn evaluate(
    component: &dyn Component,
    inputs: &Values<f64>,
    discrete: &DiscreteValues,
) -> Result<Values<f64>, EvaluationError> {
    let mut outputs = Values::new(inputs.owner());
    component.compute(inputs, discrete, &mut outputs)?;
    Ok(outputs)
}

/// Fill a copy of `template` with the partials of `component` at `inputs`.
///
/// `template` fixes which blocks are produced; the numeric strategies only
/// write structural entries so every strategy yields the same sparsity.
pub fn local_jacobian(
    strategy: Differentiation,
    component: &dyn Component,
    vars: &VariableRegistry,
    template: &Partials,
    inputs: &Values<f64>,
    discrete: &DiscreteValues,
) -> Result<Partials, EvaluationError> {
    let mut partials = template.clone();
    // nothing to differentiate, e.g. only discrete outputs
    if partials.blocks().is_empty() {
        return Ok(partials);
    }
    match strategy {
        Differentiation::Analytic => component.compute_partials(inputs, discrete, &mut partials)?,
        Differentiation::FiniteDifference { step, form } => {
            finite_difference(component, vars, &mut partials, inputs, discrete, step, form)?
        }
        Differentiation::Dual => dual(component, vars, &mut partials, inputs, discrete)?,
    }
    Ok(partials)
}

fn wrt_names(partials: &Partials) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for block in partials.blocks() {
        if !names.contains(&block.wrt) {
            names.push(block.wrt.clone());
        }
    }
    names
}

fn wrt_size(vars: &VariableRegistry, component: &str, wrt: &str) -> Result<usize, EvaluationError> {
    vars.get(wrt)
        .map(|v| v.size())
        .ok_or_else(|| EvaluationError::MissingValue {
            component: component.to_string(),
            variable: wrt.to_string(),
        })
}

/// Store column `col` of every block over `wrt`, skipping non-structural rows.
fn write_column(
    partials: &mut Partials,
    wrt: &str,
    col: usize,
    column_of: impl Fn(&str, usize) -> Result<f64, EvaluationError>,
) -> Result<(), EvaluationError> {
    let targets: Vec<(String, Pattern, usize)> = partials
        .blocks()
        .iter()
        .filter(|b| b.wrt == wrt)
        .map(|b| (b.of.clone(), b.pattern, b.values.nrows()))
        .collect();
    for (of, pattern, rows) in targets {
        for row in 0..rows {
            if pattern == Pattern::Diagonal && row != col {
                continue;
            }
            let value = column_of(&of, row)?;
            partials.block_mut(&of, wrt)?.values[(row, col)] = value;
        }
    }
    Ok(())
}

fn output_entry<T: Copy>(outputs: &Values<T>, of: &str, row: usize) -> Result<T, EvaluationError> {
    outputs
        .get(of)
        .and_then(|v| v.get(row).copied())
        .ok_or_else(|| EvaluationError::MissingOutput {
            component: outputs.owner().to_string(),
            output: of.to_string(),
        })
}

fn perturbed(inputs: &Values<f64>, wrt: &str, col: usize, delta: f64) -> Result<Values<f64>, EvaluationError> {
    let mut shifted = inputs.clone();
    let mut values = inputs.array(wrt)?.to_vec();
    values[col] += delta;
    shifted.insert(wrt, values);
    Ok(shifted)
}

fn finite_difference(
    component: &dyn Component,
    vars: &VariableRegistry,
    partials: &mut Partials,
    inputs: &Values<f64>,
    discrete: &DiscreteValues,
    step: f64,
    form: FdForm,
) -> Result<(), EvaluationError> {
    let base = match form {
        FdForm::Forward => Some(evaluate(component, inputs, discrete)?),
        FdForm::Central => None,
    };
    for wrt in wrt_names(partials) {
        for col in 0..wrt_size(vars, inputs.owner(), &wrt)? {
            let x = inputs.array(&wrt)?[col];
            let h = step * x.abs().max(1.0);
            let plus = evaluate(component, &perturbed(inputs, &wrt, col, h)?, discrete)?;
            let (lower, width) = match &base {
                Some(base) => (base.clone(), h),
                None => (
                    evaluate(component, &perturbed(inputs, &wrt, col, -h)?, discrete)?,
                    2.0 * h,
                ),
            };
            write_column(partials, &wrt, col, |of, row| {
                Ok((output_entry(&plus, of, row)? - output_entry(&lower, of, row)?) / width)
            })?;
        }
    }
    Ok(())
}

fn dual(
    component: &dyn Component,
    vars: &VariableRegistry,
    partials: &mut Partials,
    inputs: &Values<f64>,
    discrete: &DiscreteValues,
) -> Result<(), EvaluationError> {
    let lifted = inputs.map(Dual64::from);
    for wrt in wrt_names(partials) {
        for col in 0..wrt_size(vars, inputs.owner(), &wrt)? {
            let mut seeded = lifted.clone();
            let mut values = lifted.array(&wrt)?.to_vec();
            values[col] = values[col].derivative();
            seeded.insert(&wrt, values);

            let mut outputs = Values::new(inputs.owner());
            component.compute_dual(&seeded, discrete, &mut outputs)?;
            write_column(partials, &wrt, col, |of, row| {
                Ok(output_entry(&outputs, of, row)?.eps)
            })?;
        }
    }
    Ok(())
}
