// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Model-wide derivative checks. Diagnostic only.

use super::problem::gather;
use super::Problem;
use crate::errors::EvaluationError;
use crate::jacobian::{check_component, CheckOptions, Differentiation, FdForm, Matrix, PartialsReport};
use crate::observability::messages::verification::{BlockMismatch, CheckCompleted};
use crate::observability::messages::StructuredLog;
use serde::Serialize;

/// Comparison of one total-derivative block against finite differences
/// through the whole model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalCheck {
    pub of: String,
    pub wrt: String,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
    pub passed: bool,
    pub computed: Matrix,
    pub numeric: Matrix,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsReport {
    pub options: CheckOptions,
    pub checks: Vec<TotalCheck>,
}

impl TotalsReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Problem {
    /// Check every component's partials at the stored point.
    pub fn check_partials(&mut self, options: &CheckOptions) -> Result<PartialsReport, EvaluationError> {
        self.ensure_current()?;
        let mut report = PartialsReport::new(*options);
        for &index in &self.model.order {
            let component = &self.model.components[index];
            let (inputs, discrete) = gather(component, &self.values, &self.discrete);
            report.checks.extend(check_component(
                component.component.as_ref(),
                component.differentiation,
                &component.vars,
                &component.partials,
                &inputs,
                &discrete,
                options,
            )?);
        }

        for failure in report.failures() {
            BlockMismatch {
                component: &failure.component,
                of: &failure.of,
                wrt: &failure.wrt,
                max_abs_error: failure.max_abs_error,
                max_rel_error: failure.max_rel_error,
            }
            .log();
        }
        CheckCompleted {
            kind: "partials",
            method: &options.method.to_string(),
            checked: report.checks.len(),
            failed: report.failures().count(),
        }
        .log();
        Ok(report)
    }

    /// Compare chain-rule totals with finite differences of full model runs.
    /// Every `wrt` must be an independent input.
    pub fn check_totals(&mut self, of: &[&str], wrt: &[&str], options: &CheckOptions) -> Result<TotalsReport, EvaluationError> {
        let Differentiation::FiniteDifference { step, form } = options.method else {
            return Err(EvaluationError::NotDifferentiable {
                component: "<model>".to_string(),
                reason: format!("totals can only be checked by finite differences, not {}", options.method),
            });
        };
        let totals = self.compute_totals(of, wrt)?;
        let of_slots = of
            .iter()
            .map(|name| self.continuous_slot(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = TotalsReport {
            options: *options,
            checks: Vec::new(),
        };
        for w in wrt {
            let size = self.get(w)?.len();
            let w_slot = self.independent_slot(w, size)?;
            let mut numeric: Vec<Matrix> = of_slots
                .iter()
                .map(|o| Matrix::zeros(self.values[o.0].len(), size))
                .collect();

            for col in 0..size {
                let x = self.values[w_slot.0][col];
                let h = step * x.abs().max(1.0);
                let shifted = |delta: f64| {
                    let mut values = self.values.clone();
                    values[w_slot.0][col] += delta;
                    self.evaluate(values, self.discrete.clone())
                };
                let (plus, _) = shifted(h)?;
                let (lower, width) = match form {
                    FdForm::Forward => (self.values.clone(), h),
                    FdForm::Central => (shifted(-h)?.0, 2.0 * h),
                };
                for (block, o) in numeric.iter_mut().zip(&of_slots) {
                    for row in 0..block.nrows() {
                        block[(row, col)] = (plus[o.0][row] - lower[o.0][row]) / width;
                    }
                }
            }

            for (o, block) in of.iter().zip(numeric) {
                let computed = totals
                    .get(o, w)
                    .cloned()
                    .unwrap_or_else(|| Matrix::zeros(block.nrows(), block.ncols()));
                let mut check = TotalCheck {
                    of: o.to_string(),
                    wrt: w.to_string(),
                    max_abs_error: 0.0,
                    max_rel_error: 0.0,
                    passed: true,
                    computed,
                    numeric: block,
                };
                for (c, n) in check.computed.iter().zip(check.numeric.iter()) {
                    let abs_error = (c - n).abs();
                    check.max_abs_error = check.max_abs_error.max(abs_error);
                    let rel = if *n == 0.0 { abs_error } else { abs_error / n.abs() };
                    check.max_rel_error = check.max_rel_error.max(rel);
                    check.passed &= abs_error <= options.atol + options.rtol * n.abs();
                }
                report.checks.push(check);
            }
        }

        CheckCompleted {
            kind: "totals",
            method: &options.method.to_string(),
            checked: report.checks.len(),
            failed: report.checks.iter().filter(|c| !c.passed).count(),
        }
        .log();
        Ok(report)
    }
}
