// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Constant-tension ("Princeton Dee") TF coil set.
//!
//! The inner profile is a vertical inboard leg joined to a curve whose
//! curvature is inversely proportional to the distance from the machine axis.
//! Two radii fix the whole shape: the inboard leg outer radius `r1` and the
//! outboard leg inner radius `r2`. With
//!
//! ```text
//! k  = ½ ln(r2 / r1)
//! r0 = √(r1 r2)
//! ```
//!
//! the enclosed volume, heights and perimeter follow in closed form from
//! modified Bessel and Struve functions.

use super::special::{bessel_i0, bessel_i1, struve_l_minus1};
use crate::errors::{AssemblyError, EvaluationError};
use crate::jacobian::{Differentiation, Sparsity};
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};
use std::f64::consts::PI;

const R_OUT: &str = "Ib TF R_out";
const R_IN: &str = "Ob TF R_in";

#[derive(Debug, Clone, Copy, Default)]
pub struct PrincetonDeeTFSet;

impl PrincetonDeeTFSet {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let r0_axis = inputs.scalar("R0")?;
        let r1 = inputs.scalar(R_OUT)?;
        let r2 = inputs.scalar(R_IN)?;
        if r1.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), R_OUT, "inboard leg radius must be positive"));
        }
        if r2.re() <= r1.re() {
            return Err(EvaluationError::domain(
                inputs.owner(),
                R_IN,
                format!("outboard leg ({}) must lie outside the inboard leg ({})", r2.re(), r1.re()),
            ));
        }

        let k = (r2 / r1).ln() * 0.5;
        let r0 = (r1 * r2).sqrt();
        let i0 = bessel_i0(k);
        let i1 = bessel_i1(k);

        outputs.set_scalar("k", k);
        outputs.set_scalar("constraint_axis_within_coils", r2 - r0_axis);
        outputs.set_scalar(
            "V_enc",
            r0.powi(3) * k * (2.0 * PI * PI) * (bessel_i1(k * 3.0) - (k * -2.0).exp() * i1),
        );
        outputs.set_scalar("inner leg half-height", r0 * k * i1 * PI);
        outputs.set_scalar("half-height", k * r0 * (i1 + struve_l_minus1(k)) * (0.5 * PI));
        outputs.set_scalar("arc length", k * r0 * (i0 + i1) * (2.0 * PI));
        Ok(())
    }
}

impl Component for PrincetonDeeTFSet {
    fn name(&self) -> &'static str {
        "PrincetonDeeTFSet"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("R0").units("m").desc("Plasma major radius"))?;
        vars.input(Var::scalar(R_OUT).units("m").desc("Inboard TF leg outer radius"))?;
        vars.input(Var::scalar(R_IN).units("m").default(2.0).desc("Outboard TF leg inner radius"))?;

        vars.output(Var::scalar("k").desc("Normalized magnet shape parameter"))?;
        vars.output(
            Var::scalar("constraint_axis_within_coils")
                .units("m")
                .reference(1.0)
                .desc("Positive when the major axis is within the magnet legs"),
        )?;
        vars.output(
            Var::scalar("V_enc")
                .units("m**3")
                .lower(0.0)
                .reference(1e3)
                .desc("Magnetized volume enclosed by the set"),
        )?;
        vars.output(Var::scalar("inner leg half-height").units("m").lower(0.0).desc("Half-height of the vertical inner leg"))?;
        vars.output(Var::scalar("half-height").units("m").lower(0.0).desc("Average half height of the magnet"))?;
        vars.output(Var::scalar("arc length").units("m").reference(10.0).desc("Inner perimeter of the magnet"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(
            &["k", "V_enc", "inner leg half-height", "half-height", "arc length"],
            &[R_OUT, R_IN],
        );
        sparsity.declare_all(&["constraint_axis_within_coils"], &[R_IN, "R0"]);
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;
    use std::f64::consts::E;

    fn problem(r1: f64, r2: f64) -> Problem {
        let mut problem = Problem::from_component("coils", PrincetonDeeTFSet).unwrap();
        problem
            .set_inputs(&[("R0", vec![3.0]), (R_OUT, vec![r1]), (R_IN, vec![r2])])
            .unwrap();
        problem
    }

    #[test]
    fn test_unit_shape_parameter() {
        // k = 1 and r0 = 1
        let mut problem = problem(1.0 / E, E);
        problem.run().unwrap();

        assert!((problem.get_scalar("k").unwrap() - 1.0).abs() < 1e-14);
        let v_enc = 2.0 * PI * PI * (bessel_i1(3.0) - (-2.0f64).exp() * bessel_i1(1.0));
        assert!((problem.get_scalar("V_enc").unwrap() - v_enc).abs() < 1e-10);
        assert!((v_enc - 76.5266).abs() < 1e-3);

        let arc = 2.0 * PI * (bessel_i0(1.0) + bessel_i1(1.0));
        assert!((problem.get_scalar("arc length").unwrap() - arc).abs() < 1e-10);
        assert!((problem.get_scalar("constraint_axis_within_coils").unwrap() - (E - 3.0)).abs() < 1e-14);
        assert!(problem.get_scalar("half-height").unwrap() > problem.get_scalar("inner leg half-height").unwrap());
    }

    #[test]
    fn test_volume_derivative_matches_closed_form() {
        let (r1, r2) = (1.2, 9.0);
        let mut problem = problem(r1, r2);
        let dv = problem.total_derivative("V_enc", R_IN).unwrap()[(0, 0)];

        let k = (r2 / r1).ln() / 2.0;
        let r0 = (r1 * r2).sqrt();
        let dv_dk = 2.0 * (-2.0 * k).exp() * k * PI * PI * r0.powi(3)
            * (-bessel_i0(k) + 3.0 * (2.0 * k).exp() * bessel_i0(3.0 * k) + 2.0 * bessel_i1(k));
        let dv_dr0 = 6.0 * k * PI * PI * r0 * r0 * (bessel_i1(3.0 * k) - (-2.0 * k).exp() * bessel_i1(k));
        let expected = dv_dk / (2.0 * r2) + dv_dr0 * r1 / (2.0 * r0);
        assert!((dv - expected).abs() < 1e-8 * expected.abs());
    }

    #[test]
    fn test_partials() {
        let mut problem = problem(1.2, 9.0);
        let report = problem.check_partials(&CheckOptions::finite_difference()).unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn test_inverted_legs_rejected() {
        let mut problem = problem(4.0, 3.0);
        assert!(matches!(
            problem.run(),
            Err(EvaluationError::Domain { ref variable, .. }) if variable == R_IN
        ));
    }
}
