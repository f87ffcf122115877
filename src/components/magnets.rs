// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Toroidal-field magnet radial build: inboard leg geometry, current, field,
//! tension and strain.
//!
//! The inboard leg is a trapezoidal wedge split into an inner structure
//! (`s`), a winding pack (`m`) and an outer structure (`t`). Radii `r` run
//! along the long sides of the wedge, widths `w` to the centre of each
//! segment boundary and lengths `l` perpendicular to them.

use super::util::ExecComp;
use crate::config::consts::{DEFAULT_N_COIL, MEGA, MU_0};
use crate::config::ConfigAccessor;
use crate::errors::{AssemblyError, ConfigError, EvaluationError, ModelError};
use crate::jacobian::{Differentiation, Partials, Sparsity};
use crate::model::Group;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};
use std::f64::consts::PI;

fn coil_count(discrete: &DiscreteValues, minimum: i64) -> Result<f64, EvaluationError> {
    let n_coil = discrete.get("n_coil")?;
    if n_coil < minimum {
        return Err(EvaluationError::domain(
            discrete.owner(),
            "n_coil",
            format!("at least {} coil(s) required, got {}", minimum, n_coil),
        ));
    }
    Ok(n_coil as f64)
}

/// Footprint of the inboard and outboard TF legs.
///
/// `r1` and `r2` are the average radii of the current in the inboard and
/// outboard legs. The outboard leg is assumed to sit as far inside `r_iu` as
/// the inboard winding pack sits inside `r_ot`.
#[derive(Debug, Clone)]
pub struct MagnetGeometry {
    segment_gap: f64,
    outer_structure: f64,
}

impl MagnetGeometry {
    pub fn new(config: &impl ConfigAccessor) -> Result<Self, ConfigError> {
        Ok(Self {
            segment_gap: config.scalar(&["magnet", "geometry", "segment gap"])?,
            outer_structure: config.scalar(&["magnet", "geometry", "outer structure thickness"])?,
        })
    }

    fn formula<T: DualNum<f64> + Copy>(
        &self,
        inputs: &Values<T>,
        discrete: &DiscreteValues,
        outputs: &mut Values<T>,
    ) -> Result<(), EvaluationError> {
        let n_coil = coil_count(discrete, 3)?;
        let r_is = inputs.scalar("r_is")?;
        let r_im = inputs.scalar("r_im")?;
        let r_ot = inputs.scalar("r_ot")?;
        let r_iu = inputs.scalar("r_iu")?;

        let r_it = r_ot - self.outer_structure;
        let r_om = r_it - self.segment_gap;
        let r_os = r_im - self.segment_gap;

        let r_to_w = (PI / n_coil).cos();
        let r_to_l = 2.0 * (PI / n_coil).sin();
        let radii = [("is", r_is), ("os", r_os), ("im", r_im), ("om", r_om), ("it", r_it), ("ot", r_ot)];
        for (suffix, r) in radii {
            outputs.set_scalar(&format!("w_{}", suffix), r * r_to_w);
            outputs.set_scalar(&format!("l_{}", suffix), r * r_to_l);
        }

        // trapezoid between two radii
        let area = |inner: T, outer: T| (outer - inner) * (outer + inner) * (r_to_w * r_to_l * 0.5);
        outputs.set_scalar("A_s", area(r_is, r_os));
        outputs.set_scalar("A_m", area(r_im, r_om));
        outputs.set_scalar("A_t", area(r_it, r_ot));

        outputs.set_scalar("r_it", r_it);
        outputs.set_scalar("r_os", r_os);
        outputs.set_scalar("r_om", r_om);
        outputs.set_scalar("r1", (r_om + r_im) * 0.5);
        outputs.set_scalar("r2", r_iu + (r_ot - r_is) * 0.5);
        Ok(())
    }
}

impl Component for MagnetGeometry {
    fn name(&self) -> &'static str {
        "MagnetGeometry"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("r_is").units("m").default(0.1).desc("Inner radius of the inboard inner structure"))?;
        vars.input(Var::scalar("r_im").units("m").default(0.22).desc("Inner radius of the inboard winding pack"))?;
        vars.input(Var::scalar("r_ot").units("m").default(0.405).desc("Outer radius of the inboard outer structure"))?;
        vars.input(Var::scalar("r_iu").units("m").default(8.025).desc("Inner radius of the outboard leg"))?;
        vars.discrete_input("n_coil", DEFAULT_N_COIL)?;

        vars.output(Var::scalar("r_it").units("m").desc("Inner radius of the inboard outer structure"))?;
        vars.output(Var::scalar("r_os").units("m").desc("Outer radius of the inboard inner structure"))?;
        vars.output(Var::scalar("r_om").units("m").desc("Outer radius of the inboard winding pack"))?;
        for suffix in ["is", "os", "im", "om", "it", "ot"] {
            vars.output(Var::scalar(&format!("w_{}", suffix)).units("m"))?;
            vars.output(Var::scalar(&format!("l_{}", suffix)).units("m"))?;
        }
        vars.output(Var::scalar("A_s").units("m**2").default(0.06).desc("Inboard inner structure area"))?;
        vars.output(Var::scalar("A_t").units("m**2").default(0.01).desc("Inboard outer structure area"))?;
        vars.output(Var::scalar("A_m").units("m**2").default(0.1).desc("Inboard winding pack area"))?;
        vars.output(Var::scalar("r1").units("m").default(0.8).desc("Average radius of the inboard winding pack"))?;
        vars.output(Var::scalar("r2").units("m").default(8.2).desc("Average radius of the outboard winding pack"))
    }

    fn compute(&self, inputs: &Values<f64>, discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, discrete, outputs)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, discrete, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

/// Current in one leg, I_leg = A_m f_HTS j_HTS.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnetCurrent;

impl Component for MagnetCurrent {
    fn name(&self) -> &'static str {
        "MagnetCurrent"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("A_m").units("m**2").default(0.01).desc("Inboard winding pack area"))?;
        vars.input(Var::scalar("f_HTS").default(0.76).desc("Superconducting fraction of the winding pack"))?;
        vars.input(Var::scalar("j_HTS").units("MA/m**2").desc("Current density in the superconducting cable"))?;
        vars.output(Var::scalar("I_leg").units("MA").desc("Current in one TF leg"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let current = inputs.scalar("A_m")? * inputs.scalar("f_HTS")? * inputs.scalar("j_HTS")?;
        outputs.set_scalar("I_leg", current);
        Ok(())
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let a_m = inputs.scalar("A_m")?;
        let f_hts = inputs.scalar("f_HTS")?;
        let j_hts = inputs.scalar("j_HTS")?;
        partials.set("I_leg", "A_m", f_hts * j_hts)?;
        partials.set("I_leg", "f_HTS", a_m * j_hts)?;
        partials.set("I_leg", "j_HTS", a_m * f_hts)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        let current = inputs.scalar("A_m")? * inputs.scalar("f_HTS")? * inputs.scalar("j_HTS")?;
        outputs.set_scalar("I_leg", current);
        Ok(())
    }
}

/// Vacuum toroidal field of `n_coil` legs at the winding pack and on axis,
/// B(r) = μ0 n I / 2πr.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAtRadius;

impl FieldAtRadius {
    fn formula<T: DualNum<f64> + Copy>(
        &self,
        inputs: &Values<T>,
        discrete: &DiscreteValues,
        outputs: &mut Values<T>,
    ) -> Result<(), EvaluationError> {
        let n_coil = coil_count(discrete, 1)?;
        let i_leg = inputs.scalar("I_leg")?;
        let r_om = inputs.scalar("r_om")?;
        let r0 = inputs.scalar("R0")?;
        for (name, radius) in [("r_om", r_om.re()), ("R0", r0.re())] {
            if radius <= 0.0 {
                return Err(EvaluationError::domain(
                    inputs.owner(),
                    name,
                    format!("radius must be positive, got {}", radius),
                ));
            }
        }

        let total = i_leg * (MU_0 * MEGA * n_coil / (2.0 * PI));
        outputs.set_scalar("B_on_coil", total / r_om);
        outputs.set_scalar("B0", total / r0);
        Ok(())
    }
}

impl Component for FieldAtRadius {
    fn name(&self) -> &'static str {
        "FieldAtRadius"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("I_leg").units("MA").desc("Current in one TF leg"))?;
        vars.input(Var::scalar("r_om").units("m").desc("Outer radius of the inboard winding pack"))?;
        vars.input(Var::scalar("R0").units("m").desc("Major radius"))?;
        vars.discrete_input("n_coil", DEFAULT_N_COIL)?;
        vars.output(Var::scalar("B_on_coil").units("T").desc("Peak field on the inboard leg"))?;
        vars.output(Var::scalar("B0").units("T").desc("Field on axis"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(&["B0"], &["I_leg", "R0"]);
        sparsity.declare_all(&["B_on_coil"], &["I_leg", "r_om"]);
    }

    fn compute(&self, inputs: &Values<f64>, discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, discrete, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let scale = MU_0 * MEGA * coil_count(discrete, 1)? / (2.0 * PI);
        let i_leg = inputs.scalar("I_leg")?;
        let r_om = inputs.scalar("r_om")?;
        let r0 = inputs.scalar("R0")?;

        partials.set("B0", "I_leg", scale / r0)?;
        partials.set("B0", "R0", -scale * i_leg / (r0 * r0))?;
        partials.set("B_on_coil", "I_leg", scale / r_om)?;
        partials.set("B_on_coil", "r_om", -scale * i_leg / (r_om * r_om))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, discrete, outputs)
    }
}

/// Vertical tension on the inboard leg of a thin constant-current loop:
///
/// ```text
/// k  = ln(r2 / r1)
/// T1 = ½ I B0 R0 (r1 + r2 (k − 1)) / (r2 − r1)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerTFCoilTension;

impl InnerTFCoilTension {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let i_leg = inputs.scalar("I_leg")?;
        let b0 = inputs.scalar("B0")?;
        let r0 = inputs.scalar("R0")?;
        let r1 = inputs.scalar("r1")?;
        let r2 = inputs.scalar("r2")?;
        if r1.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "r1", "inner leg radius must be positive"));
        }
        if r2.re() <= r1.re() {
            return Err(EvaluationError::domain(inputs.owner(), "r2", "outer leg must lie outside the inner leg"));
        }

        let k = (r2 / r1).ln();
        let tension = i_leg * b0 * r0 * (r1 + r2 * (k - 1.0)) / (r2 - r1) * 0.5;
        outputs.set_scalar("T1", tension);
        Ok(())
    }
}

impl Component for InnerTFCoilTension {
    fn name(&self) -> &'static str {
        "InnerTFCoilTension"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("I_leg").units("MA").desc("Current in one leg"))?;
        vars.input(Var::scalar("B0").units("T").desc("Field on axis"))?;
        vars.input(Var::scalar("R0").units("m").desc("Major radius"))?;
        vars.input(Var::scalar("r1").units("m").default(0.8).desc("Average radius of inner leg conductor"))?;
        vars.input(Var::scalar("r2").units("m").default(8.2).desc("Average radius of outer leg conductor"))?;
        vars.output(Var::scalar("T1").units("MN").desc("Tension on the inner leg"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let i_leg = inputs.scalar("I_leg")?;
        let b0 = inputs.scalar("B0")?;
        let r0 = inputs.scalar("R0")?;
        let r1 = inputs.scalar("r1")?;
        let r2 = inputs.scalar("r2")?;

        let k = (r2 / r1).ln();
        let shape = (r1 + r2 * (k - 1.0)) / ((r2 - r1) * 2.0);
        let gap_sq = (r1 - r2).powi(2);
        partials.set("T1", "I_leg", b0 * r0 * shape)?;
        partials.set("T1", "R0", i_leg * b0 * shape)?;
        partials.set("T1", "B0", i_leg * r0 * shape)?;
        partials.set("T1", "r1", i_leg * r0 * b0 * r2 * (r1 * (k + 1.0) - r2) / (2.0 * r1 * gap_sq))?;
        partials.set("T1", "r2", -i_leg * r0 * b0 * (r1 * (k + 1.0) - r2) / (2.0 * gap_sq))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Stress on the HTS cable when structure and winding pack strain together:
///
/// ```text
/// σ   = T1 / ((A_s + A_t) E_rat + f_HTS A_m)
/// con = (σ_max − σ) / σ_max
/// ```
#[derive(Debug, Clone)]
pub struct InnerTFCoilStrain {
    modulus_ratio: f64,
    max_stress: f64,
}

impl InnerTFCoilStrain {
    pub fn new(config: &impl ConfigAccessor) -> Result<Self, ConfigError> {
        Ok(Self {
            modulus_ratio: config.scalar(&["magnet", "HTS", "modulus ratio"])?,
            max_stress: config.scalar(&["magnet", "HTS", "max stress"])?,
        })
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let a_s = inputs.scalar("A_s")?;
        let a_t = inputs.scalar("A_t")?;
        let a_m = inputs.scalar("A_m")?;
        let f_hts = inputs.scalar("f_HTS")?;
        let t1 = inputs.scalar("T1")?;

        let supporting = (a_s + a_t) * self.modulus_ratio + f_hts * a_m;
        if supporting.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "A_m", "load-bearing area must be positive"));
        }
        let stress = t1 / supporting;
        outputs.set_scalar("s_HTS", stress);
        outputs.set_scalar("max_stress_con", -(stress - self.max_stress) / self.max_stress);
        Ok(())
    }
}

impl Component for InnerTFCoilStrain {
    fn name(&self) -> &'static str {
        "InnerTFCoilStrain"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("T1").units("MN").desc("Tension on the inner TF leg"))?;
        vars.input(Var::scalar("A_s").units("m**2").desc("Inboard inner structure area"))?;
        vars.input(Var::scalar("A_t").units("m**2").desc("Inboard outer structure area"))?;
        vars.input(Var::scalar("A_m").units("m**2").desc("Inboard winding pack area"))?;
        vars.input(Var::scalar("f_HTS").default(0.76).desc("Superconducting fraction of the winding pack"))?;
        vars.output(Var::scalar("s_HTS").units("MPa").desc("Stress on the HTS material"))?;
        vars.output(Var::scalar("max_stress_con").desc("Fraction of allowed stress remaining"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let a_s = inputs.scalar("A_s")?;
        let a_t = inputs.scalar("A_t")?;
        let a_m = inputs.scalar("A_m")?;
        let f_hts = inputs.scalar("f_HTS")?;
        let t1 = inputs.scalar("T1")?;

        let denom = (a_s + a_t) * self.modulus_ratio + f_hts * a_m;
        let denom_sq = denom * denom;
        let stress = [
            ("T1", 1.0 / denom),
            ("A_s", -self.modulus_ratio * t1 / denom_sq),
            ("A_t", -self.modulus_ratio * t1 / denom_sq),
            ("A_m", -f_hts * t1 / denom_sq),
            ("f_HTS", -a_m * t1 / denom_sq),
        ];
        for (wrt, value) in stress {
            partials.set("s_HTS", wrt, value)?;
            partials.set("max_stress_con", wrt, -value / self.max_stress)?;
        }
        Ok(())
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// The inboard TF leg build with its objective and constraints.
///
/// Design inputs: `r_is`, `r_im`, `r_ot`, `r_iu`, `j_HTS`, `f_HTS`, `R0`,
/// `j_eff_wp_max` and the discrete `n_coil`. Objective `obj = −B0`;
/// constraints `max_stress_con`, `con2` (field on coil below the limit) and
/// `con3` (winding pack current density below its maximum) are satisfied
/// when non-negative.
pub fn magnet_radial_build(config: &impl ConfigAccessor) -> Result<Group, ModelError> {
    let max_field = config.scalar(&["magnet", "limits", "max field on coil"])?;
    let mut group = Group::new();

    group.add_subsystem("geometry", MagnetGeometry::new(config)?)?;
    group.promotes("geometry", &["r_ot", "n_coil", "r_iu", "r_im", "r_is"]);
    group.promotes("geometry", &["A_s", "A_t", "A_m", "r1", "r2", "r_om"]);

    group.add_subsystem("current", MagnetCurrent)?;
    group.promotes("current", &["A_m", "f_HTS", "j_HTS", "I_leg"]);

    group.add_subsystem("field", FieldAtRadius)?;
    group.promotes("field", &["I_leg", "r_om", "R0", "n_coil", "B_on_coil", "B0"]);

    group.add_subsystem("tension", InnerTFCoilTension)?;
    group.promotes("tension", &["I_leg", "r1", "r2", "R0", "B0", "T1"]);

    group.add_subsystem("strain", InnerTFCoilStrain::new(config)?)?;
    group.promotes("strain", &["T1", "A_m", "A_t", "A_s", "f_HTS", "s_HTS", "max_stress_con"]);

    group.set_discrete_default("n_coil", DEFAULT_N_COIL);
    group.set_input_defaults("f_HTS", vec![0.76]);

    group.add_subsystem("obj_cmp", ExecComp::new(&["B0"], &["obj"], |x| vec![-x[0]]).units("B0", "T"))?;
    group.promotes("obj_cmp", &["*"]);

    let con2 = ExecComp::new(&["B_on_coil"], &["con2"], move |x| vec![-x[0] + max_field]).units("B_on_coil", "T");
    group.add_subsystem("con_cmp2", con2)?;
    group.promotes("con_cmp2", &["*"]);

    let con3 = ExecComp::new(&["A_m", "j_eff_wp_max", "I_leg"], &["con3"], |x| vec![x[0] * x[1] - x[2]])
        .units("A_m", "m**2")
        .units("j_eff_wp_max", "MA/m**2")
        .units("I_leg", "MA")
        .default("j_eff_wp_max", 160.0);
    group.add_subsystem("con_cmp3", con3)?;
    group.promotes("con_cmp3", &["*"]);

    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;

    fn assert_partials(problem: &mut Problem) {
        for options in [CheckOptions::finite_difference(), CheckOptions::dual()] {
            let report = problem.check_partials(&options).unwrap();
            assert!(report.passed(), "{}", report.to_json().unwrap());
        }
    }

    #[test]
    fn test_tension_closed_form() {
        let mut problem = Problem::from_component("tension", InnerTFCoilTension).unwrap();
        problem
            .set_inputs(&[
                ("I_leg", vec![1.0]),
                ("B0", vec![1.0]),
                ("R0", vec![3.0]),
                ("r1", vec![0.8]),
                ("r2", vec![8.2]),
            ])
            .unwrap();
        problem.run().unwrap();

        let (r1, r2) = (0.8f64, 8.2f64);
        let expected = 0.5 * 1.0 * 1.0 * 3.0 * (r1 + r2 * ((r2 / r1).ln() - 1.0)) / (r2 - r1);
        assert!((problem.get_scalar("T1").unwrap() - expected).abs() < 1e-12);
        assert_partials(&mut problem);
    }

    #[test]
    fn test_field_at_radius() {
        let mut problem = Problem::from_component("field", FieldAtRadius).unwrap();
        problem
            .set_inputs(&[("I_leg", vec![2.0]), ("r_om", vec![0.35]), ("R0", vec![3.0])])
            .unwrap();
        problem.run().unwrap();

        let expected = MU_0 * MEGA * 18.0 * 2.0 / (2.0 * PI * 3.0);
        assert!((problem.get_scalar("B0").unwrap() - expected).abs() < 1e-12);
        assert_partials(&mut problem);

        problem.set_discrete("n_coil", 12).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("B0").unwrap() - expected * 12.0 / 18.0).abs() < 1e-12);
    }

    #[test]
    fn test_field_domain_errors() {
        let mut problem = Problem::from_component("field", FieldAtRadius).unwrap();
        problem.set_discrete("n_coil", 0).unwrap();
        assert!(matches!(
            problem.run(),
            Err(EvaluationError::Domain { ref variable, .. }) if variable == "n_coil"
        ));

        problem.set_discrete("n_coil", 18).unwrap();
        for radius in ["r_om", "R0"] {
            problem.set_scalar(radius, 0.0).unwrap();
            assert!(matches!(
                problem.run(),
                Err(EvaluationError::Domain { ref variable, .. }) if variable == radius
            ));
            problem.set_scalar(radius, 1.0).unwrap();
        }
        assert!(problem.run().is_ok());
    }

    #[test]
    fn test_geometry_areas() {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::from_component("geometry", MagnetGeometry::new(&config).unwrap()).unwrap();
        problem.run().unwrap();

        let r_om = 0.405 - 0.05 - 0.006;
        assert!((problem.get_scalar("r_om").unwrap() - r_om).abs() < 1e-12);
        assert!((problem.get_scalar("r1").unwrap() - (r_om + 0.22) / 2.0).abs() < 1e-12);
        assert!((problem.get_scalar("r2").unwrap() - (8.025 + 0.305 / 2.0)).abs() < 1e-12);

        let (w, l) = ((PI / 18.0).cos(), 2.0 * (PI / 18.0).sin());
        let a_m = (r_om - 0.22) * w * (r_om + 0.22) * l / 2.0;
        assert!((problem.get_scalar("A_m").unwrap() - a_m).abs() < 1e-12);
        assert_partials(&mut problem);
    }

    #[test]
    fn test_strain_and_current_partials() {
        let config = Config::builtin().unwrap();
        let mut strain = Problem::from_component("strain", InnerTFCoilStrain::new(&config).unwrap()).unwrap();
        strain
            .set_inputs(&[
                ("T1", vec![12.0]),
                ("A_s", vec![0.006]),
                ("A_t", vec![0.0065]),
                ("A_m", vec![0.0125]),
            ])
            .unwrap();
        assert_partials(&mut strain);

        let mut current = Problem::from_component("current", MagnetCurrent).unwrap();
        current.set_scalar("j_HTS", 100.0).unwrap();
        assert_partials(&mut current);
    }

    #[test]
    fn test_radial_build_group() {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::new(magnet_radial_build(&config).unwrap()).unwrap();
        problem.set_scalar("R0", 3.0).unwrap();
        problem.set_scalar("j_HTS", 100.0).unwrap();
        let outputs = problem.run().unwrap();

        for name in ["obj", "con2", "con3", "max_stress_con", "s_HTS"] {
            assert!(outputs.contains_key(name), "missing leaf output {}", name);
        }
        let b0 = problem.get_scalar("B0").unwrap();
        assert_eq!(problem.get_scalar("obj").unwrap(), -b0);
        assert_eq!(problem.get_scalar("f_HTS").unwrap(), 0.76);
        assert_eq!(problem.get_discrete("n_coil").unwrap(), 18);

        let con3 = problem.get_scalar("A_m").unwrap() * 160.0 - problem.get_scalar("I_leg").unwrap();
        assert!((problem.get_scalar("con3").unwrap() - con3).abs() < 1e-12);

        assert_partials(&mut problem);
        let report = problem
            .check_totals(
                &["obj", "con2", "con3", "max_stress_con"],
                &["r_is", "r_im", "j_HTS"],
                &CheckOptions::finite_difference(),
            )
            .unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }
}
