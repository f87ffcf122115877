// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! D-T fusion rates and powers, thermal and beam-target.

use crate::config::consts::{
    ALPHA_MASS_U, ATOMIC_MASS_UNIT, ATTO, DT_REACTION_ENERGY_MEV, ELEMENTARY_CHARGE, KILO, MEGA,
};
use crate::errors::{AssemblyError, EvaluationError};
use crate::jacobian::{Partials, Sparsity};
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};

/// Share of the reaction energy carried by the alpha particle.
pub const ALPHA_FRACTION: f64 = 0.2;
/// Share of the reaction energy carried by the neutron.
pub const NEUTRON_FRACTION: f64 = 0.8;

/// Energy of one D-T reaction in joules.
pub fn reaction_energy_joules() -> f64 {
    DT_REACTION_ENERGY_MEV * MEGA * ELEMENTARY_CHARGE
}

/// ⟨σv⟩ = 1.1e-24 m³/s (T / keV)², reported in μm³/s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRateCoeff;

impl SimpleRateCoeff {
    /// 1.1e-24 m³/s expressed in μm³/s
    const COEFFICIENT: f64 = 1.1e-6;
}

impl Component for SimpleRateCoeff {
    fn name(&self) -> &'static str {
        "SimpleRateCoeff"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("T").units("keV").desc("Ion temperature"))?;
        vars.output(
            Var::scalar("<σv>")
                .units("um**3/s")
                .lower(0.0)
                .reference(Self::COEFFICIENT * 100.0)
                .desc("Fusion rate coefficient"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let t = inputs.scalar("T")?;
        outputs.set_scalar("<σv>", Self::COEFFICIENT * t * t);
        Ok(())
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("<σv>", "T", 2.0 * Self::COEFFICIENT * inputs.scalar("T")?)
    }
}

/// Thermal D-T reaction rate and power densities,
/// rate/V = ⟨σv⟩ n_D n_T and P_fus/V = E_fus rate/V.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumetricThermalFusionRate;

impl VolumetricThermalFusionRate {
    /// n20 to 1/m³
    const DENSITY_SCALE: f64 = 1e20;
    /// μm³/s to m³/s
    const RATE_COEFF_SCALE: f64 = 1e-18;

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let n_d = inputs.scalar("n_D")? * Self::DENSITY_SCALE;
        let n_t = inputs.scalar("n_T")? * Self::DENSITY_SCALE;
        let sigma_v = inputs.scalar("<σv>")? * Self::RATE_COEFF_SCALE;

        let rate = n_d * n_t * sigma_v;
        let power = rate * (reaction_energy_joules() / MEGA);
        outputs.set_scalar("rate_fus/V", rate * ATTO);
        outputs.set_scalar("P_fus/V", power);
        outputs.set_scalar("P_n/V", power * NEUTRON_FRACTION);
        outputs.set_scalar("P_α/V", power * ALPHA_FRACTION);
        Ok(())
    }
}

impl Component for VolumetricThermalFusionRate {
    fn name(&self) -> &'static str {
        "VolumetricThermalFusionRate"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("n_D").units("n20").desc("Deuterium density"))?;
        vars.input(Var::scalar("n_T").units("n20").desc("Tritium density"))?;
        vars.input(Var::scalar("<σv>").units("um**3/s").desc("Fusion rate coefficient"))?;
        vars.output(Var::scalar("rate_fus/V").units("1/m**3/as").lower(0.0).desc("Volumetric fusion rate"))?;
        vars.output(
            Var::scalar("P_fus/V")
                .units("MW/m**3")
                .lower(0.0)
                .reference(3.0)
                .desc("Volumetric fusion energy production"),
        )?;
        vars.output(Var::scalar("P_n/V").units("MW/m**3").lower(0.0).desc("Volumetric neutron energy production"))?;
        vars.output(Var::scalar("P_α/V").units("MW/m**3").lower(0.0).desc("Volumetric α energy production"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let n_d = inputs.scalar("n_D")?;
        let n_t = inputs.scalar("n_T")?;
        let sigma_v = inputs.scalar("<σv>")?;
        let scale = Self::DENSITY_SCALE * Self::DENSITY_SCALE * Self::RATE_COEFF_SCALE;
        let by_input = [("n_D", n_t * sigma_v), ("n_T", n_d * sigma_v), ("<σv>", n_d * n_t)];

        let energy = reaction_energy_joules() / MEGA;
        for (wrt, d_product) in by_input {
            let d_rate = scale * d_product;
            partials.set("rate_fus/V", wrt, d_rate * ATTO)?;
            partials.set("P_fus/V", wrt, d_rate * energy)?;
            partials.set("P_n/V", wrt, d_rate * energy * NEUTRON_FRACTION)?;
            partials.set("P_α/V", wrt, d_rate * energy * ALPHA_FRACTION)?;
        }
        Ok(())
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Beam-target fusion of deuterium beams in a 50/50 D-T plasma (Strachan
/// et al., 1981): rate = 80 × 1.1e14 P_NBI ⟨T_e⟩^(3/2), with the factor 80
/// scaling the D-D rate up to D-T.
#[derive(Debug, Clone, Copy, Default)]
pub struct NBIBeamTargetFusion;

impl NBIBeamTargetFusion {
    const CONSTANT: f64 = 1.1e14;
    const DT_MULTIPLIER: f64 = 80.0;

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let p_nbi = inputs.scalar("P_NBI")?;
        let te = inputs.scalar("<T_e>")?;
        if te.re() < 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "<T_e>", "negative temperature"));
        }
        let rate = p_nbi * te.powf(1.5) * (Self::CONSTANT * Self::DT_MULTIPLIER);
        outputs.set_scalar("rate_fus", rate * ATTO);
        outputs.set_scalar("P_fus", rate * (reaction_energy_joules() / MEGA));
        Ok(())
    }
}

impl Component for NBIBeamTargetFusion {
    fn name(&self) -> &'static str {
        "NBIBeamTargetFusion"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("P_NBI").units("MW").desc("Neutral beam injected power"))?;
        vars.input(Var::scalar("<T_e>").units("keV").desc("Average electron temperature"))?;
        vars.output(
            Var::scalar("rate_fus")
                .units("1/as")
                .lower(0.0)
                .reference(1e4)
                .desc("NBI beam-target fusion reaction rate"),
        )?;
        vars.output(
            Var::scalar("P_fus")
                .units("MW")
                .lower(0.0)
                .reference(10.0)
                .desc("NBI beam-target fusion power"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let p_nbi = inputs.scalar("P_NBI")?;
        let te = inputs.scalar("<T_e>")?;
        let c = Self::CONSTANT * Self::DT_MULTIPLIER;
        let energy = reaction_energy_joules() / MEGA;

        let d_power = c * te.powf(1.5);
        let d_te = 1.5 * c * p_nbi * te.sqrt();
        partials.set("rate_fus", "P_NBI", d_power * ATTO)?;
        partials.set("rate_fus", "<T_e>", d_te * ATTO)?;
        partials.set("P_fus", "P_NBI", d_power * energy)?;
        partials.set("P_fus", "<T_e>", d_te * energy)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Sum of thermal and beam-target contributions, split into alpha and
/// neutron power.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalDTFusionRate;

impl Component for TotalDTFusionRate {
    fn name(&self) -> &'static str {
        "TotalDTFusionRate"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("P_fus_th").units("MW").default(0.0).desc("Thermal fusion power"))?;
        vars.input(Var::scalar("P_fus_NBI").units("MW").default(0.0).desc("NBI beam-target fusion power"))?;
        vars.input(Var::scalar("rate_th").units("1/as").default(0.0).desc("Thermal fusion rate"))?;
        vars.input(Var::scalar("rate_NBI").units("1/as").default(0.0).desc("NBI beam-target fusion rate"))?;

        let tiny = 1e-6;
        vars.output(
            Var::scalar("rate_fus")
                .units("1/as")
                .lower(0.0)
                .reference(1e5)
                .desc("Total fusion reaction rate"),
        )?;
        vars.output(Var::scalar("P_fus").units("MW").lower(tiny).reference(100.0).desc("Total fusion power"))?;
        vars.output(Var::scalar("P_α").units("MW").lower(tiny).reference(100.0).desc("Alpha particle power"))?;
        vars.output(Var::scalar("P_n").units("MW").lower(tiny).reference(100.0).desc("Fusion neutron power"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(&["rate_fus"], &["rate_th", "rate_NBI"]);
        sparsity.declare_all(&["P_fus", "P_α", "P_n"], &["P_fus_th", "P_fus_NBI"]);
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let p_fus = inputs.scalar("P_fus_th")? + inputs.scalar("P_fus_NBI")?;
        outputs.set_scalar("rate_fus", inputs.scalar("rate_th")? + inputs.scalar("rate_NBI")?);
        outputs.set_scalar("P_fus", p_fus);
        outputs.set_scalar("P_α", p_fus * ALPHA_FRACTION);
        outputs.set_scalar("P_n", p_fus * NEUTRON_FRACTION);
        Ok(())
    }

    fn compute_partials(&self, _inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("rate_fus", "rate_th", 1.0)?;
        partials.set("rate_fus", "rate_NBI", 1.0)?;
        for wrt in ["P_fus_th", "P_fus_NBI"] {
            partials.set("P_fus", wrt, 1.0)?;
            partials.set("P_α", wrt, ALPHA_FRACTION)?;
            partials.set("P_n", wrt, NEUTRON_FRACTION)?;
        }
        Ok(())
    }
}

/// Birth properties of D-T fusion alphas as model variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFusionAlphaSource;

impl SimpleFusionAlphaSource {
    /// keV
    pub fn energy() -> f64 {
        DT_REACTION_ENERGY_MEV * KILO * ALPHA_FRACTION
    }

    /// m/s
    pub fn velocity() -> f64 {
        let energy = reaction_energy_joules() * ALPHA_FRACTION;
        (2.0 * energy / (ALPHA_MASS_U * ATOMIC_MASS_UNIT)).sqrt()
    }
}

impl Component for SimpleFusionAlphaSource {
    fn name(&self) -> &'static str {
        "SimpleFusionAlphaSource"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.output(
            Var::scalar("E")
                .units("keV")
                .default(Self::energy())
                .reference(3.5e3)
                .desc("Alpha particle initial energy"),
        )?;
        vars.output(Var::scalar("A").units("u").default(ALPHA_MASS_U).desc("Alpha particle mass"))?;
        vars.output(Var::scalar("Z").default(2.0).desc("Alpha particle charge"))?;
        vars.output(
            Var::scalar("v")
                .units("m/s")
                .default(Self::velocity())
                .reference(1e7)
                .desc("Alpha particle initial velocity"),
        )
    }

    fn compute(&self, _inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        outputs.set_scalar("E", Self::energy());
        outputs.set_scalar("A", ALPHA_MASS_U);
        outputs.set_scalar("Z", 2.0);
        outputs.set_scalar("v", Self::velocity());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;

    fn assert_partials(problem: &mut Problem) {
        for options in [CheckOptions::finite_difference(), CheckOptions::dual()] {
            let report = problem.check_partials(&options).unwrap();
            assert!(report.passed(), "{}", report.to_json().unwrap());
        }
    }

    #[test]
    fn test_thermal_rate_chain() {
        let mut model = crate::model::Group::new();
        model.add_subsystem("coeff", SimpleRateCoeff).unwrap();
        model.add_subsystem("thermal", VolumetricThermalFusionRate).unwrap();
        model.promotes("coeff", &["T", "<σv>"]);
        model.promotes("thermal", &["*"]);
        let mut problem = Problem::new(model).unwrap();
        problem
            .set_inputs(&[("T", vec![10.0]), ("n_D", vec![0.5]), ("n_T", vec![0.5])])
            .unwrap();
        problem.run().unwrap();

        assert!((problem.get_scalar("<σv>").unwrap() - 1.1e-4).abs() < 1e-16);
        assert!((problem.get_scalar("rate_fus/V").unwrap() - 0.275).abs() < 1e-12);
        let power = problem.get_scalar("P_fus/V").unwrap();
        assert!((power - 0.774_982_050_381_445_4).abs() < 1e-9);
        let split = problem.get_scalar("P_n/V").unwrap() + problem.get_scalar("P_α/V").unwrap();
        assert!((split - power).abs() < 1e-12);

        let totals = problem.compute_totals(&["P_fus/V"], &["T"]).unwrap();
        // P ∝ T², so dP/dT = 2P/T
        assert!((totals.get("P_fus/V", "T").unwrap()[(0, 0)] - 2.0 * power / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_thermal_rate_partials() {
        let mut problem = Problem::from_component("thermal", VolumetricThermalFusionRate).unwrap();
        problem
            .set_inputs(&[("n_D", vec![0.6]), ("n_T", vec![0.4]), ("<σv>", vec![1.3e-4])])
            .unwrap();
        assert_partials(&mut problem);
    }

    #[test]
    fn test_beam_target_fusion() {
        let mut problem = Problem::from_component("nbi", NBIBeamTargetFusion).unwrap();
        problem
            .set_inputs(&[("P_NBI", vec![50.0]), ("<T_e>", vec![9.2])])
            .unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("rate_fus").unwrap() - 12.278_191_919_008_27).abs() < 1e-9);
        assert!((problem.get_scalar("P_fus").unwrap() - 34.601_375_812_254_27).abs() < 1e-8);
        assert_partials(&mut problem);

        problem.set_scalar("<T_e>", -1.0).unwrap();
        let err = problem.run().unwrap_err();
        assert!(matches!(err, EvaluationError::Domain { ref variable, .. } if variable == "<T_e>"));
    }

    #[test]
    fn test_total_rate_splits_power() {
        let mut problem = Problem::from_component("total", TotalDTFusionRate).unwrap();
        problem
            .set_inputs(&[("P_fus_th", vec![400.0]), ("P_fus_NBI", vec![100.0])])
            .unwrap();
        problem.run().unwrap();
        assert_eq!(problem.get_scalar("P_fus").unwrap(), 500.0);
        assert_eq!(problem.get_scalar("P_α").unwrap(), 100.0);
        assert_eq!(problem.get_scalar("P_n").unwrap(), 400.0);
        assert_eq!(problem.get_scalar("rate_fus").unwrap(), 0.0);

        let report = problem.check_partials(&CheckOptions::finite_difference()).unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn test_alpha_source_constants() {
        let mut problem = Problem::from_component("alpha", SimpleFusionAlphaSource).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("E").unwrap() - 3517.86).abs() < 1e-9);
        assert_eq!(problem.get_scalar("Z").unwrap(), 2.0);
        let v = problem.get_scalar("v").unwrap();
        assert!((v - 1.302_486_336_101_156_3e7).abs() < 1.0, "{}", v);
    }
}
