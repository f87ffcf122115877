// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plasma pressure limits expressed as normalized, toroidal and poloidal beta.

use crate::config::consts::{KILO, MEGA, MU_0};
use crate::config::ConfigAccessor;
use crate::errors::{AssemblyError, ConfigError, EvaluationError, ModelError};
use crate::jacobian::Partials;
use crate::model::Group;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};

const BETA_N_UNITS: &str = "m * T / MA";

fn positive(component: &str, variable: &str, value: f64) -> Result<(), EvaluationError> {
    if value <= 0.0 {
        return Err(EvaluationError::domain(component, variable, format!("must be positive, got {}", value)));
    }
    Ok(())
}

/// No-wall normalized beta limit with 50% bootstrap fraction
/// (Phys. Plasmas 11, 639 (2004)), as a fraction rather than a percentage:
///
/// ```text
/// β_N = (b + c / A^d) / 100        β_N total = f β_N
/// ```
#[derive(Debug, Clone)]
pub struct BetaNTotal {
    scaling: [f64; 3],
    multiplier: f64,
}

impl BetaNTotal {
    pub fn new(config: &impl ConfigAccessor) -> Result<Self, ConfigError> {
        let c = config.array_of_len(&["fits", "no-wall β_N scaling with ε", "constants"], 3)?;
        Ok(Self {
            scaling: [c[0], c[1], c[2]],
            multiplier: config.scalar(&["fits", "β_N multiplier"])?,
        })
    }

    fn scaling_law<T: DualNum<f64> + Copy>(&self, aspect_ratio: T) -> T {
        let [b, c, d] = self.scaling;
        (aspect_ratio.powf(-d) * c + b) * 0.01
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let aspect_ratio = inputs.scalar("A")?;
        positive(inputs.owner(), "A", aspect_ratio.re())?;
        let beta_n = self.scaling_law(aspect_ratio);
        outputs.set_scalar("β_N", beta_n);
        outputs.set_scalar("β_N total", beta_n * inputs.scalar("f")?);
        Ok(())
    }
}

impl Component for BetaNTotal {
    fn name(&self) -> &'static str {
        "BetaNTotal"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("A").default(1.7).desc("Aspect ratio"))?;
        vars.input(Var::scalar("f").default(self.multiplier).desc("Fraction of maximum β_N"))?;
        vars.output(Var::scalar("β_N").units(BETA_N_UNITS).desc("Normalized beta"))?;
        vars.output(Var::scalar("β_N total").units(BETA_N_UNITS).desc("Total normalized beta"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let aspect_ratio = inputs.scalar("A")?;
        let f = inputs.scalar("f")?;
        let [_, c, d] = self.scaling;
        let dbeta_da = -0.01 * aspect_ratio.powf(-d - 1.0) * c * d;

        partials.set("β_N", "A", dbeta_da)?;
        partials.set("β_N", "f", 0.0)?;
        partials.set("β_N total", "A", f * dbeta_da)?;
        partials.set("β_N total", "f", self.scaling_law(aspect_ratio))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// βt = Ip β_N / (Bt a)
#[derive(Debug, Clone, Copy, Default)]
pub struct BetaToroidal;

impl BetaToroidal {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ip = inputs.scalar("Ip")?;
        let bt = inputs.scalar("Bt")?;
        let a = inputs.scalar("a")?;
        positive(inputs.owner(), "Bt", bt.re())?;
        positive(inputs.owner(), "a", a.re())?;
        outputs.set_scalar("βt", ip * inputs.scalar("β_N total")? / (bt * a));
        Ok(())
    }
}

impl Component for BetaToroidal {
    fn name(&self) -> &'static str {
        "BetaToroidal"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("Ip").units("MA").desc("Plasma current"))?;
        vars.input(Var::scalar("Bt").units("T").desc("Vacuum toroidal field at geometric center"))?;
        vars.input(Var::scalar("a").units("m").desc("Minor radius"))?;
        vars.input(Var::scalar("β_N total").units(BETA_N_UNITS).desc("Total normalized beta"))?;
        vars.output(
            Var::scalar("βt")
                .lower(0.0)
                .upper(1.0)
                .reference(0.02)
                .desc("Toroidal beta"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let ip = inputs.scalar("Ip")?;
        let bt = inputs.scalar("Bt")?;
        let a = inputs.scalar("a")?;
        let beta_n = inputs.scalar("β_N total")?;

        partials.set("βt", "Ip", beta_n / (bt * a))?;
        partials.set("βt", "β_N total", ip / (bt * a))?;
        partials.set("βt", "Bt", -ip * beta_n / (bt * bt * a))?;
        partials.set("βt", "a", -ip * beta_n / (bt * a * a))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Volume-averaged total pressure from toroidal beta, in kPa:
/// `<p> = f βt Bt² / 2μ0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecifiedTotalAveragePressure;

impl SpecifiedTotalAveragePressure {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let bt = inputs.scalar("Bt")?;
        let beta_t = inputs.scalar("βt")?;
        let shaping = inputs.scalar("<(R0/R)^2>")?;
        let pressure = shaping * beta_t * bt * bt * (1.0 / (2.0 * MU_0 * KILO));
        outputs.set_scalar("<p_tot>", pressure);
        Ok(())
    }
}

impl Component for SpecifiedTotalAveragePressure {
    fn name(&self) -> &'static str {
        "SpecifiedTotalAveragePressure"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("Bt").units("T").desc("Vacuum toroidal field at geometric center"))?;
        vars.input(Var::scalar("βt").desc("Toroidal beta"))?;
        vars.input(Var::scalar("<(R0/R)^2>").default(1.0).desc("Geometric shaping factor"))?;
        vars.output(
            Var::scalar("<p_tot>")
                .units("kPa")
                .reference(1e5)
                .lower(0.0)
                .desc("Volume-averaged total pressure"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let bt = inputs.scalar("Bt")?;
        let beta_t = inputs.scalar("βt")?;
        let shaping = inputs.scalar("<(R0/R)^2>")?;
        let magnetic = bt * bt / (2.0 * MU_0 * KILO);

        partials.set("<p_tot>", "βt", shaping * magnetic)?;
        partials.set("<p_tot>", "Bt", shaping * beta_t * bt / (MU_0 * KILO))?;
        partials.set("<p_tot>", "<(R0/R)^2>", beta_t * magnetic)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Average poloidal field at the last closed flux surface, Bp = μ0 Ip / L_pol.
#[derive(Debug, Clone, Copy, Default)]
pub struct BPoloidal;

impl BPoloidal {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ip = inputs.scalar("Ip")?;
        let l_pol = inputs.scalar("L_pol")?;
        positive(inputs.owner(), "L_pol", l_pol.re())?;
        outputs.set_scalar("Bp", ip * (MU_0 * MEGA) / l_pol);
        Ok(())
    }
}

impl Component for BPoloidal {
    fn name(&self) -> &'static str {
        "BPoloidal"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("Ip").units("MA").desc("Plasma current"))?;
        vars.input(Var::scalar("L_pol").units("m").desc("Poloidal circumference"))?;
        vars.output(
            Var::scalar("Bp")
                .units("T")
                .reference(1.0)
                .lower(1e-6)
                .desc("Average poloidal field"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let ip = inputs.scalar("Ip")?;
        let l_pol = inputs.scalar("L_pol")?;
        partials.set("Bp", "Ip", MU_0 * MEGA / l_pol)?;
        partials.set("Bp", "L_pol", -MU_0 * MEGA * ip / (l_pol * l_pol))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Poloidal beta, βp = 2μ0 <p> / Bp².
#[derive(Debug, Clone, Copy, Default)]
pub struct BetaPoloidal;

impl BetaPoloidal {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let bp = inputs.scalar("Bp")?;
        positive(inputs.owner(), "Bp", bp.re())?;
        let pressure = inputs.scalar("<p_tot>")?;
        outputs.set_scalar("βp", pressure * (KILO * 2.0 * MU_0) / (bp * bp));
        Ok(())
    }
}

impl Component for BetaPoloidal {
    fn name(&self) -> &'static str {
        "BetaPoloidal"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("<p_tot>").units("kPa").desc("Volume-averaged total pressure"))?;
        vars.input(Var::scalar("Bp").units("T").desc("Average poloidal field at LCFS"))?;
        vars.output(Var::scalar("βp").desc("Poloidal beta"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let bp = inputs.scalar("Bp")?;
        let pressure = inputs.scalar("<p_tot>")?;
        let scale = KILO * 2.0 * MU_0;
        partials.set("βp", "Bp", -2.0 * pressure * scale / bp.powi(3))?;
        partials.set("βp", "<p_tot>", scale / (bp * bp))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Thermal share of the poloidal beta.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalBetaPoloidal;

impl Component for ThermalBetaPoloidal {
    fn name(&self) -> &'static str {
        "ThermalBetaPoloidal"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("βp").desc("Total poloidal beta"))?;
        vars.input(Var::scalar("thermal pressure fraction").desc("Fraction of pressure from thermal particles"))?;
        vars.output(Var::scalar("βp_th").lower(0.0).desc("Thermal poloidal beta"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let beta_p = inputs.scalar("βp")?;
        outputs.set_scalar("βp_th", beta_p * inputs.scalar("thermal pressure fraction")?);
        Ok(())
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("βp_th", "βp", inputs.scalar("thermal pressure fraction")?)?;
        partials.set("βp_th", "thermal pressure fraction", inputs.scalar("βp")?)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        let beta_p = inputs.scalar("βp")?;
        outputs.set_scalar("βp_th", beta_p * inputs.scalar("thermal pressure fraction")?);
        Ok(())
    }
}

/// Toroidal, average and poloidal pressure chain for a given β_N fraction.
///
/// Visible names: `A`, `Ip`, `Bt`, `a`, `L_pol`, `βt`, `Bp`, `βp`.
pub fn specified_pressure(config: &impl ConfigAccessor) -> Result<Group, ModelError> {
    let mut group = Group::new();
    group.add_subsystem("betaNtot", BetaNTotal::new(config)?)?;
    group.promotes("betaNtot", &["A"]);

    group.add_subsystem("beta_t", BetaToroidal)?;
    group.promotes("beta_t", &["Ip", "Bt", "a", "βt"]);

    group.add_subsystem("p_avg", SpecifiedTotalAveragePressure)?;
    group.promotes("p_avg", &["Bt", "βt"]);

    group.add_subsystem("B_p", BPoloidal)?;
    group.promotes("B_p", &["Ip", "L_pol", "Bp"]);

    group.add_subsystem("beta_p", BetaPoloidal)?;
    group.promotes("beta_p", &["Bp", "βp"]);

    group.connect("betaNtot.β_N total", "beta_t.β_N total");
    group.connect("p_avg.<p_tot>", "beta_p.<p_tot>");
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
    fn test_beta_n_scaling_law() {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::from_component("betaN", BetaNTotal::new(&config).unwrap()).unwrap();
        problem.set_scalar("A", 2.0).unwrap();
        problem.set_scalar("f", 0.8).unwrap();
        problem.run().unwrap();

        let expected = (3.12 + 3.5 / 2.0f64.powf(1.7)) / 100.0;
        assert!((problem.get_scalar("β_N").unwrap() - expected).abs() < 1e-14);
        assert!((problem.get_scalar("β_N total").unwrap() - 0.8 * expected).abs() < 1e-14);
        assert_partials(&mut problem);
    }

    #[test]
    fn test_multiplier_default_comes_from_config() {
        let config = Config::builtin()
            .unwrap()
            .merged(Config::from_yaml_str("fits:\n  β_N multiplier: 0.9\n").unwrap());
        let problem = Problem::from_component("betaN", BetaNTotal::new(&config).unwrap()).unwrap();
        assert_eq!(problem.get_scalar("f").unwrap(), 0.9);
    }

    #[test]
    fn test_single_component_partials() {
        let mut toroidal = Problem::from_component("beta_t", BetaToroidal).unwrap();
        toroidal
            .set_inputs(&[("Ip", vec![14.0]), ("Bt", vec![2.1]), ("a", vec![1.6]), ("β_N total", vec![0.045])])
            .unwrap();
        assert_partials(&mut toroidal);

        let mut pressure = Problem::from_component("p_avg", SpecifiedTotalAveragePressure).unwrap();
        pressure.set_inputs(&[("Bt", vec![2.1]), ("βt", vec![0.15])]).unwrap();
        assert_partials(&mut pressure);

        let mut b_pol = Problem::from_component("B_p", BPoloidal).unwrap();
        b_pol.set_inputs(&[("Ip", vec![14.0]), ("L_pol", vec![16.0])]).unwrap();
        assert_partials(&mut b_pol);

        let mut beta_p = Problem::from_component("beta_p", BetaPoloidal).unwrap();
        beta_p.set_inputs(&[("<p_tot>", vec![260.0]), ("Bp", vec![1.1])]).unwrap();
        assert_partials(&mut beta_p);

        let mut thermal = Problem::from_component("thermal", ThermalBetaPoloidal).unwrap();
        thermal
            .set_inputs(&[("βp", vec![0.55]), ("thermal pressure fraction", vec![0.8])])
            .unwrap();
        assert_partials(&mut thermal);
    }

    #[test]
    fn test_zero_poloidal_field_is_a_domain_error() {
        let mut problem = Problem::from_component("beta_p", BetaPoloidal).unwrap();
        problem.set_scalar("Bp", 0.0).unwrap();
        assert!(matches!(problem.run(), Err(EvaluationError::Domain { .. })));
    }

    #[test]
    fn test_specified_pressure_chain() {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::new(specified_pressure(&config).unwrap()).unwrap();
        problem
            .set_inputs(&[
                ("A", vec![1.7]),
                ("Ip", vec![14.0]),
                ("Bt", vec![2.1]),
                ("a", vec![1.7647]),
                ("L_pol", vec![16.0]),
            ])
            .unwrap();
        problem.run().unwrap();

        let beta_n = (3.12 + 3.5 / 1.7f64.powf(1.7)) / 100.0;
        let beta_t = 14.0 * beta_n / (2.1 * 1.7647);
        assert!((problem.get_scalar("βt").unwrap() - beta_t).abs() < 1e-12);

        let bp = MU_0 * MEGA * 14.0 / 16.0;
        let pressure = beta_t * 2.1 * 2.1 / (2.0 * MU_0) / KILO;
        let beta_p = pressure * KILO * 2.0 * MU_0 / (bp * bp);
        assert!((problem.get_scalar("βp").unwrap() - beta_p).abs() < 1e-9 * beta_p);

        // βp depends on A only through β_N
        let totals = problem.compute_totals(&["βp"], &["A", "Bt", "L_pol"]).unwrap();
        let report = problem
            .check_totals(&["βp"], &["A", "Bt", "L_pol"], &CheckOptions::finite_difference())
            .unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
        assert!(totals.get("βp", "A").unwrap()[(0, 0)] < 0.0);
    }
}
