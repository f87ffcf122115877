// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Standard plasma formulary relations.

use crate::config::consts::MU_0;
use crate::errors::{AssemblyError, EvaluationError};
use crate::jacobian::Partials;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};

/// V_A = |B| / sqrt(μ0 ρ)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlfvenSpeed;

impl AlfvenSpeed {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let b = inputs.scalar("|B|")?;
        let rho = inputs.scalar("ρ")?;
        if rho.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "ρ", "mass density must be positive"));
        }
        outputs.set_scalar("V_A", b / (rho * MU_0).sqrt());
        Ok(())
    }
}

impl Component for AlfvenSpeed {
    fn name(&self) -> &'static str {
        "AlfvenSpeed"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("|B|").units("T").desc("Magnetic field strength"))?;
        vars.input(Var::scalar("ρ").units("kg/m**3").desc("Plasma mass density"))?;
        vars.output(
            Var::scalar("V_A")
                .units("m/s")
                .reference(1e4)
                .lower(0.0)
                .desc("Alfvén speed"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let b = inputs.scalar("|B|")?;
        let rho = inputs.scalar("ρ")?;
        partials.set("V_A", "ρ", -b * MU_0 / (2.0 * (MU_0 * rho).powf(1.5)))?;
        partials.set("V_A", "|B|", 1.0 / (MU_0 * rho).sqrt())
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Density-weighted mean ion mass of a mixture of `n_species` species.
#[derive(Debug, Clone, Copy)]
pub struct AverageIonMass {
    n_species: usize,
}

impl AverageIonMass {
    pub fn new(n_species: usize) -> Self {
        Self { n_species }
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ni = inputs.array("ni")?;
        let ai = inputs.array("Ai")?;
        let mut numer = T::from(0.0f64);
        let mut denom = T::from(0.0f64);
        for (&n, &a) in ni.iter().zip(ai) {
            numer = numer + n * a;
            denom = denom + n;
        }
        if denom.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "ni", "total ion density must be positive"));
        }
        outputs.set_scalar("A_bar", numer / denom);
        Ok(())
    }
}

impl Component for AverageIonMass {
    fn name(&self) -> &'static str {
        "AverageIonMass"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::array("ni", self.n_species).units("n20").desc("Ion field particle densities"))?;
        vars.input(Var::array("Ai", self.n_species).units("u").desc("Ion field particle atomic masses"))?;
        vars.output(Var::scalar("A_bar").units("u").lower(0.0).desc("Average ion mass"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let ni = inputs.array("ni")?;
        let ai = inputs.array("Ai")?;
        let numer: f64 = ni.iter().zip(ai).map(|(n, a)| n * a).sum();
        let denom: f64 = ni.iter().sum();

        let d_ni: Vec<f64> = ai.iter().map(|a| a / denom - numer / (denom * denom)).collect();
        let d_ai: Vec<f64> = ni.iter().map(|n| n / denom).collect();
        partials.set_values("A_bar", "ni", &d_ni)?;
        partials.set_values("A_bar", "Ai", &d_ai)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Electron Coulomb logarithm, `31.3 − ln(sqrt(ne) / Te)` in SI density.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoulombLogarithmElectrons;

impl CoulombLogarithmElectrons {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ne = inputs.scalar("ne")?;
        let te = inputs.scalar("Te")?;
        if ne.re() < 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "ne", "negative densities not allowed"));
        }
        if te.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "Te", "temperature must be positive"));
        }
        let log = -(ne.sqrt() * 1e10 / te).ln() + 31.3;
        outputs.set_scalar("logΛe", log);
        Ok(())
    }
}

impl Component for CoulombLogarithmElectrons {
    fn name(&self) -> &'static str {
        "CoulombLogarithmElectrons"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("ne").units("n20").desc("Electron density"))?;
        vars.input(Var::scalar("Te").units("eV").desc("Electron temperature"))?;
        vars.output(
            Var::scalar("logΛe")
                .lower(3.0)
                .reference(20.0)
                .desc("Coulomb collision logarithm for electrons"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("logΛe", "ne", -1.0 / (2.0 * inputs.scalar("ne")?))?;
        partials.set("logΛe", "Te", 1.0 / inputs.scalar("Te")?)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Ion–ion Coulomb logarithm, `30 − ln(Z³ sqrt(ni) / Ti^1.5)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoulombLogarithmIons;

impl CoulombLogarithmIons {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ni = inputs.scalar("ni")?;
        let ti = inputs.scalar("Ti")?;
        let z = inputs.scalar("Z")?;
        for (name, value) in [("ni", ni), ("Ti", ti), ("Z", z)] {
            if value.re() <= 0.0 {
                return Err(EvaluationError::domain(inputs.owner(), name, "must be positive"));
            }
        }
        let log = -(z.powi(3) * ni.sqrt() * 1e10 / ti.powf(1.5)).ln() + 30.0;
        outputs.set_scalar("logΛi", log);
        Ok(())
    }
}

impl Component for CoulombLogarithmIons {
    fn name(&self) -> &'static str {
        "CoulombLogarithmIons"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("ni").units("n20").desc("Ion density"))?;
        vars.input(Var::scalar("Ti").units("eV").desc("Ion temperature"))?;
        vars.input(Var::scalar("Z").desc("Ion charge number"))?;
        vars.output(
            Var::scalar("logΛi")
                .lower(0.0)
                .reference(20.0)
                .desc("Coulomb collision logarithm for ions"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("logΛi", "ni", -1.0 / (2.0 * inputs.scalar("ni")?))?;
        partials.set("logΛi", "Ti", 3.0 / (2.0 * inputs.scalar("Ti")?))?;
        partials.set("logΛi", "Z", -3.0 / inputs.scalar("Z")?)
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

    fn assert_partials(problem: &mut Problem) {
        for options in [CheckOptions::finite_difference(), CheckOptions::dual()] {
            let report = problem.check_partials(&options).unwrap();
            assert!(report.passed(), "{}", report.to_json().unwrap());
        }
    }

    #[test]
    fn test_alfven_speed() {
        let mut problem = Problem::from_component("alfven", AlfvenSpeed).unwrap();
        problem.set_inputs(&[("|B|", vec![2.0]), ("ρ", vec![1.5])]).unwrap();
        problem.run().unwrap();
        let expected = 2.0 / (MU_0 * 1.5f64).sqrt();
        assert!((problem.get_scalar("V_A").unwrap() - expected).abs() < 1e-9 * expected);
        assert_partials(&mut problem);
    }

    #[test]
    fn test_average_ion_mass_weights_by_density() {
        let mut problem = Problem::from_component("mix", AverageIonMass::new(2)).unwrap();
        problem
            .set_inputs(&[("ni", vec![1.0, 1.0]), ("Ai", vec![2.0, 3.0])])
            .unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("A_bar").unwrap() - 2.5).abs() < 1e-14);

        problem
            .set_inputs(&[("ni", vec![0.3, 0.9]), ("Ai", vec![2.014, 3.016])])
            .unwrap();
        assert_partials(&mut problem);
    }

    #[test]
    fn test_species_count_fixes_input_shape() {
        let mut problem = Problem::from_component("mix", AverageIonMass::new(3)).unwrap();
        assert!(matches!(
            problem.set_input("ni", &[1.0, 2.0]),
            Err(EvaluationError::ShapeMismatch { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn test_coulomb_logarithms() {
        let mut electrons = Problem::from_component("e", CoulombLogarithmElectrons).unwrap();
        electrons.set_inputs(&[("ne", vec![1.0]), ("Te", vec![1000.0])]).unwrap();
        electrons.run().unwrap();
        let expected = 31.3 - (1e10f64 / 1000.0).ln();
        assert!((electrons.get_scalar("logΛe").unwrap() - expected).abs() < 1e-12);
        assert_partials(&mut electrons);

        let mut ions = Problem::from_component("i", CoulombLogarithmIons).unwrap();
        ions.set_inputs(&[("ni", vec![0.8]), ("Ti", vec![900.0]), ("Z", vec![1.0])])
            .unwrap();
        assert_partials(&mut ions);
    }

    #[test]
    fn test_negative_density_is_a_domain_error() {
        let mut problem = Problem::from_component("e", CoulombLogarithmElectrons).unwrap();
        problem.set_scalar("ne", -0.1).unwrap();
        let err = problem.run().unwrap_err();
        assert!(matches!(err, EvaluationError::Domain { ref variable, .. } if variable == "ne"));
        assert!(!problem.is_current());
    }
}
