// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ConfigAccessor;
use crate::errors::{AssemblyError, ConfigError, EvaluationError};
use crate::jacobian::Partials;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};

/// Pumping power as a fixed fraction of primary thermal power,
/// P_pumps = c P_thermal, with c from `machine/coolant pumping system/power factor`.
#[derive(Debug, Clone, Copy)]
pub struct SimpleCoolantPumpingPower {
    power_factor: f64,
}

impl SimpleCoolantPumpingPower {
    pub const DEFAULT_POWER_FACTOR: f64 = 0.03;

    pub fn new(config: &impl ConfigAccessor) -> Result<Self, ConfigError> {
        Ok(Self {
            power_factor: config.scalar(&["machine", "coolant pumping system", "power factor"])?,
        })
    }
}

impl Default for SimpleCoolantPumpingPower {
    fn default() -> Self {
        Self {
            power_factor: Self::DEFAULT_POWER_FACTOR,
        }
    }
}

impl Component for SimpleCoolantPumpingPower {
    fn name(&self) -> &'static str {
        "SimpleCoolantPumpingPower"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("P_thermal").units("MW").desc("Plasma primary thermal power"))?;
        vars.output(
            Var::scalar("P_pumps")
                .units("MW")
                .lower(0.0)
                .desc("Primary coolant pump electric power"),
        )
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        outputs.set_scalar("P_pumps", self.power_factor * inputs.scalar("P_thermal")?);
        Ok(())
    }

    fn compute_partials(&self, _inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        partials.set("P_pumps", "P_thermal", self.power_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;

    #[test]
    fn test_pumping_power_from_constants() {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::from_component("pumps", SimpleCoolantPumpingPower::new(&config).unwrap()).unwrap();
        problem.set_scalar("P_thermal", 100.0).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("P_pumps").unwrap() - 3.0).abs() < 1e-12);

        let report = problem.check_partials(&CheckOptions::finite_difference()).unwrap();
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn test_power_factor_override() {
        let overrides = Config::from_yaml_str("machine:\n  coolant pumping system:\n    power factor: 0.05\n").unwrap();
        let config = Config::builtin().unwrap().merged(overrides);
        let component = SimpleCoolantPumpingPower::new(&config).unwrap();
        assert_eq!(component.power_factor, 0.05);
        assert_eq!(SimpleCoolantPumpingPower::default().power_factor, 0.03);
    }
}
