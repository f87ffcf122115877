// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::components::{
        current_drive_efficiency, magnet_radial_build, BetaNTotal, InnerTFCoilStrain, NBICurrent, PlasmaGeometry,
        SimpleCoolantPumpingPower,
    };
    use crate::config::{load_constants, Config, ConfigAccessor};
    use crate::engine::Problem;
    use crate::errors::{ConfigError, ModelError};
    use std::io::Write;

    /// The built-in constants configure every component that needs them
    #[test]
    fn test_builtin_constants_configure_components() {
        let config = Config::builtin().unwrap();
        assert!(PlasmaGeometry::new(&config).is_ok());
        assert!(BetaNTotal::new(&config).is_ok());
        assert!(InnerTFCoilStrain::new(&config).is_ok());
        assert!(magnet_radial_build(&config).is_ok());
        assert!(current_drive_efficiency(&config, 2).is_ok());
        assert!(NBICurrent::new(&config, 1).is_ok());
        assert!(SimpleCoolantPumpingPower::new(&config).is_ok());

        assert_eq!(config.array(&["fits", "marginal κ-ε scaling", "constants"]).unwrap(), vec![1.9, 1.9, 1.4]);
        assert_eq!(config.scalar(&["magnet", "limits", "max field on coil"]).unwrap(), 18.0);
    }

    /// Scoped accessors see the same values as full key paths
    #[test]
    fn test_scoped_accessor() {
        let config = Config::builtin().unwrap();
        let hts = config.accessor(&["magnet", "HTS"]);
        assert_eq!(
            hts.scalar(&["max stress"]).unwrap(),
            config.scalar(&["magnet", "HTS", "max stress"]).unwrap()
        );
        assert!(matches!(hts.scalar(&["max field on coil"]), Err(ConfigError::KeyNotFound { .. })));
    }

    /// A component needing a missing constant fails at construction
    #[test]
    fn test_missing_constant_fails_construction() {
        let config = Config::from_yaml_str("fits:\n  κ multiplier: 0.95\n").unwrap();
        assert!(matches!(PlasmaGeometry::new(&config), Err(ConfigError::KeyNotFound { .. })));
        assert!(matches!(magnet_radial_build(&config), Err(ModelError::Config(_))));
    }

    /// A constants list of the wrong length is rejected
    #[test]
    fn test_wrong_shape_constant() {
        let overrides = Config::from_yaml_str("fits:\n  no-wall β_N scaling with ε:\n    constants: [3.12, 3.5]\n").unwrap();
        let config = Config::builtin().unwrap().merged(overrides);
        assert!(matches!(BetaNTotal::new(&config), Err(ConfigError::WrongType { .. })));
    }

    /// User constants loaded from a file change model results
    #[test]
    fn test_user_constants_change_results() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "magnet:\n  limits:\n    max field on coil: 12.0").unwrap();

        let user = load_constants(Some(file.path())).unwrap();
        let builtin = Config::builtin().unwrap();

        let con2 = |config: &Config| {
            let mut problem = Problem::new(magnet_radial_build(config).unwrap()).unwrap();
            problem.set_scalar("R0", 3.0).unwrap();
            problem.set_scalar("j_HTS", 100.0).unwrap();
            problem.run().unwrap();
            problem.get_scalar("con2").unwrap()
        };
        assert!((con2(&builtin) - con2(&user) - 6.0).abs() < 1e-12);
    }
}
