// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::errors::ConfigError;
use crate::observability::messages::config::ConstantsOverlaid;
use crate::observability::messages::StructuredLog;
use std::fs;
use std::path::Path;

/// Load a constants file. The format is chosen from the extension:
/// `.yaml`/`.yml` or `.toml`.
///
/// # Example
/// ```yaml
/// fits:
///   κ multiplier: 0.95
///   marginal κ-ε scaling:
///     constants: [1.9, 1.9, 1.4]
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Config::from_yaml_str(&content),
        Some("toml") => Config::from_toml_str(&content),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Load the built-in constants, overlaid with a user file when one is given.
pub fn load_constants<P: AsRef<Path>>(user_file: Option<P>) -> Result<Config, ConfigError> {
    let builtin = Config::builtin()?;
    match user_file {
        Some(path) => {
            let user = load_config(&path)?;
            ConstantsOverlaid {
                path: &path.as_ref().display().to_string(),
                sections: user.sections(),
            }
            .log();
            Ok(builtin.merged(user))
        }
        None => Ok(builtin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigAccessor;
    use std::io::Write;

    #[test]
    fn test_load_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "magnet:\n  limits:\n    max field on coil: 16.5").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config
                .scalar(&["magnet", "limits", "max field on coil"])
                .unwrap(),
            16.5
        );
        assert_eq!(config.sections(), 1);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[magnet.limits]\n\"max field on coil\" = 20.0").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config
                .scalar(&["magnet", "limits", "max field on coil"])
                .unwrap(),
            20.0
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(matches!(load_config(&missing), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_constants_overlays_builtin() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "fits:\n  κ multiplier: 1.1").unwrap();

        let config = load_constants(Some(file.path())).unwrap();
        assert_eq!(config.scalar(&["fits", "κ multiplier"]).unwrap(), 1.1);
        // untouched keys still come from the built-in file
        assert!(config.scalar(&["magnet", "HTS", "max stress"]).is_ok());

        let defaults = load_constants::<&Path>(None).unwrap();
        assert_eq!(defaults.scalar(&["fits", "κ multiplier"]).unwrap(), 0.95);
    }
}
