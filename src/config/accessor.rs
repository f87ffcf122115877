// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hierarchical access to numeric constants.
//!
//! Components resolve their physical constants once, when they are
//! constructed, through the [`ConfigAccessor`] trait. A key path such as
//! `["fits", "marginal κ-ε scaling", "constants"]` walks nested mappings and
//! ends at a number or a list of numbers.
//!
//! ```
//! use tokamak_mdo::config::{Config, ConfigAccessor};
//!
//! let config = Config::from_yaml_str("fits:\n  κ multiplier: 0.95\n").unwrap();
//! let fits = config.accessor(&["fits"]);
//! assert_eq!(fits.scalar(&["κ multiplier"]).unwrap(), 0.95);
//! assert!(fits.scalar(&["missing"]).is_err());
//! ```

use crate::errors::ConfigError;
use serde_yaml::Value;

/// A resolved constant.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Scalar(f64),
    Array(Vec<f64>),
}

/// Read-only access to configuration constants by key path.
pub trait ConfigAccessor {
    /// Resolve a key path to a number or list of numbers.
    fn get(&self, path: &[&str]) -> Result<ConfigValue, ConfigError>;

    /// Resolve a key path that must hold a single number.
    fn scalar(&self, path: &[&str]) -> Result<f64, ConfigError> {
        match self.get(path)? {
            ConfigValue::Scalar(v) => Ok(v),
            ConfigValue::Array(_) => Err(ConfigError::WrongType {
                path: path.join("/"),
                expected: "a number",
            }),
        }
    }

    /// Resolve a key path that must hold a list of numbers.
    fn array(&self, path: &[&str]) -> Result<Vec<f64>, ConfigError> {
        match self.get(path)? {
            ConfigValue::Array(v) => Ok(v),
            ConfigValue::Scalar(_) => Err(ConfigError::WrongType {
                path: path.join("/"),
                expected: "a list of numbers",
            }),
        }
    }

    /// Resolve a list of numbers and require a fixed length.
    fn array_of_len(&self, path: &[&str], len: usize) -> Result<Vec<f64>, ConfigError> {
        let values = self.array(path)?;
        if values.len() != len {
            return Err(ConfigError::WrongType {
                path: path.join("/"),
                expected: match len {
                    3 => "a list of 3 numbers",
                    _ => "a list of the expected length",
                },
            });
        }
        Ok(values)
    }
}

/// A configuration tree of named constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Value,
}

const BUILTIN_CONSTANTS: &str = include_str!("default_constants.yaml");

impl Config {
    /// Wrap an already parsed tree.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(Self::from_value(serde_yaml::from_str(text)?))
    }

    /// Parse a TOML document into the same tree representation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: toml::Value = toml::from_str(text)?;
        let root = serde_yaml::to_value(parsed)?;
        Ok(Self::from_value(root))
    }

    /// The constants shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_CONSTANTS)
    }

    /// Overlay `overrides` on top of this tree; mappings merge key by key,
    /// everything else is replaced.
    pub fn merged(mut self, overrides: Config) -> Self {
        merge_values(&mut self.root, overrides.root);
        self
    }

    /// Number of top-level sections.
    pub fn sections(&self) -> usize {
        match &self.root {
            Value::Mapping(map) => map.len(),
            _ => 0,
        }
    }

    /// An accessor scoped to a sub-tree.
    pub fn accessor<'a>(&'a self, prefix: &[&str]) -> ScopedConfig<'a> {
        ScopedConfig {
            config: self,
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn lookup(&self, path: &[&str]) -> Result<ConfigValue, ConfigError> {
        let mut node = &self.root;
        for key in path {
            node = match node {
                Value::Mapping(map) => map.get(*key),
                _ => None,
            }
            .ok_or_else(|| ConfigError::KeyNotFound {
                path: path.join("/"),
            })?;
        }
        to_config_value(node).ok_or_else(|| ConfigError::WrongType {
            path: path.join("/"),
            expected: "a number or a list of numbers",
        })
    }
}

impl ConfigAccessor for Config {
    fn get(&self, path: &[&str]) -> Result<ConfigValue, ConfigError> {
        self.lookup(path)
    }
}

/// A view of a [`Config`] below a fixed key prefix.
#[derive(Debug, Clone)]
pub struct ScopedConfig<'a> {
    config: &'a Config,
    prefix: Vec<String>,
}

impl ConfigAccessor for ScopedConfig<'_> {
    fn get(&self, path: &[&str]) -> Result<ConfigValue, ConfigError> {
        let full: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(path.iter().copied())
            .collect();
        self.config.lookup(&full)
    }
}

fn to_config_value(node: &Value) -> Option<ConfigValue> {
    match node {
        Value::Number(n) => n.as_f64().map(ConfigValue::Scalar),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(n) => n.as_f64(),
                _ => None,
            })
            .collect::<Option<Vec<f64>>>()
            .map(ConfigValue::Array),
        _ => None,
    }
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
fits:
  κ multiplier: 0.95
  marginal κ-ε scaling:
    constants: [1.9, 1.9, 1.4]
  label: elliptical
"#;

    #[test]
    fn test_scalar_and_array_lookup() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert_eq!(config.scalar(&["fits", "κ multiplier"]).unwrap(), 0.95);
        assert_eq!(
            config
                .array(&["fits", "marginal κ-ε scaling", "constants"])
                .unwrap(),
            vec![1.9, 1.9, 1.4]
        );
    }

    #[test]
    fn test_missing_key_is_key_not_found() {
        let config = Config::from_yaml_str(YAML).unwrap();
        let err = config.scalar(&["fits", "nope"]).unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound { ref path } if path == "fits/nope"));
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let config = Config::from_yaml_str(YAML).unwrap();
        assert!(matches!(
            config.scalar(&["fits", "marginal κ-ε scaling", "constants"]),
            Err(ConfigError::WrongType { .. })
        ));
        assert!(matches!(
            config.get(&["fits", "label"]),
            Err(ConfigError::WrongType { .. })
        ));
        assert!(matches!(
            config.array_of_len(&["fits", "marginal κ-ε scaling", "constants"], 2),
            Err(ConfigError::WrongType { .. })
        ));
    }

    #[test]
    fn test_scoped_accessor_prefixes_paths() {
        let config = Config::from_yaml_str(YAML).unwrap();
        let fits = config.accessor(&["fits"]);
        assert_eq!(fits.scalar(&["κ multiplier"]).unwrap(), 0.95);
    }

    #[test]
    fn test_merge_overrides_only_given_keys() {
        let base = Config::from_yaml_str(YAML).unwrap();
        let user = Config::from_yaml_str("fits:\n  κ multiplier: 1.0\n").unwrap();
        let merged = base.merged(user);
        assert_eq!(merged.scalar(&["fits", "κ multiplier"]).unwrap(), 1.0);
        assert_eq!(
            merged
                .array(&["fits", "marginal κ-ε scaling", "constants"])
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_toml_and_yaml_resolve_identically() {
        let toml_text = r#"
[fits]
"κ multiplier" = 0.95

[fits."marginal κ-ε scaling"]
constants = [1.9, 1.9, 1.4]
"#;
        let from_toml = Config::from_toml_str(toml_text).unwrap();
        let from_yaml = Config::from_yaml_str(YAML).unwrap();
        for path in [
            vec!["fits", "κ multiplier"],
            vec!["fits", "marginal κ-ε scaling", "constants"],
        ] {
            assert_eq!(from_toml.get(&path).unwrap(), from_yaml.get(&path).unwrap());
        }
    }

    #[test]
    fn test_builtin_constants_parse() {
        let config = Config::builtin().unwrap();
        assert!(config.scalar(&["magnet", "HTS", "max stress"]).is_ok());
        assert_eq!(
            config
                .array_of_len(&["fits", "no-wall β_N scaling with ε", "constants"], 3)
                .unwrap()
                .len(),
            3
        );
    }
}
