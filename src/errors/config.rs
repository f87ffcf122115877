// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading constants and configuring components.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required constant is missing
    #[error("Configuration key not found: {path}")]
    KeyNotFound { path: String },

    /// A constant exists but has the wrong type
    #[error("Configuration key '{path}' is not {expected}")]
    WrongType { path: String, expected: &'static str },

    /// A component option is out of range
    #[error("Invalid option '{option}' for '{component}': {reason}")]
    InvalidOption {
        component: String,
        option: String,
        reason: String,
    },

    #[error("Unsupported configuration file '{path}': expected .yaml, .yml or .toml")]
    UnsupportedFormat { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
