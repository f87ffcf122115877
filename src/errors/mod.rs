// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod assembly;
mod config;
mod evaluation;
mod verification;

pub use assembly::AssemblyError;
pub use config::ConfigError;
pub use evaluation::EvaluationError;
pub use verification::VerificationError;

use thiserror::Error;

/// Any failure the model can raise, grouped by the phase that raised it.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("assembly failed:\n{}", format_assembly_errors(.0))]
    Assembly(Vec<AssemblyError>),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("verification error: {0}")]
    Verification(#[from] VerificationError),
}

impl From<AssemblyError> for ModelError {
    fn from(err: AssemblyError) -> Self {
        ModelError::Assembly(vec![err])
    }
}

impl From<Vec<AssemblyError>> for ModelError {
    fn from(errors: Vec<AssemblyError>) -> Self {
        ModelError::Assembly(errors)
    }
}

fn format_assembly_errors(errors: &[AssemblyError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders an optional unit for error messages and listings.
pub(crate) fn unit_label(unit: Option<&str>) -> String {
    unit.map(str::to_string).unwrap_or_else(|| "unitless".to_string())
}
