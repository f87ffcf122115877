// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while evaluating a model or its derivatives.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// An input lies outside the mathematically valid domain of a component
    #[error("Domain error in '{component}' on '{variable}': {reason}")]
    Domain {
        component: String,
        variable: String,
        reason: String,
    },

    /// A name that is not part of the model
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// An attempt to set an input that is driven by a connection
    #[error("Input '{name}' is driven by '{source_name}' and cannot be set directly")]
    NotIndependent { name: String, source_name: String },

    /// A continuous operation applied to a discrete variable, or the reverse
    #[error("Variable '{name}' is not {expected}")]
    KindMismatch { name: String, expected: &'static str },

    /// A value of the wrong length
    #[error("Variable '{name}' expects {expected} value(s), got {got}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// A component read a variable it did not declare
    #[error("Component '{component}' has no value for '{variable}'")]
    MissingValue { component: String, variable: String },

    /// A component finished without writing one of its outputs
    #[error("Component '{component}' did not produce output '{output}'")]
    MissingOutput { component: String, output: String },

    /// A component wrote a partial outside its declared sparsity
    #[error("Component '{component}' wrote undeclared partial d({of})/d({wrt})")]
    UndeclaredPartial {
        component: String,
        of: String,
        wrt: String,
    },

    /// The requested derivative strategy cannot be applied
    #[error("Cannot differentiate '{component}': {reason}")]
    NotDifferentiable { component: String, reason: String },
}

impl EvaluationError {
    /// Shorthand for the most common failure raised by physics components.
    pub fn domain(component: &str, variable: &str, reason: impl Into<String>) -> Self {
        EvaluationError::Domain {
            component: component.to_string(),
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}
