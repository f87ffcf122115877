// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural errors raised while building and flattening a model.
//!
//! None of these are recoverable: they describe a malformed model that must
//! be fixed before it can be run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// Two subsystems of one group, or two variables of one component, share a name
    #[error("Duplicate name '{name}' in '{scope}'")]
    DuplicateName { scope: String, name: String },

    /// A name that cannot be used as a subsystem or variable name
    #[error("Invalid name '{name}' in '{scope}': {reason}")]
    InvalidName {
        scope: String,
        name: String,
        reason: String,
    },

    /// A connection or promotion refers to a path that does not resolve
    #[error("Group '{group}' refers to '{path}' which does not resolve to {expected}")]
    UnresolvedPath {
        group: String,
        path: String,
        expected: &'static str,
    },

    /// An input is driven by more than one source
    #[error("Input '{input}' is already driven by '{existing}'; cannot also connect '{source_name}'")]
    MultipleSources {
        input: String,
        existing: String,
        source_name: String,
    },

    /// Two variables tied together carry different units
    #[error("Unit mismatch between '{lhs}' ({lhs_unit}) and '{rhs}' ({rhs_unit})")]
    UnitMismatch {
        lhs: String,
        lhs_unit: String,
        rhs: String,
        rhs_unit: String,
    },

    /// Two variables tied together have different sizes
    #[error("Shape mismatch between '{lhs}' (size {lhs_size}) and '{rhs}' (size {rhs_size})")]
    ShapeMismatch {
        lhs: String,
        lhs_size: usize,
        rhs: String,
        rhs_size: usize,
    },

    /// A continuous variable tied to a discrete one, or an output used as an input
    #[error("Cannot tie '{lhs}' to '{rhs}': {reason}")]
    KindMismatch {
        lhs: String,
        rhs: String,
        reason: String,
    },

    /// The component dependency graph contains a cycle
    #[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A declared partial refers to a variable the component never declared
    #[error("Component '{component}' declares partial d({of})/d({wrt}) over an unknown or discrete variable")]
    InvalidPartial {
        component: String,
        of: String,
        wrt: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_joins_path() {
        let err = AssemblyError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn test_unit_mismatch_names_both_sides() {
        let err = AssemblyError::UnitMismatch {
            lhs: "plasma.R0".into(),
            lhs_unit: "m".into(),
            rhs: "magnets.R0".into(),
            rhs_unit: "cm".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("plasma.R0"));
        assert!(msg.contains("(cm)"));
    }
}
