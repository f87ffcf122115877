// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-component variable schema.
//!
//! A component fills its registry once, when the model is assembled. Names
//! must be unique within the component and may not contain `.`, which is
//! reserved as the path separator.

use super::meta::{Shape, Var, VarKind, VariableMeta};
use crate::errors::AssemblyError;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    owner: String,
    vars: Vec<VariableMeta>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            vars: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Declare a continuous input.
    pub fn input(&mut self, var: Var) -> Result<(), AssemblyError> {
        self.insert(var.into_meta(VarKind::Input))
    }

    /// Declare a continuous output.
    pub fn output(&mut self, var: Var) -> Result<(), AssemblyError> {
        self.insert(var.into_meta(VarKind::Output))
    }

    /// Declare an integer input that takes no part in differentiation.
    pub fn discrete_input(&mut self, name: &str, default: i64) -> Result<(), AssemblyError> {
        self.insert(discrete_meta(name, VarKind::DiscreteInput, default))
    }

    /// Declare an integer output that takes no part in differentiation.
    pub fn discrete_output(&mut self, name: &str, default: i64) -> Result<(), AssemblyError> {
        self.insert(discrete_meta(name, VarKind::DiscreteOutput, default))
    }

    pub fn get(&self, name: &str) -> Option<&VariableMeta> {
        self.index.get(name).map(|&i| &self.vars[i])
    }

    /// All variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableMeta> {
        self.vars.iter()
    }

    pub fn of_kind(&self, kind: VarKind) -> impl Iterator<Item = &VariableMeta> {
        self.vars.iter().filter(move |v| v.kind == kind)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &VariableMeta> {
        self.of_kind(VarKind::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &VariableMeta> {
        self.of_kind(VarKind::Output)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn insert(&mut self, meta: VariableMeta) -> Result<(), AssemblyError> {
        validate_name(&self.owner, &meta.name)?;
        if self.index.contains_key(&meta.name) {
            return Err(AssemblyError::DuplicateName {
                scope: self.owner.clone(),
                name: meta.name,
            });
        }
        if meta.default.len() != meta.size() {
            return Err(AssemblyError::ShapeMismatch {
                lhs: format!("{}.{}", self.owner, meta.name),
                lhs_size: meta.size(),
                rhs: "declared default".to_string(),
                rhs_size: meta.default.len(),
            });
        }
        if meta.size() == 0 {
            return Err(AssemblyError::InvalidName {
                scope: self.owner.clone(),
                name: meta.name,
                reason: "arrays must hold at least one element".to_string(),
            });
        }
        self.index.insert(meta.name.clone(), self.vars.len());
        self.vars.push(meta);
        Ok(())
    }
}

fn discrete_meta(name: &str, kind: VarKind, default: i64) -> VariableMeta {
    VariableMeta {
        name: name.to_string(),
        kind,
        shape: Shape::Scalar,
        units: None,
        default: vec![0.0],
        discrete_default: default,
        lower: None,
        upper: None,
        reference: None,
        desc: String::new(),
    }
}

/// Subsystem and variable names: non-empty, no path separator.
pub(crate) fn validate_name(scope: &str, name: &str) -> Result<(), AssemblyError> {
    let reason = if name.is_empty() {
        Some("names must not be empty")
    } else if name.contains('.') {
        Some("'.' is reserved as the path separator")
    } else if name == "*" {
        Some("'*' is reserved for wildcard promotion")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(AssemblyError::InvalidName {
            scope: scope.to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_in_order() {
        let mut vars = VariableRegistry::new("field");
        vars.input(Var::scalar("I_leg").units("MA")).unwrap();
        vars.input(Var::scalar("R0").units("m")).unwrap();
        vars.discrete_input("n_coil", 18).unwrap();
        vars.output(Var::scalar("B0").units("T")).unwrap();

        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["I_leg", "R0", "n_coil", "B0"]);
        assert_eq!(vars.inputs().count(), 2);
        assert_eq!(vars.get("n_coil").unwrap().discrete_default, 18);
        assert_eq!(vars.get("B0").unwrap().units(), Some("T"));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut vars = VariableRegistry::new("geom");
        vars.input(Var::scalar("R0")).unwrap();
        let err = vars.output(Var::scalar("R0")).unwrap_err();
        assert!(matches!(err, AssemblyError::DuplicateName { .. }));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut vars = VariableRegistry::new("geom");
        for bad in ["", "a.b", "*"] {
            assert!(matches!(
                vars.input(Var::scalar(bad)),
                Err(AssemblyError::InvalidName { .. })
            ));
        }
        // spaces and unicode are fine
        assert!(vars.input(Var::scalar("Ib TF R_out")).is_ok());
        assert!(vars.input(Var::scalar("κ")).is_ok());
    }

    #[test]
    fn test_default_length_must_match_shape() {
        let mut vars = VariableRegistry::new("mix");
        let err = vars
            .input(Var::array("ni", 3).default_values(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, AssemblyError::ShapeMismatch { lhs_size: 3, rhs_size: 2, .. }));
        assert!(matches!(
            vars.input(Var::array("empty", 0)),
            Err(AssemblyError::InvalidName { .. })
        ));
    }
}
