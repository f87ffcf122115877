// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::EvaluationError;
use std::collections::HashMap;

/// Named continuous values handed to, or produced by, one component.
///
/// `T` is `f64` for plain evaluation and a dual number when a component is
/// differentiated by forward-mode automatic differentiation. The owner is the
/// absolute path of the component, used for error context.
#[derive(Debug, Clone, PartialEq)]
pub struct Values<T> {
    owner: String,
    entries: HashMap<String, Vec<T>>,
}

impl<T: Copy> Values<T> {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn insert(&mut self, name: &str, value: Vec<T>) {
        self.entries.insert(name.to_string(), value);
    }

    /// First element of a declared variable.
    pub fn scalar(&self, name: &str) -> Result<T, EvaluationError> {
        self.array(name)?
            .first()
            .copied()
            .ok_or_else(|| self.missing(name))
    }

    pub fn array(&self, name: &str) -> Result<&[T], EvaluationError> {
        self.entries
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| self.missing(name))
    }

    pub fn set_scalar(&mut self, name: &str, value: T) {
        self.insert(name, vec![value]);
    }

    pub fn set_array(&mut self, name: &str, values: Vec<T>) {
        self.insert(name, values);
    }

    pub fn get(&self, name: &str) -> Option<&[T]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn take(&mut self, name: &str) -> Option<Vec<T>> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert every element, e.g. lift `f64` values into dual numbers.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Values<U> {
        Values {
            owner: self.owner.clone(),
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().map(|x| f(*x)).collect()))
                .collect(),
        }
    }

    fn missing(&self, name: &str) -> EvaluationError {
        EvaluationError::MissingValue {
            component: self.owner.clone(),
            variable: name.to_string(),
        }
    }
}

/// Named integer values of one component. Never differentiated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscreteValues {
    owner: String,
    entries: HashMap<String, i64>,
}

impl DiscreteValues {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn get(&self, name: &str) -> Result<i64, EvaluationError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| EvaluationError::MissingValue {
                component: self.owner.clone(),
                variable: name.to_string(),
            })
    }

    pub fn set(&mut self, name: &str, value: i64) {
        self.entries.insert(name.to_string(), value);
    }

    pub fn take(&mut self, name: &str) -> Option<i64> {
        self.entries.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_array_access() {
        let mut values = Values::new("mix");
        values.set_scalar("R0", 3.0);
        values.set_array("ni", vec![1.0, 0.5]);

        assert_eq!(values.scalar("R0").unwrap(), 3.0);
        assert_eq!(values.array("ni").unwrap(), &[1.0, 0.5]);
        assert_eq!(values.scalar("ni").unwrap(), 1.0);
    }

    #[test]
    fn test_missing_value_names_owner() {
        let values: Values<f64> = Values::new("magnets.field");
        match values.scalar("r_om") {
            Err(EvaluationError::MissingValue {
                component,
                variable,
            }) => {
                assert_eq!(component, "magnets.field");
                assert_eq!(variable, "r_om");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_map_keeps_names() {
        let mut values = Values::new("c");
        values.set_array("x", vec![1.0, 2.0]);
        let doubled = values.map(|v| v * 2.0);
        assert_eq!(doubled.array("x").unwrap(), &[2.0, 4.0]);
        assert_eq!(doubled.owner(), "c");
    }

    #[test]
    fn test_discrete_values() {
        let mut discrete = DiscreteValues::new("magnets.geometry");
        discrete.set("n_coil", 18);
        assert_eq!(discrete.get("n_coil").unwrap(), 18);
        assert!(discrete.get("n_pf").is_err());
    }
}
