// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declared Jacobian structure and the storage components write partials into.

use super::Matrix;
use crate::errors::{AssemblyError, EvaluationError};
use crate::variables::{VarKind, VariableRegistry};
use serde::Serialize;
use std::collections::HashMap;

/// Structure of one declared (output, input) block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Every entry may be nonzero.
    Dense,
    /// Only `d(of[i])/d(wrt[i])`; both variables must have the same size.
    Diagonal,
}

/// The structurally nonzero blocks of a component Jacobian.
#[derive(Debug, Clone, Default)]
pub struct Sparsity {
    pairs: Vec<(String, String, Pattern)>,
}

impl Sparsity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, of: &str, wrt: &str) {
        self.push(of, wrt, Pattern::Dense);
    }

    pub fn declare_diagonal(&mut self, of: &str, wrt: &str) {
        self.push(of, wrt, Pattern::Diagonal);
    }

    /// Dense blocks for every listed output against every listed input.
    pub fn declare_all(&mut self, of: &[&str], wrt: &[&str]) {
        for o in of {
            for w in wrt {
                self.declare(o, w);
            }
        }
    }

    /// Dense blocks for every continuous output against every continuous input.
    pub fn declare_dense(&mut self, vars: &VariableRegistry) {
        let outputs: Vec<&str> = vars.outputs().map(|v| v.name.as_str()).collect();
        let inputs: Vec<&str> = vars.inputs().map(|v| v.name.as_str()).collect();
        self.declare_all(&outputs, &inputs);
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, Pattern)> {
        self.pairs
            .iter()
            .map(|(o, w, p)| (o.as_str(), w.as_str(), *p))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, of: &str, wrt: &str) -> bool {
        self.pairs.iter().any(|(o, w, _)| o == of && w == wrt)
    }

    fn push(&mut self, of: &str, wrt: &str, pattern: Pattern) {
        // redeclaring a pair replaces its pattern
        if let Some(existing) = self
            .pairs
            .iter_mut()
            .find(|(o, w, _)| o == of && w == wrt)
        {
            existing.2 = pattern;
            return;
        }
        self.pairs.push((of.to_string(), wrt.to_string(), pattern));
    }

    /// Check every pair against the component's variables and build the
    /// zero-filled storage that evaluation clones.
    pub fn validate(&self, vars: &VariableRegistry) -> Result<Partials, Vec<AssemblyError>> {
        let mut partials = Partials::new(vars.owner());
        let mut errors = Vec::new();
        for (of, wrt, pattern) in self.pairs() {
            let out = vars.get(of).filter(|v| v.kind == VarKind::Output);
            let inp = vars.get(wrt).filter(|v| v.kind == VarKind::Input);
            let (Some(out), Some(inp)) = (out, inp) else {
                errors.push(AssemblyError::InvalidPartial {
                    component: vars.owner().to_string(),
                    of: of.to_string(),
                    wrt: wrt.to_string(),
                });
                continue;
            };
            if pattern == Pattern::Diagonal && out.size() != inp.size() {
                errors.push(AssemblyError::ShapeMismatch {
                    lhs: format!("{}.{}", vars.owner(), of),
                    lhs_size: out.size(),
                    rhs: format!("{}.{}", vars.owner(), wrt),
                    rhs_size: inp.size(),
                });
                continue;
            }
            partials.push(of, wrt, pattern, Matrix::zeros(out.size(), inp.size()));
        }
        if errors.is_empty() {
            Ok(partials)
        } else {
            Err(errors)
        }
    }
}

/// One declared block and its current values.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBlock {
    pub of: String,
    pub wrt: String,
    pub pattern: Pattern,
    pub values: Matrix,
}

/// Local partial derivatives of one component at one point.
///
/// Only declared blocks exist; writing any other pair fails with
/// [`EvaluationError::UndeclaredPartial`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partials {
    component: String,
    blocks: Vec<PartialBlock>,
    index: HashMap<String, HashMap<String, usize>>,
}

impl Partials {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
            blocks: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    fn push(&mut self, of: &str, wrt: &str, pattern: Pattern, values: Matrix) {
        self.index
            .entry(of.to_string())
            .or_default()
            .insert(wrt.to_string(), self.blocks.len());
        self.blocks.push(PartialBlock {
            of: of.to_string(),
            wrt: wrt.to_string(),
            pattern,
            values,
        });
    }

    pub fn blocks(&self) -> &[PartialBlock] {
        &self.blocks
    }

    pub fn get(&self, of: &str, wrt: &str) -> Option<&Matrix> {
        self.position(of, wrt).map(|i| &self.blocks[i].values)
    }

    pub fn pattern(&self, of: &str, wrt: &str) -> Option<Pattern> {
        self.position(of, wrt).map(|i| self.blocks[i].pattern)
    }

    /// Fill the structural entries of a block with one value: the whole
    /// block when dense, the diagonal when diagonal.
    pub fn set(&mut self, of: &str, wrt: &str, value: f64) -> Result<(), EvaluationError> {
        let block = self.block_mut(of, wrt)?;
        match block.pattern {
            Pattern::Dense => block.values.fill(value),
            Pattern::Diagonal => block.values.fill_diagonal(value),
        }
        Ok(())
    }

    /// Write structural entries in order: row-major for a dense block, the
    /// diagonal for a diagonal one.
    pub fn set_values(&mut self, of: &str, wrt: &str, values: &[f64]) -> Result<(), EvaluationError> {
        let component = self.component.clone();
        let block = self.block_mut(of, wrt)?;
        let expected = match block.pattern {
            Pattern::Dense => block.values.len(),
            Pattern::Diagonal => block.values.nrows(),
        };
        if values.len() != expected {
            return Err(EvaluationError::ShapeMismatch {
                name: format!("{}: d({})/d({})", component, of, wrt),
                expected,
                got: values.len(),
            });
        }
        match block.pattern {
            Pattern::Dense => {
                let (rows, cols) = block.values.shape();
                block.values = Matrix::from_row_slice(rows, cols, values);
            }
            Pattern::Diagonal => {
                for (i, v) in values.iter().enumerate() {
                    block.values[(i, i)] = *v;
                }
            }
        }
        Ok(())
    }

    /// Write a single entry; it must lie in the declared structure.
    pub fn set_entry(
        &mut self,
        of: &str,
        wrt: &str,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), EvaluationError> {
        let component = self.component.clone();
        let block = self.block_mut(of, wrt)?;
        let (rows, cols) = block.values.shape();
        let structural = row < rows && col < cols && (block.pattern == Pattern::Dense || row == col);
        if !structural {
            return Err(EvaluationError::UndeclaredPartial {
                component,
                of: format!("{}[{}]", of, row),
                wrt: format!("{}[{}]", wrt, col),
            });
        }
        block.values[(row, col)] = value;
        Ok(())
    }

    pub(crate) fn block_mut(&mut self, of: &str, wrt: &str) -> Result<&mut PartialBlock, EvaluationError> {
        match self.position(of, wrt) {
            Some(i) => Ok(&mut self.blocks[i]),
            None => Err(EvaluationError::UndeclaredPartial {
                component: self.component.clone(),
                of: of.to_string(),
                wrt: wrt.to_string(),
            }),
        }
    }

    fn position(&self, of: &str, wrt: &str) -> Option<usize> {
        self.index.get(of).and_then(|row| row.get(wrt)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::Var;

    fn registry() -> VariableRegistry {
        let mut vars = VariableRegistry::new("sq");
        vars.input(Var::array("a", 3)).unwrap();
        vars.input(Var::array("b", 3)).unwrap();
        vars.input(Var::scalar("s")).unwrap();
        vars.discrete_input("n", 2).unwrap();
        vars.output(Var::array("c", 3)).unwrap();
        vars
    }

    #[test]
    fn test_default_dense_declaration() {
        let vars = registry();
        let mut sparsity = Sparsity::new();
        sparsity.declare_dense(&vars);
        let pairs: Vec<_> = sparsity.pairs().map(|(o, w, _)| (o, w)).collect();
        assert_eq!(pairs, vec![("c", "a"), ("c", "b"), ("c", "s")]);

        let partials = sparsity.validate(&vars).unwrap();
        assert_eq!(partials.get("c", "s").unwrap().shape(), (3, 1));
    }

    #[test]
    fn test_diagonal_blocks() {
        let vars = registry();
        let mut sparsity = Sparsity::new();
        sparsity.declare_diagonal("c", "a");
        let mut partials = sparsity.validate(&vars).unwrap();

        partials.set_values("c", "a", &[1.0, 2.0, 3.0]).unwrap();
        let block = partials.get("c", "a").unwrap();
        assert_eq!(block[(1, 1)], 2.0);
        assert_eq!(block[(0, 1)], 0.0);

        partials.set("c", "a", -1.0).unwrap();
        assert_eq!(partials.get("c", "a").unwrap()[(2, 2)], -1.0);
        assert!(partials.set_entry("c", "a", 0, 1, 4.0).is_err());
    }

    #[test]
    fn test_writing_undeclared_pair_fails() {
        let vars = registry();
        let mut sparsity = Sparsity::new();
        sparsity.declare("c", "a");
        let mut partials = sparsity.validate(&vars).unwrap();
        assert!(matches!(
            partials.set("c", "b", 1.0),
            Err(EvaluationError::UndeclaredPartial { .. })
        ));
        assert!(matches!(
            partials.set_values("c", "a", &[1.0]),
            Err(EvaluationError::ShapeMismatch { expected: 9, .. })
        ));
    }

    #[test]
    fn test_invalid_declarations() {
        let vars = registry();
        let mut sparsity = Sparsity::new();
        sparsity.declare("c", "n");
        sparsity.declare("a", "b");
        sparsity.declare_diagonal("c", "s");
        let errors = sparsity.validate(&vars).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], AssemblyError::InvalidPartial { .. }));
        assert!(matches!(errors[2], AssemblyError::ShapeMismatch { .. }));
    }
}
