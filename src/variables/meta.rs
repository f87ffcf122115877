// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;

/// Role of a variable within its component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Input,
    Output,
    DiscreteInput,
    DiscreteOutput,
}

impl VarKind {
    pub fn is_input(self) -> bool {
        matches!(self, VarKind::Input | VarKind::DiscreteInput)
    }

    pub fn is_discrete(self) -> bool {
        matches!(self, VarKind::DiscreteInput | VarKind::DiscreteOutput)
    }

    pub fn label(self) -> &'static str {
        match self {
            VarKind::Input => "input",
            VarKind::Output => "output",
            VarKind::DiscreteInput => "discrete input",
            VarKind::DiscreteOutput => "discrete output",
        }
    }
}

/// Shape of a continuous variable. Arrays are flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar,
    Vector(usize),
}

impl Shape {
    pub fn size(self) -> usize {
        match self {
            Shape::Scalar => 1,
            Shape::Vector(n) => n,
        }
    }
}

/// Declared metadata of one variable. Fixed for the lifetime of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableMeta {
    pub name: String,
    pub kind: VarKind,
    pub shape: Shape,
    pub units: Option<String>,
    pub default: Vec<f64>,
    pub discrete_default: i64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub reference: Option<f64>,
    pub desc: String,
}

impl VariableMeta {
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }
}

/// Builder for a continuous variable declaration.
///
/// ```
/// use tokamak_mdo::variables::Var;
///
/// let r0 = Var::scalar("R0").units("m").default(3.0).desc("Major radius");
/// let ni = Var::array("ni", 3).units("n20");
/// assert_eq!(r0.meta().size(), 1);
/// assert_eq!(ni.meta().default, vec![1.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Var {
    meta: VariableMeta,
}

impl Var {
    pub fn scalar(name: &str) -> Self {
        Self::with_shape(name, Shape::Scalar)
    }

    pub fn array(name: &str, len: usize) -> Self {
        Self::with_shape(name, Shape::Vector(len))
    }

    fn with_shape(name: &str, shape: Shape) -> Self {
        Self {
            meta: VariableMeta {
                name: name.to_string(),
                kind: VarKind::Input,
                shape,
                units: None,
                default: vec![1.0; shape.size()],
                discrete_default: 0,
                lower: None,
                upper: None,
                reference: None,
                desc: String::new(),
            },
        }
    }

    pub fn units(mut self, units: &str) -> Self {
        self.meta.units = Some(units.to_string());
        self
    }

    /// Same default for every element.
    pub fn default(mut self, value: f64) -> Self {
        self.meta.default = vec![value; self.meta.size()];
        self
    }

    /// Element-wise default; the length is checked when declared.
    pub fn default_values(mut self, values: Vec<f64>) -> Self {
        self.meta.default = values;
        self
    }

    pub fn lower(mut self, lower: f64) -> Self {
        self.meta.lower = Some(lower);
        self
    }

    pub fn upper(mut self, upper: f64) -> Self {
        self.meta.upper = Some(upper);
        self
    }

    pub fn reference(mut self, reference: f64) -> Self {
        self.meta.reference = Some(reference);
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.meta.desc = desc.to_string();
        self
    }

    pub fn meta(&self) -> &VariableMeta {
        &self.meta
    }

    pub(crate) fn into_meta(self, kind: VarKind) -> VariableMeta {
        let mut meta = self.meta;
        meta.kind = kind;
        meta
    }
}
