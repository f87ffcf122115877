// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The composite model tree.
//!
//! A [`Group`] owns its children in declaration order and records the
//! connections, promotions and input defaults that tie them together. Nothing
//! is resolved here: paths are checked when the tree is assembled, so a group
//! can be built in any order.
//!
//! ```
//! use tokamak_mdo::components::util::ExecComp;
//! use tokamak_mdo::model::Group;
//!
//! let mut model = Group::new();
//! model
//!     .add_subsystem("double", ExecComp::new(&["x"], &["y"], |i| vec![i[0] * 2.0]))
//!     .unwrap();
//! model
//!     .add_subsystem("square", ExecComp::new(&["x"], &["y"], |i| vec![i[0] * i[0]]))
//!     .unwrap();
//! model.connect("double.y", "square.x");
//! model.promote("double.x", "x");
//! ```

use crate::errors::AssemblyError;
use crate::jacobian::Differentiation;
use crate::traits::Component;
use crate::variables::registry::validate_name;

/// A component together with the strategy used for its partials.
pub struct ComponentNode {
    pub component: Box<dyn Component>,
    pub differentiation: Differentiation,
}

/// A child of a group.
pub enum Node {
    Component(ComponentNode),
    Group(Group),
}

/// Directed value forwarding from an output path to an input path, both
/// relative to the owning group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

/// Exposes `child_path` under `external` at this group's boundary.
/// A `child_path` of the form `child.*` exposes every variable of `child`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub child_path: String,
    pub external: String,
}

impl Promotion {
    /// The child prefix of a wildcard promotion, including the trailing dot.
    pub fn wildcard_prefix(&self) -> Option<&str> {
        self.child_path
            .strip_suffix('*')
            .filter(|prefix| prefix.ends_with('.'))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputDefault {
    Continuous(Vec<f64>),
    Discrete(i64),
}

#[derive(Default)]
pub struct Group {
    pub(super) children: Vec<(String, Node)>,
    pub(super) connections: Vec<Connection>,
    pub(super) promotions: Vec<Promotion>,
    pub(super) input_defaults: Vec<(String, InputDefault)>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component using its preferred differentiation strategy.
    pub fn add_subsystem<C: Component + 'static>(&mut self, name: &str, component: C) -> Result<(), AssemblyError> {
        let differentiation = component.differentiation();
        self.add_subsystem_with(name, component, differentiation)
    }

    /// Add a component with an explicit differentiation strategy.
    pub fn add_subsystem_with<C: Component + 'static>(
        &mut self,
        name: &str,
        component: C,
        differentiation: Differentiation,
    ) -> Result<(), AssemblyError> {
        self.add_node(
            name,
            Node::Component(ComponentNode {
                component: Box::new(component),
                differentiation,
            }),
        )
    }

    pub fn add_group(&mut self, name: &str, group: Group) -> Result<(), AssemblyError> {
        self.add_node(name, Node::Group(group))
    }

    pub fn add_node(&mut self, name: &str, node: Node) -> Result<(), AssemblyError> {
        validate_name("group", name)?;
        if self.children.iter().any(|(existing, _)| existing == name) {
            return Err(AssemblyError::DuplicateName {
                scope: "group".to_string(),
                name: name.to_string(),
            });
        }
        self.children.push((name.to_string(), node));
        Ok(())
    }

    pub fn connect(&mut self, source: &str, target: &str) {
        self.connections.push(Connection {
            source: source.to_string(),
            target: target.to_string(),
        });
    }

    pub fn promote(&mut self, child_path: &str, external: &str) {
        self.promotions.push(Promotion {
            child_path: child_path.to_string(),
            external: external.to_string(),
        });
    }

    /// Promote each listed variable of `child` under its own name; `"*"`
    /// promotes all of them.
    pub fn promotes(&mut self, child: &str, names: &[&str]) {
        for name in names {
            self.promote(&format!("{}.{}", child, name), name);
        }
    }

    /// Canonical value for an input name visible at this group, used when
    /// several promoted inputs share it and nothing drives it.
    pub fn set_input_defaults(&mut self, name: &str, value: Vec<f64>) {
        self.input_defaults
            .push((name.to_string(), InputDefault::Continuous(value)));
    }

    pub fn set_discrete_default(&mut self, name: &str, value: i64) {
        self.input_defaults
            .push((name.to_string(), InputDefault::Discrete(value)));
    }

    pub fn children(&self) -> &[(String, Node)] {
        &self.children
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    pub fn input_defaults(&self) -> &[(String, InputDefault)] {
        &self.input_defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotes_records_named_and_wildcard_promotions() {
        let mut group = Group::new();
        group.promotes("magnets", &["R0", "*"]);

        let promotions = group.promotions();
        assert_eq!(promotions.len(), 2);
        assert_eq!(promotions[0].child_path, "magnets.R0");
        assert_eq!(promotions[0].external, "R0");
        assert_eq!(promotions[0].wildcard_prefix(), None);
        assert_eq!(promotions[1].child_path, "magnets.*");
        assert_eq!(promotions[1].external, "*");
        assert_eq!(promotions[1].wildcard_prefix(), Some("magnets."));
    }
}
