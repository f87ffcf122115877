// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for model assembly.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Model flattened and ordered.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModelAssembled {
    pub components: usize,
    pub slots: usize,
    pub discrete_slots: usize,
    pub connections: usize,
    pub levels: usize,
}

impl Display for ModelAssembled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model assembled: {} components, {} value slots ({} discrete), {} dependencies in {} levels",
            self.components, self.slots, self.discrete_slots, self.connections, self.levels
        )
    }
}

impl StructuredLog for ModelAssembled {
    fn log(&self) {
        tracing::info!(
            components = self.components,
            slots = self.slots,
            discrete_slots = self.discrete_slots,
            connections = self.connections,
            levels = self.levels,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "model",
            span_name = name,
            components = self.components,
            slots = self.slots,
        )
    }
}

/// A component instance was flattened into the model.
///
/// # Log Level
/// `trace!` - One per component during assembly
pub struct ComponentDeclared<'a> {
    pub path: &'a str,
    pub kind: &'a str,
    pub variables: usize,
}

impl Display for ComponentDeclared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Component '{}' ({}) declared {} variable(s)",
            self.path, self.kind, self.variables
        )
    }
}

impl StructuredLog for ComponentDeclared<'_> {
    fn log(&self) {
        tracing::trace!(
            component = self.path,
            kind = self.kind,
            variables = self.variables,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("component", span_name = name, component = self.path, kind = self.kind)
    }
}

/// Promoted inputs that share a value declare different defaults and no
/// group default settles it; the first declaration is kept.
///
/// # Log Level
/// `warn!` - Likely modelling mistake
pub struct AmbiguousInputDefault<'a> {
    pub name: &'a str,
    pub kept: &'a str,
    pub ignored: &'a str,
}

impl Display for AmbiguousInputDefault<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Inputs promoted to '{}' declare different defaults; using '{}', ignoring '{}'. Set a group input default to silence this",
            self.name, self.kept, self.ignored
        )
    }
}

impl StructuredLog for AmbiguousInputDefault<'_> {
    fn log(&self) {
        tracing::warn!(
            name = self.name,
            kept = self.kept,
            ignored = self.ignored,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("ambiguous_default", span_name = name, variable = self.name)
    }
}

/// Assembly rejected the model.
///
/// # Log Level
/// `error!` - The model cannot be run
pub struct AssemblyFailed<'a> {
    pub errors: &'a [crate::errors::AssemblyError],
}

impl Display for AssemblyFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Model assembly failed with {} error(s)", self.errors.len())?;
        if let Some(first) = self.errors.first() {
            write!(f, "; first: {}", first)?;
        }
        Ok(())
    }
}

impl StructuredLog for AssemblyFailed<'_> {
    fn log(&self) {
        tracing::error!(error_count = self.errors.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("assembly_failed", span_name = name, error_count = self.errors.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssemblyError;

    #[test]
    fn test_assembly_failed_mentions_first_error() {
        let errors = vec![AssemblyError::DuplicateName {
            scope: "magnets".into(),
            name: "geometry".into(),
        }];
        let msg = AssemblyFailed { errors: &errors }.to_string();
        assert!(msg.starts_with("Model assembly failed with 1 error(s)"));
        assert!(msg.contains("geometry"));
    }
}
