// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for loading constants.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A user constants file was layered over the built-in defaults.
///
/// # Log Level
/// `debug!` - Once per load
pub struct ConstantsOverlaid<'a> {
    pub path: &'a str,
    /// Top-level sections present in the user file.
    pub sections: usize,
}

impl Display for ConstantsOverlaid<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Overlaying {} section(s) from '{}' on built-in constants",
            self.sections, self.path
        )
    }
}

impl StructuredLog for ConstantsOverlaid<'_> {
    fn log(&self) {
        tracing::debug!(path = self.path, sections = self.sections, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("constants", span_name = name, path = self.path)
    }
}
