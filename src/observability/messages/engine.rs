// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for evaluation and differentiation events.

use crate::errors::EvaluationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A full model evaluation committed its results.
///
/// # Log Level
/// `debug!` - Emitted once per optimizer iteration
pub struct RunCompleted {
    pub components: usize,
    pub duration: Duration,
}

impl Display for RunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model run completed: {} components in {:?}",
            self.components, self.duration
        )
    }
}

impl StructuredLog for RunCompleted {
    fn log(&self) {
        tracing::debug!(
            components = self.components,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("run", span_name = name, components = self.components)
    }
}

/// A component failed; nothing from this run was committed.
///
/// # Log Level
/// `warn!` - Recoverable by the caller
pub struct ComponentFailed<'a> {
    pub component: &'a str,
    pub error: &'a EvaluationError,
}

impl Display for ComponentFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Component '{}' failed, run rolled back: {}",
            self.component, self.error
        )
    }
}

impl StructuredLog for ComponentFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            component = self.component,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("component_failed", span_name = name, component = self.component)
    }
}

/// Local Jacobians were recomputed for the current point.
///
/// # Log Level
/// `debug!` - Once per point at which derivatives are requested
pub struct JacobiansRefreshed {
    pub components: usize,
    pub duration: Duration,
}

impl Display for JacobiansRefreshed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Local Jacobians of {} components computed in {:?}",
            self.components, self.duration
        )
    }
}

impl StructuredLog for JacobiansRefreshed {
    fn log(&self) {
        tracing::debug!(
            components = self.components,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("jacobians", span_name = name, components = self.components)
    }
}

/// A block of total derivatives was assembled.
///
/// # Log Level
/// `debug!` - Once per derivative request
pub struct TotalsComputed<'a> {
    pub mode: &'a str,
    pub of: usize,
    pub wrt: usize,
    pub sweeps: usize,
}

impl Display for TotalsComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Total derivatives of {} variable(s) with respect to {} computed in {} mode ({} sweeps)",
            self.of, self.wrt, self.mode, self.sweeps
        )
    }
}

impl StructuredLog for TotalsComputed<'_> {
    fn log(&self) {
        tracing::debug!(
            mode = self.mode,
            of = self.of,
            wrt = self.wrt,
            sweeps = self.sweeps,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("totals", span_name = name, mode = self.mode)
    }
}

/// A model evaluation is starting.
///
/// # Log Level
/// `trace!` - Paired with [`RunCompleted`]
pub struct RunStarted {
    pub components: usize,
    pub levels: usize,
}

impl Display for RunStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Model run started: {} components in {} levels",
            self.components, self.levels
        )
    }
}

impl StructuredLog for RunStarted {
    fn log(&self) {
        tracing::trace!(components = self.components, levels = self.levels, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("run", span_name = name, components = self.components)
    }
}

/// Total derivatives were requested.
///
/// # Log Level
/// `trace!` - Paired with [`TotalsComputed`]
pub struct TotalsRequested<'a> {
    pub mode: &'a str,
    pub of: &'a [&'a str],
    pub wrt: &'a [&'a str],
}

impl Display for TotalsRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Total derivatives of [{}] with respect to [{}] requested in {} mode",
            self.of.join(", "),
            self.wrt.join(", "),
            self.mode
        )
    }
}

impl StructuredLog for TotalsRequested<'_> {
    fn log(&self) {
        tracing::trace!(mode = self.mode, of = self.of.len(), wrt = self.wrt.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "totals",
            span_name = name,
            mode = self.mode,
            of = self.of.len(),
            wrt = self.wrt.len(),
        )
    }
}
