// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for derivative checks.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A derivative check finished.
///
/// # Log Level
/// `info!` when everything passed, `warn!` otherwise
pub struct CheckCompleted<'a> {
    pub kind: &'a str,
    pub method: &'a str,
    pub checked: usize,
    pub failed: usize,
}

impl Display for CheckCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} check against {}: {} block(s) checked, {} failed",
            self.kind, self.method, self.checked, self.failed
        )
    }
}

impl StructuredLog for CheckCompleted<'_> {
    fn log(&self) {
        if self.failed == 0 {
            tracing::info!(kind = self.kind, method = self.method, checked = self.checked, "{}", self);
        } else {
            tracing::warn!(
                kind = self.kind,
                method = self.method,
                checked = self.checked,
                failed = self.failed,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("check", span_name = name, kind = self.kind, method = self.method)
    }
}

/// One block disagrees with its numeric estimate.
///
/// # Log Level
/// `warn!` - Diagnostic
pub struct BlockMismatch<'a> {
    pub component: &'a str,
    pub of: &'a str,
    pub wrt: &'a str,
    pub max_abs_error: f64,
    pub max_rel_error: f64,
}

impl Display for BlockMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}': d({})/d({}) off by {:e} (relative {:e})",
            self.component, self.of, self.wrt, self.max_abs_error, self.max_rel_error
        )
    }
}

impl StructuredLog for BlockMismatch<'_> {
    fn log(&self) {
        tracing::warn!(
            component = self.component,
            of = self.of,
            wrt = self.wrt,
            max_abs_error = self.max_abs_error,
            max_rel_error = self.max_rel_error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("block_mismatch", span_name = name, component = self.component)
    }
}
