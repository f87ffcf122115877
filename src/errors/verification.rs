// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::EvaluationError;
use thiserror::Error;

/// Errors raised only by the derivative cross-check utilities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    /// Declared derivative disagrees with the numeric estimate
    #[error(
        "Jacobian mismatch in '{component}' for d({of})/d({wrt})[{row},{col}]: declared {declared:e}, numeric {numeric:e} (abs {abs_error:e}, rel {rel_error:e})"
    )]
    JacobianMismatch {
        component: String,
        of: String,
        wrt: String,
        row: usize,
        col: usize,
        declared: f64,
        numeric: f64,
        abs_error: f64,
        rel_error: f64,
    },

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
