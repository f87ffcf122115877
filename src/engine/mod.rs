// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Evaluation and differentiation of an assembled model.

pub mod checks;
pub mod listing;
pub mod problem;
pub mod totals;

pub use checks::{TotalCheck, TotalsReport};
pub use listing::{StateDump, TotalBlock, Totals, VariableListing};
pub use problem::{Outputs, Problem};
pub use totals::DerivativeMode;
