// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod partials;
pub mod strategy;
pub mod verification;

/// Dense derivative block, rows indexed by output entries and columns by
/// input entries.
pub type Matrix = nalgebra::DMatrix<f64>;

pub use partials::{PartialBlock, Partials, Pattern, Sparsity};
pub use strategy::{local_jacobian, Differentiation, FdForm};
pub use verification::{check_component, CheckOptions, PartialCheck, PartialsReport};
