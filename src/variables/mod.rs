// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod meta;
pub(crate) mod registry;
mod values;

pub use meta::{Shape, Var, VarKind, VariableMeta};
pub use registry::VariableRegistry;
pub use values::{DiscreteValues, Values};
