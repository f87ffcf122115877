// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Model structure: the group tree and its flattening.

pub mod assembler;
pub mod group;
pub mod symbols;
pub mod validation;

pub use assembler::{assemble, AssembledModel, FlatComponent};
pub use group::{ComponentNode, Connection, Group, InputDefault, Node, Promotion};
pub use symbols::{DiscreteSlotId, SlotId, SlotOwner, Symbol, SymbolTable};
pub use validation::DependencyGraph;
