// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Resolved storage handles.
//!
//! Every continuous output owns one slot. Inputs never own storage: a
//! connected input aliases the slot of its source, and each family of
//! unconnected inputs that share a promoted name shares one independent slot.
//! Discrete variables follow the same scheme in a separate table.

use crate::variables::VariableMeta;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DiscreteSlotId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Continuous(SlotId),
    Discrete(DiscreteSlotId),
}

/// Who writes a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotOwner {
    /// Written by the component at this index on every run.
    Output { component: usize },
    /// Set by the caller; a design variable.
    Independent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotInfo {
    /// Name visible at the root group.
    pub name: String,
    /// Absolute path of the defining output, or of the first input sharing
    /// an independent slot.
    pub path: String,
    pub owner: SlotOwner,
    /// Declared metadata; `default` already reflects group-level defaults.
    pub meta: VariableMeta,
}

impl SlotInfo {
    pub fn size(&self) -> usize {
        self.meta.size()
    }

    pub fn is_independent(&self) -> bool {
        self.owner == SlotOwner::Independent
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteSlotInfo {
    pub name: String,
    pub path: String,
    pub owner: SlotOwner,
    pub default: i64,
}

impl DiscreteSlotInfo {
    pub fn is_independent(&self) -> bool {
        self.owner == SlotOwner::Independent
    }
}

/// Name to handle map built once at assembly.
///
/// Both root-visible promoted names and absolute paths resolve; an input's
/// absolute path resolves to the slot it reads.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub(crate) slots: Vec<SlotInfo>,
    pub(crate) discrete: Vec<DiscreteSlotInfo>,
    pub(crate) names: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn resolve(&self, name: &str) -> Option<Symbol> {
        self.names.get(name).copied()
    }

    pub fn slot(&self, id: SlotId) -> &SlotInfo {
        &self.slots[id.0]
    }

    pub fn discrete_slot(&self, id: DiscreteSlotId) -> &DiscreteSlotInfo {
        &self.discrete[id.0]
    }

    pub fn slots(&self) -> impl Iterator<Item = (SlotId, &SlotInfo)> {
        self.slots.iter().enumerate().map(|(i, s)| (SlotId(i), s))
    }

    pub fn discrete_slots(&self) -> impl Iterator<Item = (DiscreteSlotId, &DiscreteSlotInfo)> {
        self.discrete
            .iter()
            .enumerate()
            .map(|(i, s)| (DiscreteSlotId(i), s))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn discrete_count(&self) -> usize {
        self.discrete.len()
    }
}
