// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Read-only views of a problem: variable listings, total-derivative blocks
//! and the serialisable state dump.

use super::Problem;
use crate::jacobian::Matrix;
use crate::model::{AssembledModel, SlotOwner};
use crate::variables::VariableMeta;
use serde::Serialize;

/// One variable as reported to an optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableListing {
    /// Absolute path for inputs, root-visible name for outputs.
    pub name: String,
    /// Name the value is stored under at the root.
    pub promoted_name: String,
    pub units: Option<String>,
    pub value: Vec<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub reference: Option<f64>,
    pub desc: String,
    /// Settable through `set_input`.
    pub independent: bool,
    /// Driving output for connected inputs.
    pub source: Option<String>,
}

impl VariableListing {
    fn new(name: String, promoted_name: String, meta: &VariableMeta, value: Vec<f64>) -> Self {
        Self {
            name,
            promoted_name,
            units: meta.units.clone(),
            value,
            lower: meta.lower,
            upper: meta.upper,
            reference: meta.reference,
            desc: meta.desc.clone(),
            independent: false,
            source: None,
        }
    }
}

impl Problem {
    /// Every continuous component input, in declaration order.
    pub fn list_inputs(&self) -> Vec<VariableListing> {
        let mut listings = Vec::new();
        for component in &self.model.components {
            for (local, slot) in &component.inputs {
                let Some(meta) = component.vars.get(local) else {
                    continue;
                };
                let info = self.model.symbols.slot(*slot);
                let mut listing = VariableListing::new(
                    format!("{}.{}", component.path, local),
                    info.name.clone(),
                    meta,
                    self.values[slot.0].clone(),
                );
                listing.independent = info.is_independent();
                if !listing.independent {
                    listing.source = Some(info.path.clone());
                }
                listings.push(listing);
            }
        }
        listings
    }

    /// Independent inputs only, one entry per shared value.
    pub fn list_design_variables(&self) -> Vec<VariableListing> {
        self.model
            .symbols
            .slots()
            .filter(|(_, info)| info.is_independent())
            .map(|(slot, info)| {
                let mut listing =
                    VariableListing::new(info.name.clone(), info.name.clone(), &info.meta, self.values[slot.0].clone());
                listing.independent = true;
                listing
            })
            .collect()
    }

    /// Every continuous output, in declaration order.
    pub fn list_outputs(&self) -> Vec<VariableListing> {
        self.model
            .symbols
            .slots()
            .filter(|(_, info)| !info.is_independent())
            .map(|(slot, info)| {
                VariableListing::new(info.name.clone(), info.name.clone(), &info.meta, self.values[slot.0].clone())
            })
            .collect()
    }
}

/// One block of a [`Totals`] result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalBlock {
    pub of: String,
    pub wrt: String,
    pub value: Matrix,
}

/// Total derivatives keyed by (of, wrt) as requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub blocks: Vec<TotalBlock>,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn insert(&mut self, of: &str, wrt: &str, value: Matrix) {
        self.blocks.push(TotalBlock {
            of: of.to_string(),
            wrt: wrt.to_string(),
            value,
        });
    }

    pub fn get(&self, of: &str, wrt: &str) -> Option<&Matrix> {
        self.blocks
            .iter()
            .find(|b| b.of == of && b.wrt == wrt)
            .map(|b| &b.value)
    }

    pub fn take(&mut self, of: &str, wrt: &str) -> Option<Matrix> {
        let index = self.blocks.iter().position(|b| b.of == of && b.wrt == wrt)?;
        Some(self.blocks.swap_remove(index).value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateEntry {
    pub name: String,
    pub path: String,
    pub units: Option<String>,
    pub value: Vec<f64>,
    pub independent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscreteStateEntry {
    pub name: String,
    pub path: String,
    pub value: i64,
    pub independent: bool,
}

/// Every stored value with its units; what a recorder would persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDump {
    /// False when inputs changed after the last run.
    pub current: bool,
    pub values: Vec<StateEntry>,
    pub discrete: Vec<DiscreteStateEntry>,
}

impl StateDump {
    pub(super) fn capture(model: &AssembledModel, values: &[Vec<f64>], discrete: &[i64], current: bool) -> Self {
        Self {
            current,
            values: model
                .symbols
                .slots()
                .map(|(slot, info)| StateEntry {
                    name: info.name.clone(),
                    path: info.path.clone(),
                    units: info.meta.units.clone(),
                    value: values[slot.0].clone(),
                    independent: info.owner == SlotOwner::Independent,
                })
                .collect(),
            discrete: model
                .symbols
                .discrete_slots()
                .map(|(slot, info)| DiscreteStateEntry {
                    name: info.name.clone(),
                    path: info.path.clone(),
                    value: discrete[slot.0],
                    independent: info.is_independent(),
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&StateEntry> {
        self.values.iter().find(|e| e.name == name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
