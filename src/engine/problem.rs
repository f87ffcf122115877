// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The evaluation and differentiation driver.
//!
//! A [`Problem`] owns an assembled model and the current value of every
//! slot. Callers set independent inputs, run the model, and ask for total
//! derivatives; every operation either completes or leaves the stored state
//! exactly as it was.

use super::listing::{StateDump, Totals};
use super::totals::{forward_sweep, reverse_sweep, DerivativeMode};
use crate::errors::{EvaluationError, ModelError};
use crate::jacobian::{local_jacobian, strategy, Matrix, Partials};
use crate::model::{assemble, AssembledModel, FlatComponent, Group, SlotId, Symbol};
use crate::observability::messages::assembly::AssemblyFailed;
use crate::observability::messages::engine::{
    ComponentFailed, JacobiansRefreshed, RunCompleted, RunStarted, TotalsComputed, TotalsRequested,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Output values keyed by their root-visible name.
pub type Outputs = BTreeMap<String, Vec<f64>>;

pub struct Problem {
    pub(super) model: AssembledModel,
    pub(super) values: Vec<Vec<f64>>,
    pub(super) discrete: Vec<i64>,
    /// Outputs not read by any component.
    leaves: Vec<SlotId>,
    /// Stored outputs reflect the stored inputs.
    current: bool,
    /// Local Jacobians at the stored point, by component index.
    jacobians: Option<Vec<Partials>>,
    mode: DerivativeMode,
}

impl Problem {
    /// Assemble `root` and initialise every slot from its default.
    pub fn new(root: Group) -> Result<Self, ModelError> {
        let model = assemble(root).map_err(|errors| {
            AssemblyFailed { errors: &errors }.log();
            ModelError::Assembly(errors)
        })?;

        let values = model
            .symbols
            .slots()
            .map(|(_, slot)| slot.meta.default.clone())
            .collect();
        let discrete = model.symbols.discrete_slots().map(|(_, s)| s.default).collect();

        let consumed: HashSet<SlotId> = model
            .components
            .iter()
            .flat_map(|c| c.inputs.iter().map(|(_, slot)| *slot))
            .collect();
        let leaves = model
            .symbols
            .slots()
            .filter(|(id, slot)| !slot.is_independent() && !consumed.contains(id))
            .map(|(id, _)| id)
            .collect();

        Ok(Self {
            model,
            values,
            discrete,
            leaves,
            current: false,
            jacobians: None,
            mode: DerivativeMode::default(),
        })
    }

    /// A model of one component with all of its variables promoted.
    pub fn from_component<C: Component + 'static>(name: &str, component: C) -> Result<Self, ModelError> {
        let mut root = Group::new();
        root.add_subsystem(name, component)?;
        root.promotes(name, &["*"]);
        Self::new(root)
    }

    pub fn model(&self) -> &AssembledModel {
        &self.model
    }

    pub fn mode(&self) -> DerivativeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DerivativeMode) {
        self.mode = mode;
    }

    /// Whether stored outputs reflect the stored inputs.
    pub fn is_current(&self) -> bool {
        self.current
    }

    /// Set one independent continuous input.
    pub fn set_input(&mut self, name: &str, value: &[f64]) -> Result<(), EvaluationError> {
        let slot = self.independent_slot(name, value.len())?;
        self.values[slot.0] = value.to_vec();
        self.invalidate();
        Ok(())
    }

    pub fn set_scalar(&mut self, name: &str, value: f64) -> Result<(), EvaluationError> {
        self.set_input(name, &[value])
    }

    /// Set several inputs at once; nothing is applied unless all are valid.
    pub fn set_inputs(&mut self, inputs: &[(&str, Vec<f64>)]) -> Result<(), EvaluationError> {
        let slots = inputs
            .iter()
            .map(|(name, value)| self.independent_slot(name, value.len()))
            .collect::<Result<Vec<_>, _>>()?;
        for (slot, (_, value)) in slots.into_iter().zip(inputs) {
            self.values[slot.0] = value.clone();
        }
        self.invalidate();
        Ok(())
    }

    pub fn set_discrete(&mut self, name: &str, value: i64) -> Result<(), EvaluationError> {
        let id = match self.model.symbols.resolve(name) {
            Some(Symbol::Discrete(id)) => id,
            Some(Symbol::Continuous(_)) => {
                return Err(EvaluationError::KindMismatch {
                    name: name.to_string(),
                    expected: "discrete",
                })
            }
            None => return Err(unknown(name)),
        };
        let slot = self.model.symbols.discrete_slot(id);
        if !slot.is_independent() {
            return Err(EvaluationError::NotIndependent {
                name: name.to_string(),
                source_name: slot.path.clone(),
            });
        }
        self.discrete[id.0] = value;
        self.invalidate();
        Ok(())
    }

    /// Stored value of any continuous variable, by promoted name or path.
    pub fn get(&self, name: &str) -> Result<&[f64], EvaluationError> {
        let slot = self.continuous_slot(name)?;
        Ok(&self.values[slot.0])
    }

    pub fn get_scalar(&self, name: &str) -> Result<f64, EvaluationError> {
        self.get(name)?
            .first()
            .copied()
            .ok_or_else(|| unknown(name))
    }

    pub fn get_discrete(&self, name: &str) -> Result<i64, EvaluationError> {
        match self.model.symbols.resolve(name) {
            Some(Symbol::Discrete(id)) => Ok(self.discrete[id.0]),
            Some(Symbol::Continuous(_)) => Err(EvaluationError::KindMismatch {
                name: name.to_string(),
                expected: "discrete",
            }),
            None => Err(unknown(name)),
        }
    }

    /// Evaluate every component once, in order, and commit the results.
    /// On failure nothing is committed.
    pub fn run(&mut self) -> Result<Outputs, EvaluationError> {
        let start_msg = RunStarted {
            components: self.model.components.len(),
            levels: self.model.levels.len(),
        };
        let span = start_msg.span("run");
        let _guard = span.enter();
        start_msg.log();

        let start = Instant::now();
        let (values, discrete) = self.evaluate(self.values.clone(), self.discrete.clone())?;
        self.values = values;
        self.discrete = discrete;
        self.current = true;
        self.jacobians = None;

        RunCompleted {
            components: self.model.components.len(),
            duration: start.elapsed(),
        }
        .log();

        Ok(self
            .leaves
            .iter()
            .map(|slot| (self.model.symbols.slot(*slot).name.clone(), self.values[slot.0].clone()))
            .collect())
    }

    /// Pure evaluation of the model from the given slot values.
    pub(super) fn evaluate(
        &self,
        mut values: Vec<Vec<f64>>,
        mut discrete: Vec<i64>,
    ) -> Result<(Vec<Vec<f64>>, Vec<i64>), EvaluationError> {
        for &index in &self.model.order {
            let component = &self.model.components[index];
            let result = evaluate_component(component, &mut values, &mut discrete);
            if let Err(error) = result {
                ComponentFailed {
                    component: &component.path,
                    error: &error,
                }
                .log();
                return Err(error);
            }
        }
        Ok((values, discrete))
    }

    /// d(`of`)/d(`wrt`) at the stored inputs, running the model first if
    /// its outputs are stale. All zeros when `of` does not depend on `wrt`.
    pub fn total_derivative(&mut self, of: &str, wrt: &str) -> Result<Matrix, EvaluationError> {
        let mut totals = self.compute_totals(&[of], &[wrt])?;
        totals
            .take(of, wrt)
            .ok_or_else(|| unknown(of))
    }

    /// Every block d(of[i])/d(wrt[j]) in one pass.
    pub fn compute_totals(&mut self, of: &[&str], wrt: &[&str]) -> Result<Totals, EvaluationError> {
        let of_slots = of
            .iter()
            .map(|name| self.continuous_slot(name))
            .collect::<Result<Vec<_>, _>>()?;
        let wrt_slots = wrt
            .iter()
            .map(|name| self.continuous_slot(name))
            .collect::<Result<Vec<_>, _>>()?;

        let request = TotalsRequested {
            mode: self.mode.label(),
            of,
            wrt,
        };
        let span = request.span("compute_totals");
        let _guard = span.enter();
        request.log();

        self.refresh_jacobians()?;
        let jacobians = self.jacobians.as_deref().unwrap_or_default();

        let size = |slots: &[SlotId]| -> usize { slots.iter().map(|s| self.model.symbols.slot(*s).size()).sum() };
        let mode = self.mode.resolve(size(&of_slots), size(&wrt_slots));
        let mut totals = Totals::new();

        match mode {
            DerivativeMode::Reverse => {
                for (o, o_slot) in of.iter().zip(&of_slots) {
                    let adjoints = reverse_sweep(&self.model, jacobians, *o_slot);
                    for (w, w_slot) in wrt.iter().zip(&wrt_slots) {
                        let block = adjoints[w_slot.0].clone().unwrap_or_else(|| {
                            Matrix::zeros(self.model.symbols.slot(*o_slot).size(), self.model.symbols.slot(*w_slot).size())
                        });
                        totals.insert(o, w, block);
                    }
                }
            }
            DerivativeMode::Forward | DerivativeMode::Auto => {
                for (w, w_slot) in wrt.iter().zip(&wrt_slots) {
                    let tangents = forward_sweep(&self.model, jacobians, *w_slot);
                    for (o, o_slot) in of.iter().zip(&of_slots) {
                        let block = tangents[o_slot.0].clone().unwrap_or_else(|| {
                            Matrix::zeros(self.model.symbols.slot(*o_slot).size(), self.model.symbols.slot(*w_slot).size())
                        });
                        totals.insert(o, w, block);
                    }
                }
            }
        }

        TotalsComputed {
            mode: mode.label(),
            of: of.len(),
            wrt: wrt.len(),
            sweeps: match mode {
                DerivativeMode::Reverse => of.len(),
                _ => wrt.len(),
            },
        }
        .log();
        Ok(totals)
    }

    /// Local Jacobians at the stored point; computed once per point.
    pub fn local_jacobians(&mut self) -> Result<&[Partials], EvaluationError> {
        self.refresh_jacobians()?;
        Ok(self.jacobians.as_deref().unwrap_or_default())
    }

    fn refresh_jacobians(&mut self) -> Result<(), EvaluationError> {
        self.ensure_current()?;
        if self.jacobians.is_some() {
            return Ok(());
        }
        let start = Instant::now();
        let mut jacobians = Vec::with_capacity(self.model.components.len());
        for component in &self.model.components {
            let (inputs, discrete) = gather(component, &self.values, &self.discrete);
            let partials = local_jacobian(
                component.differentiation,
                component.component.as_ref(),
                &component.vars,
                &component.partials,
                &inputs,
                &discrete,
            )?;
            jacobians.push(partials);
        }
        JacobiansRefreshed {
            components: jacobians.len(),
            duration: start.elapsed(),
        }
        .log();
        self.jacobians = Some(jacobians);
        Ok(())
    }

    pub(super) fn ensure_current(&mut self) -> Result<(), EvaluationError> {
        if !self.current {
            self.run()?;
        }
        Ok(())
    }

    /// Snapshot of every slot value with units.
    pub fn state(&self) -> StateDump {
        StateDump::capture(&self.model, &self.values, &self.discrete, self.current)
    }

    fn invalidate(&mut self) {
        self.current = false;
        self.jacobians = None;
    }

    pub(super) fn continuous_slot(&self, name: &str) -> Result<SlotId, EvaluationError> {
        match self.model.symbols.resolve(name) {
            Some(Symbol::Continuous(slot)) => Ok(slot),
            Some(Symbol::Discrete(_)) => Err(EvaluationError::KindMismatch {
                name: name.to_string(),
                expected: "continuous",
            }),
            None => Err(unknown(name)),
        }
    }

    pub(super) fn independent_slot(&self, name: &str, len: usize) -> Result<SlotId, EvaluationError> {
        let slot = self.continuous_slot(name)?;
        let info = self.model.symbols.slot(slot);
        if !info.is_independent() {
            return Err(EvaluationError::NotIndependent {
                name: name.to_string(),
                source_name: info.path.clone(),
            });
        }
        if info.size() != len {
            return Err(EvaluationError::ShapeMismatch {
                name: name.to_string(),
                expected: info.size(),
                got: len,
            });
        }
        Ok(slot)
    }
}

fn unknown(name: &str) -> EvaluationError {
    EvaluationError::UnknownVariable {
        name: name.to_string(),
    }
}

/// Copy a component's inputs out of the slot store.
pub(super) fn gather(component: &FlatComponent, values: &[Vec<f64>], discrete: &[i64]) -> (Values<f64>, DiscreteValues) {
    let mut inputs = Values::new(&component.path);
    for (local, slot) in &component.inputs {
        inputs.insert(local, values[slot.0].clone());
    }
    let mut discrete_inputs = DiscreteValues::new(&component.path);
    for (local, slot) in &component.discrete_inputs {
        discrete_inputs.set(local, discrete[slot.0]);
    }
    (inputs, discrete_inputs)
}

fn evaluate_component(
    component: &FlatComponent,
    values: &mut [Vec<f64>],
    discrete: &mut [i64],
) -> Result<(), EvaluationError> {
    let (inputs, discrete_inputs) = gather(component, values, discrete);
    let mut outputs = strategy::evaluate(component.component.as_ref(), &inputs, &discrete_inputs)?;

    for (local, slot) in &component.outputs {
        let value = outputs.take(local).ok_or_else(|| EvaluationError::MissingOutput {
            component: component.path.clone(),
            output: local.clone(),
        })?;
        let expected = values[slot.0].len();
        if value.len() != expected {
            return Err(EvaluationError::ShapeMismatch {
                name: format!("{}.{}", component.path, local),
                expected,
                got: value.len(),
            });
        }
        values[slot.0] = value;
    }

    if !component.discrete_outputs.is_empty() {
        let mut discrete_outputs = DiscreteValues::new(&component.path);
        component
            .component
            .compute_discrete(&inputs, &discrete_inputs, &mut discrete_outputs)?;
        for (local, slot) in &component.discrete_outputs {
            discrete[slot.0] = discrete_outputs.take(local).ok_or_else(|| EvaluationError::MissingOutput {
                component: component.path.clone(),
                output: local.clone(),
            })?;
        }
    }
    Ok(())
}
