// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Chain-rule accumulation of local Jacobians over the evaluation order.
//!
//! A forward sweep seeds one slot with the identity and pushes tangents
//! downstream, giving the derivatives of every slot with respect to the seed.
//! A reverse sweep seeds one slot's adjoint and pulls it upstream, giving the
//! derivatives of that slot with respect to every other. Both visit each
//! component once; paths are summed implicitly, so a slot reachable through
//! several routes gets the sum of their contributions.

use crate::jacobian::{Matrix, Partials};
use crate::model::{AssembledModel, SlotId};
use serde::Serialize;

/// Direction of total-derivative accumulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// One sweep per `wrt` variable.
    Forward,
    /// One sweep per `of` variable.
    Reverse,
    /// Reverse when the `of` side is smaller than the `wrt` side.
    #[default]
    Auto,
}

impl DerivativeMode {
    /// Settle `Auto` for a request of the given total sizes.
    pub fn resolve(self, of_size: usize, wrt_size: usize) -> DerivativeMode {
        match self {
            DerivativeMode::Auto if of_size < wrt_size => DerivativeMode::Reverse,
            DerivativeMode::Auto => DerivativeMode::Forward,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DerivativeMode::Forward => "forward",
            DerivativeMode::Reverse => "reverse",
            DerivativeMode::Auto => "auto",
        }
    }
}

/// Tangents `d(slot)/d(seed)` for every slot the seed reaches.
///
/// An output used as the seed is held fixed: its producer does not
/// overwrite it.
pub(crate) fn forward_sweep(model: &AssembledModel, jacobians: &[Partials], seed: SlotId) -> Vec<Option<Matrix>> {
    let n = model.symbols.slot(seed).size();
    let mut tangents: Vec<Option<Matrix>> = vec![None; model.symbols.slot_count()];
    tangents[seed.0] = Some(Matrix::identity(n, n));

    for &index in &model.order {
        let component = &model.components[index];
        let partials = &jacobians[index];
        for (local, out_slot) in &component.outputs {
            if *out_slot == seed {
                continue;
            }
            let mut acc: Option<Matrix> = None;
            for block in partials.blocks().iter().filter(|b| &b.of == local) {
                let Some(in_slot) = component.input_slot(&block.wrt) else {
                    continue;
                };
                let Some(tangent) = &tangents[in_slot.0] else {
                    continue;
                };
                *acc.get_or_insert_with(|| Matrix::zeros(block.values.nrows(), n)) += &block.values * tangent;
            }
            tangents[out_slot.0] = acc;
        }
    }
    tangents
}

/// Adjoints `d(seed)/d(slot)` for every slot that reaches the seed.
pub(crate) fn reverse_sweep(model: &AssembledModel, jacobians: &[Partials], seed: SlotId) -> Vec<Option<Matrix>> {
    let m = model.symbols.slot(seed).size();
    let mut adjoints: Vec<Option<Matrix>> = vec![None; model.symbols.slot_count()];
    adjoints[seed.0] = Some(Matrix::identity(m, m));

    for &index in model.order.iter().rev() {
        let component = &model.components[index];
        let partials = &jacobians[index];
        for (local, out_slot) in &component.outputs {
            let Some(adjoint) = adjoints[out_slot.0].clone() else {
                continue;
            };
            for block in partials.blocks().iter().filter(|b| &b.of == local) {
                let Some(in_slot) = component.input_slot(&block.wrt) else {
                    continue;
                };
                *adjoints[in_slot.0].get_or_insert_with(|| Matrix::zeros(m, block.values.ncols())) +=
                    &adjoint * &block.values;
            }
        }
    }
    adjoints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_mode_resolution() {
        assert_eq!(DerivativeMode::Auto.resolve(1, 5), DerivativeMode::Reverse);
        assert_eq!(DerivativeMode::Auto.resolve(5, 1), DerivativeMode::Forward);
        assert_eq!(DerivativeMode::Auto.resolve(2, 2), DerivativeMode::Forward);
        assert_eq!(DerivativeMode::Reverse.resolve(5, 1), DerivativeMode::Reverse);
    }
}
