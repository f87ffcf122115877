// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A small whole-machine model: an elliptical plasma inside a Princeton Dee
//! TF set, with the magnet radial build supplying the toroidal field to the
//! plasma pressure chain.

use super::beta::specified_pressure;
use super::magnets::magnet_radial_build;
use super::plasma::PlasmaGeometry;
use super::princeton_dee::PrincetonDeeTFSet;
use super::util::ExecComp;
use crate::config::ConfigAccessor;
use crate::errors::ModelError;
use crate::model::Group;

/// Independent inputs an optimizer would vary.
pub const DESIGN_VARIABLES: &[&str] = &["R0", "A", "r_ot", "r_im", "j_HTS", "outboard gap"];

/// Objective followed by the constraints, each satisfied when non-negative.
pub const RESPONSES: &[&str] = &["obj", "con2", "con3", "max_stress_con", "constraint_axis_within_coils"];

/// Build the machine group.
///
/// The outboard TF leg sits a fixed `outboard gap` outside the plasma, so
/// growing the plasma lengthens the coil set and shifts the outboard leg of
/// the radial build.
pub fn machine(config: &impl ConfigAccessor) -> Result<Group, ModelError> {
    let mut group = Group::new();

    group.add_subsystem("plasma", PlasmaGeometry::new(config)?)?;
    group.promotes("plasma", &["R0", "A", "a", "R_max"]);

    group.add_group("pressure", specified_pressure(config)?)?;
    group.promotes("pressure", &["A", "a", "Ip", "L_pol"]);

    group.add_group("magnets", magnet_radial_build(config)?)?;
    group.promotes("magnets", &["R0", "r_im", "j_HTS", "B0"]);
    group.promotes("magnets", &["obj", "con2", "con3", "max_stress_con"]);
    group.promote("magnets.r_ot", "r_ot");
    group.connect("B0", "pressure.Bt");

    let outboard = ExecComp::new(&["R_max", "outboard gap"], &["r_iu"], |x| vec![x[0] + x[1]])
        .units("R_max", "m")
        .units("outboard gap", "m")
        .units("r_iu", "m")
        .default("outboard gap", 3.0);
    group.add_subsystem("outboard", outboard)?;
    group.promotes("outboard", &["R_max", "outboard gap"]);
    group.connect("outboard.r_iu", "magnets.r_iu");
    group.connect("outboard.r_iu", "coils.Ob TF R_in");

    group.add_subsystem("coils", PrincetonDeeTFSet)?;
    group.promotes("coils", &["R0", "V_enc", "constraint_axis_within_coils"]);
    group.promote("coils.Ib TF R_out", "r_ot");

    group.set_input_defaults("R0", vec![3.0]);
    group.set_input_defaults("r_ot", vec![0.405]);
    group.set_input_defaults("Ip", vec![8.0]);
    group.set_input_defaults("L_pol", vec![12.0]);
    group.set_input_defaults("j_HTS", vec![100.0]);
    Ok(group)
}
