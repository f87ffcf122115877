// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Physics library: tokamak plasma, magnet, coil, current drive, fusion
//! and plant components, and the groups that wire them together.

pub mod beta;
pub mod coolant;
pub mod formulary;
pub mod fusion;
pub mod machine;
pub mod magnets;
pub mod nbicd;
pub mod plasma;
pub mod princeton_dee;
pub mod special;
pub mod util;

pub use beta::{
    specified_pressure, BPoloidal, BetaNTotal, BetaPoloidal, BetaToroidal, SpecifiedTotalAveragePressure,
    ThermalBetaPoloidal,
};
pub use coolant::SimpleCoolantPumpingPower;
pub use formulary::{AlfvenSpeed, AverageIonMass, CoulombLogarithmElectrons, CoulombLogarithmIons};
pub use fusion::{
    NBIBeamTargetFusion, SimpleFusionAlphaSource, SimpleRateCoeff, TotalDTFusionRate, VolumetricThermalFusionRate,
};
pub use machine::machine;
pub use magnets::{magnet_radial_build, FieldAtRadius, InnerTFCoilStrain, InnerTFCoilTension, MagnetCurrent, MagnetGeometry};
pub use nbicd::{
    current_drive_efficiency, current_drive_properties, CurrentDriveA, CurrentDriveAlphaCubed, CurrentDriveBeta1,
    CurrentDriveEfficiencyEquation, CurrentDriveEfficiencyTerms, CurrentDriveG, NBICurrent, TrappedParticleFraction,
};
pub use plasma::{PlasmaGeometry, SauterGeometry};
pub use princeton_dee::PrincetonDeeTFSet;
pub use util::{ExecComp, KsAggregate, SquaredLengthSubtraction};
