// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Plasma cross-section geometry.

use crate::config::consts::DEFAULT_BOUNDARY_POINTS;
use crate::config::ConfigAccessor;
use crate::errors::{AssemblyError, ConfigError, EvaluationError};
use crate::jacobian::{Partials, Sparsity};
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};
use std::f64::consts::PI;

/// Perimeter of an ellipse, Ramanujan's first approximation.
fn ellipse_perimeter<T: DualNum<f64> + Copy>(a: T, b: T) -> T {
    let root = ((a * 3.0 + b) * (a + b * 3.0)).sqrt();
    ((a + b) * 3.0 - root) * PI
}

/// d(perimeter)/da and d(perimeter)/db.
fn ellipse_perimeter_derivatives(a: f64, b: f64) -> (f64, f64) {
    let root = ((3.0 * a + b) * (a + 3.0 * b)).sqrt();
    (
        PI * (3.0 - (3.0 * a + 5.0 * b) / root),
        PI * (3.0 - (5.0 * a + 3.0 * b) / root),
    )
}

/// Elliptical plasma with an elongation set by the marginal κ–ε scaling.
///
/// ```text
/// a = R0 / A          κ = m (c0 + c1 / A^c2)
/// b = κ a             V = 2π² R0 a b
/// ```
///
/// Triangularity is always zero for this shape.
#[derive(Debug, Clone)]
pub struct PlasmaGeometry {
    kappa_multiplier: f64,
    kappa_constants: [f64; 3],
}

impl PlasmaGeometry {
    /// Read `κ multiplier` and `marginal κ-ε scaling/constants` from the
    /// `fits` section.
    pub fn new(config: &impl ConfigAccessor) -> Result<Self, ConfigError> {
        let kappa_multiplier = config.scalar(&["fits", "κ multiplier"])?;
        let c = config.array_of_len(&["fits", "marginal κ-ε scaling", "constants"], 3)?;
        Ok(Self {
            kappa_multiplier,
            kappa_constants: [c[0], c[1], c[2]],
        })
    }

    fn elongation<T: DualNum<f64> + Copy>(&self, aspect_ratio: T) -> T {
        let [c0, c1, c2] = self.kappa_constants;
        (aspect_ratio.powf(-c2) * c1 + c0) * self.kappa_multiplier
    }

    fn check_domain(&self, component: &str, r0: f64, aspect_ratio: f64) -> Result<(), EvaluationError> {
        if r0 <= 0.0 {
            return Err(EvaluationError::domain(component, "R0", format!("major radius must be positive, got {}", r0)));
        }
        if aspect_ratio <= 1.0 {
            return Err(EvaluationError::domain(component, "A", format!("aspect ratio must exceed 1, got {}", aspect_ratio)));
        }
        Ok(())
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let r0 = inputs.scalar("R0")?;
        let aspect_ratio = inputs.scalar("A")?;
        self.check_domain(inputs.owner(), r0.re(), aspect_ratio.re())?;

        let a = r0 / aspect_ratio;
        let kappa = self.elongation(aspect_ratio);
        let b = kappa * a;

        outputs.set_scalar("a", a);
        outputs.set_scalar("b", b);
        outputs.set_scalar("ε", aspect_ratio.recip());
        outputs.set_scalar("κ", kappa);
        outputs.set_scalar("δ", T::from(0.0f64));
        outputs.set_scalar("full_plasma_height", b * 2.0);
        outputs.set_scalar("surface area", r0 * ellipse_perimeter(a, b) * (2.0 * PI));
        outputs.set_scalar("V", r0 * a * b * (2.0 * PI * PI));
        outputs.set_scalar("R_min", r0 - a);
        outputs.set_scalar("R_max", r0 + a);
        Ok(())
    }
}

impl Component for PlasmaGeometry {
    fn name(&self) -> &'static str {
        "PlasmaGeometry"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("R0").units("m").default(3.0).desc("Major radius"))?;
        vars.input(Var::scalar("A").default(1.7).desc("Aspect ratio"))?;

        vars.output(Var::scalar("a").units("m").desc("Minor radius"))?;
        vars.output(Var::scalar("b").units("m").desc("Minor radius height"))?;
        vars.output(Var::scalar("ε").desc("Inverse aspect ratio"))?;
        vars.output(Var::scalar("κ").desc("Elongation"))?;
        vars.output(Var::scalar("δ").default(0.0).desc("Triangularity"))?;
        vars.output(Var::scalar("full_plasma_height").units("m").desc("Full plasma height"))?;
        vars.output(Var::scalar("surface area").units("m**2").desc("Surface area"))?;
        vars.output(Var::scalar("V").units("m**3").desc("Volume"))?;
        vars.output(Var::scalar("R_min").units("m").desc("Inner radius of plasma at midplane"))?;
        vars.output(Var::scalar("R_max").units("m").desc("Outer radius of plasma at midplane"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(
            &["a", "b", "full_plasma_height", "surface area", "V", "R_min", "R_max"],
            &["R0", "A"],
        );
        sparsity.declare_all(&["ε", "κ"], &["A"]);
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let r0 = inputs.scalar("R0")?;
        let aspect_ratio = inputs.scalar("A")?;
        let [_, c1, c2] = self.kappa_constants;

        let a = r0 / aspect_ratio;
        let kappa = self.elongation(aspect_ratio);
        let b = kappa * a;
        let dkappa_da_r = -self.kappa_multiplier * c1 * c2 * aspect_ratio.powf(-c2 - 1.0);

        let da_dr0 = 1.0 / aspect_ratio;
        let da_dar = -r0 / aspect_ratio.powi(2);
        let db_dr0 = kappa * da_dr0;
        let db_dar = dkappa_da_r * a + kappa * da_dar;

        partials.set("a", "R0", da_dr0)?;
        partials.set("a", "A", da_dar)?;
        partials.set("b", "R0", db_dr0)?;
        partials.set("b", "A", db_dar)?;
        partials.set("full_plasma_height", "R0", 2.0 * db_dr0)?;
        partials.set("full_plasma_height", "A", 2.0 * db_dar)?;
        partials.set("ε", "A", -1.0 / aspect_ratio.powi(2))?;
        partials.set("κ", "A", dkappa_da_r)?;

        let perimeter = ellipse_perimeter(a, b);
        let (dp_da, dp_db) = ellipse_perimeter_derivatives(a, b);
        partials.set(
            "surface area",
            "R0",
            2.0 * PI * (perimeter + r0 * (dp_da * da_dr0 + dp_db * db_dr0)),
        )?;
        partials.set("surface area", "A", 2.0 * PI * r0 * (dp_da * da_dar + dp_db * db_dar))?;

        let torus = 2.0 * PI * PI;
        partials.set("V", "R0", torus * (a * b + r0 * (da_dr0 * b + a * db_dr0)))?;
        partials.set("V", "A", torus * r0 * (da_dar * b + a * db_dar))?;

        partials.set("R_min", "R0", 1.0 - da_dr0)?;
        partials.set("R_min", "A", -da_dar)?;
        partials.set("R_max", "R0", 1.0 + da_dr0)?;
        partials.set("R_max", "A", da_dar)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// D-shaped plasma boundary after Sauter (Fus. Eng. Des. 112, 2016).
///
/// ```text
/// R(θ) = R0 + a cos(θ + δ sin θ − ξ sin 2θ)
/// Z(θ) = κ a sin(θ + ξ sin 2θ)
/// ```
///
/// The boundary is sampled at `nθ` angles evenly spaced over [0, 2π].
#[derive(Debug, Clone)]
pub struct SauterGeometry {
    theta: Vec<f64>,
}

impl SauterGeometry {
    pub fn new(n_theta: usize) -> Self {
        let theta = match n_theta {
            0 => Vec::new(),
            1 => vec![0.0],
            n => (0..n).map(|i| 2.0 * PI * i as f64 / (n - 1) as f64).collect(),
        };
        Self { theta }
    }

    pub fn n_theta(&self) -> usize {
        self.theta.len()
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let r0 = inputs.scalar("R0")?;
        let a = inputs.scalar("a")?;
        let kappa = inputs.scalar("κ")?;
        let delta = inputs.scalar("δ")?;
        let xi = inputs.scalar("ξ")?;
        if r0.re() <= 0.0 {
            return Err(EvaluationError::domain(inputs.owner(), "R0", "major radius must be positive"));
        }

        let mut r = Vec::with_capacity(self.theta.len());
        let mut z = Vec::with_capacity(self.theta.len());
        for &theta in &self.theta {
            let (s1, s2) = (theta.sin(), (2.0 * theta).sin());
            r.push(r0 + a * (delta * s1 - xi * s2 + theta).cos());
            z.push(kappa * a * (xi * s2 + theta).sin());
        }
        let b = kappa * a;

        outputs.set_array("R", r);
        outputs.set_array("Z", z);
        outputs.set_scalar("Z0", T::from(0.0f64));
        outputs.set_scalar("b", b);
        outputs.set_scalar("ε", a / r0);
        outputs.set_scalar("full_plasma_height", b * 2.0);
        outputs.set_scalar("R_min", r0 - a);
        outputs.set_scalar("R_max", r0 + a);
        Ok(())
    }
}

impl Default for SauterGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_BOUNDARY_POINTS)
    }
}

impl Component for SauterGeometry {
    fn name(&self) -> &'static str {
        "SauterGeometry"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        let n = self.n_theta();
        vars.input(Var::scalar("R0").units("m").default(3.0).desc("Major radius"))?;
        vars.input(Var::scalar("a").units("m").desc("Minor radius"))?;
        vars.input(Var::scalar("κ").default(2.0).desc("Elongation"))?;
        vars.input(Var::scalar("δ").default(0.5).desc("Triangularity"))?;
        vars.input(Var::scalar("ξ").default(0.0).desc("Related to the plasma squareness"))?;

        vars.output(Var::array("R", n).units("m").desc("Radial locations of plasma boundary"))?;
        vars.output(Var::array("Z", n).units("m").desc("Vertical locations of plasma boundary"))?;
        vars.output(Var::scalar("Z0").units("m").default(0.0).desc("Vertical location of magnetic axis"))?;
        vars.output(Var::scalar("b").units("m").desc("Minor radius height"))?;
        vars.output(Var::scalar("ε").desc("Inverse aspect ratio"))?;
        vars.output(Var::scalar("full_plasma_height").units("m").desc("Full plasma height"))?;
        vars.output(Var::scalar("R_min").units("m").desc("Inner radius of plasma at midplane"))?;
        vars.output(Var::scalar("R_max").units("m").desc("Outer radius of plasma at midplane"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(&["R"], &["R0", "a", "δ", "ξ"]);
        sparsity.declare_all(&["Z"], &["a", "κ", "ξ"]);
        sparsity.declare_all(&["b", "full_plasma_height"], &["a", "κ"]);
        sparsity.declare_all(&["ε", "R_min", "R_max"], &["R0", "a"]);
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let r0 = inputs.scalar("R0")?;
        let a = inputs.scalar("a")?;
        let kappa = inputs.scalar("κ")?;
        let delta = inputs.scalar("δ")?;
        let xi = inputs.scalar("ξ")?;

        for (i, &theta) in self.theta.iter().enumerate() {
            let (s1, s2) = (theta.sin(), (2.0 * theta).sin());
            let phi = theta + delta * s1 - xi * s2;
            let psi = theta + xi * s2;

            partials.set_entry("R", "R0", i, 0, 1.0)?;
            partials.set_entry("R", "a", i, 0, phi.cos())?;
            partials.set_entry("R", "δ", i, 0, -a * phi.sin() * s1)?;
            partials.set_entry("R", "ξ", i, 0, a * phi.sin() * s2)?;

            partials.set_entry("Z", "a", i, 0, kappa * psi.sin())?;
            partials.set_entry("Z", "κ", i, 0, a * psi.sin())?;
            partials.set_entry("Z", "ξ", i, 0, kappa * a * psi.cos() * s2)?;
        }

        partials.set("b", "a", kappa)?;
        partials.set("b", "κ", a)?;
        partials.set("full_plasma_height", "a", 2.0 * kappa)?;
        partials.set("full_plasma_height", "κ", 2.0 * a)?;
        partials.set("ε", "R0", -a / (r0 * r0))?;
        partials.set("ε", "a", 1.0 / r0)?;
        partials.set("R_min", "R0", 1.0)?;
        partials.set("R_min", "a", -1.0)?;
        partials.set("R_max", "R0", 1.0)?;
        partials.set("R_max", "a", 1.0)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}
