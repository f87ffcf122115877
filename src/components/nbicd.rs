// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Neutral beam current drive.
//!
//! The efficiency It/P of a single beam follows Start et al. (1980), eq. 45,
//! as the product of three terms built from the fast-ion parameters β₁, α³
//! and G. [`current_drive_efficiency`] wires the pieces together for a plasma
//! of `n_species` ion species; [`NBICurrent`] sums the driven current over
//! the energy components of the beams.

use super::formulary::AverageIonMass;
use super::special::integrate;
use super::util::ExecComp;
use crate::config::consts::{ELECTRON_MASS_U, ELEMENTARY_CHARGE, KILO, MEGA};
use crate::config::ConfigAccessor;
use crate::errors::{AssemblyError, ConfigError, EvaluationError, ModelError};
use crate::jacobian::{Differentiation, Partials, Sparsity};
use crate::model::Group;
use crate::traits::Component;
use crate::variables::{DiscreteValues, Values, Var, VariableRegistry};
use num_dual::{Dual64, DualNum};
use std::f64::consts::PI;

fn estimate_setting(config: &impl ConfigAccessor, key: &str) -> Result<f64, ConfigError> {
    config.scalar(&["h_cd", "NBI", "current drive estimate", key])
}

/// Smallest α³ for which the efficiency integral is evaluated.
const MIN_ALPHA_CUBED: f64 = 1e-10;
/// Quadrature panels for the third efficiency term.
const TERM3_PANELS: usize = 32;

fn positive<T: DualNum<f64>>(owner: &str, name: &str, value: &T) -> Result<(), EvaluationError> {
    if value.re() <= 0.0 {
        return Err(EvaluationError::domain(owner, name, format!("must be positive, got {}", value.re())));
    }
    Ok(())
}

/// β₁ = Z_eff A_i / A_b
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDriveBeta1;

impl CurrentDriveBeta1 {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let z_eff = inputs.scalar("Z_eff")?;
        let ab = inputs.scalar("Ab")?;
        let ai = inputs.scalar("Ai")?;
        positive(inputs.owner(), "Ab", &ab)?;
        outputs.set_scalar("β1", ai / ab * z_eff);
        Ok(())
    }
}

impl Component for CurrentDriveBeta1 {
    fn name(&self) -> &'static str {
        "CurrentDriveBeta1"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("Z_eff").desc("Effective ion charge"))?;
        vars.input(Var::scalar("Ab").units("u").desc("Neutral beam ion mass"))?;
        vars.input(Var::scalar("Ai").units("u").desc("Averaged plasma ion mass"))?;
        vars.output(Var::scalar("β1").desc("Current drive variable β₁"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let z_eff = inputs.scalar("Z_eff")?;
        let ab = inputs.scalar("Ab")?;
        let ai = inputs.scalar("Ai")?;
        partials.set("β1", "Z_eff", ai / ab)?;
        partials.set("β1", "Ai", z_eff / ab)?;
        partials.set("β1", "Ab", -ai * z_eff / (ab * ab))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// A = 1 + 0.6 / ((1 + v_b / v_th,e) Z_eff)
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDriveA;

impl CurrentDriveA {
    const COEFFICIENT: f64 = 0.6;

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let vb = inputs.scalar("vb")?;
        let vth_e = inputs.scalar("vth_e")?;
        let z_eff = inputs.scalar("Z_eff")?;
        positive(inputs.owner(), "vth_e", &vth_e)?;
        positive(inputs.owner(), "Z_eff", &z_eff)?;
        let a = ((vb / vth_e + 1.0) * z_eff).recip() * Self::COEFFICIENT + 1.0;
        outputs.set_scalar("A", a);
        Ok(())
    }
}

impl Component for CurrentDriveA {
    fn name(&self) -> &'static str {
        "CurrentDriveA"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("Z_eff").desc("Effective ion charge"))?;
        vars.input(Var::scalar("vb").units("Mm/s").desc("Neutral beam ion initial velocity"))?;
        vars.input(Var::scalar("vth_e").units("Mm/s").desc("Electron thermal velocity"))?;
        vars.output(Var::scalar("A").desc("Current drive variable A"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let vb = inputs.scalar("vb")?;
        let vth_e = inputs.scalar("vth_e")?;
        let z_eff = inputs.scalar("Z_eff")?;
        let c = Self::COEFFICIENT;
        let sum = vth_e + vb;
        partials.set("A", "vb", -c * vth_e / (sum * sum * z_eff))?;
        partials.set("A", "vth_e", c * vb / (sum * sum * z_eff))?;
        partials.set("A", "Z_eff", -c * vth_e / (sum * z_eff * z_eff))
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// α³ = ¾√π A_e (v_e / v_0)³ Σ n_i Z_i² / (n_e A_i), with A_e the electron
/// mass in u (Start et al., eq. 44).
#[derive(Debug, Clone, Copy)]
pub struct CurrentDriveAlphaCubed {
    n_species: usize,
}

impl CurrentDriveAlphaCubed {
    pub fn new(n_species: usize) -> Self {
        Self { n_species }
    }

    fn coefficient() -> f64 {
        0.75 * PI.sqrt() * ELECTRON_MASS_U
    }

    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let v0 = inputs.scalar("v0")?;
        let ve = inputs.scalar("ve")?;
        let ne = inputs.scalar("ne")?;
        positive(inputs.owner(), "v0", &v0)?;
        positive(inputs.owner(), "ne", &ne)?;

        let ni = inputs.array("ni")?;
        let ai = inputs.array("Ai")?;
        let zi = inputs.array("Zi")?;
        let mut sum = T::from(0.0f64);
        for ((&n, &a), &z) in ni.iter().zip(ai).zip(zi) {
            positive(inputs.owner(), "Ai", &a)?;
            sum = sum + n * z * z / a;
        }
        outputs.set_scalar("α³", (ve / v0).powi(3) * sum / ne * Self::coefficient());
        Ok(())
    }
}

impl Component for CurrentDriveAlphaCubed {
    fn name(&self) -> &'static str {
        "CurrentDriveAlphaCubed"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("v0").units("Mm/s").desc("Neutral beam ion initial velocity"))?;
        vars.input(Var::scalar("ve").units("Mm/s").desc("Electron thermal velocity"))?;
        vars.input(Var::scalar("ne").units("n20").desc("Electron density"))?;
        vars.input(Var::array("ni", self.n_species).units("n20").desc("Ion field particle densities"))?;
        vars.input(Var::array("Ai", self.n_species).units("u").desc("Ion field particle atomic masses"))?;
        vars.input(Var::array("Zi", self.n_species).desc("Ion field particle charges"))?;
        vars.output(Var::scalar("α³").lower(1e-6).desc("Current drive variable α³"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let v0 = inputs.scalar("v0")?;
        let ve = inputs.scalar("ve")?;
        let ne = inputs.scalar("ne")?;
        let ni = inputs.array("ni")?;
        let ai = inputs.array("Ai")?;
        let zi = inputs.array("Zi")?;

        let c = Self::coefficient();
        let v_ratio = (ve / v0).powi(3);
        let sum: f64 = ni.iter().zip(ai).zip(zi).map(|((n, a), z)| n * z * z / a).sum();
        let scale = c * v_ratio / ne;

        partials.set("α³", "ve", c * 3.0 * ve * ve / v0.powi(3) * sum / ne)?;
        partials.set("α³", "v0", -c * 3.0 * ve.powi(3) / v0.powi(4) * sum / ne)?;
        partials.set("α³", "ne", -c * v_ratio * sum / (ne * ne))?;

        let species = || ni.iter().zip(ai).zip(zi);
        let d_ni: Vec<f64> = species().map(|((_, a), z)| scale * z * z / a).collect();
        let d_zi: Vec<f64> = species().map(|((n, a), z)| scale * 2.0 * n * z / a).collect();
        let d_ai: Vec<f64> = species().map(|((n, a), z)| -scale * n * z * z / (a * a)).collect();
        partials.set_values("α³", "ni", &d_ni)?;
        partials.set_values("α³", "Zi", &d_zi)?;
        partials.set_values("α³", "Ai", &d_ai)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }
}

/// Upper estimate of the trapped particle fraction (Lin-Liu and Miller),
/// f_t,u = 1 - (1 - ε)² / (√(1 - ε²) (1 + 1.46 √ε)).
#[derive(Debug, Clone, Copy, Default)]
pub struct TrappedParticleFraction;

impl TrappedParticleFraction {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let eps = inputs.scalar("ε")?;
        if eps.re() <= 0.0 || eps.re() >= 1.0 {
            return Err(EvaluationError::domain(
                inputs.owner(),
                "ε",
                format!("inverse aspect ratio must lie in (0, 1), got {}", eps.re()),
            ));
        }
        let one_minus = -eps + 1.0;
        let passing = one_minus * one_minus / ((-(eps * eps) + 1.0).sqrt() * (eps.sqrt() * 1.46 + 1.0));
        outputs.set_scalar("ftrap_u", -passing + 1.0);
        Ok(())
    }
}

impl Component for TrappedParticleFraction {
    fn name(&self) -> &'static str {
        "TrappedParticleFraction"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("ε").default(0.3).desc("Inverse aspect ratio of the flux surface"))?;
        vars.output(Var::scalar("ftrap_u").lower(0.0).upper(1.0).desc("Trapped particle fraction, upper estimate"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

/// G = 1 + (f_trap,u A - 1) Z_b / Z_eff
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDriveG;

impl CurrentDriveG {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let ftrap = inputs.scalar("ftrap_u")?;
        let a = inputs.scalar("A")?;
        let zb = inputs.scalar("Zb")?;
        let z_eff = inputs.scalar("Z_eff")?;
        positive(inputs.owner(), "Z_eff", &z_eff)?;
        outputs.set_scalar("G", (ftrap * a - 1.0) * zb / z_eff + 1.0);
        Ok(())
    }
}

impl Component for CurrentDriveG {
    fn name(&self) -> &'static str {
        "CurrentDriveG"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("ftrap_u").desc("Trapped particle fraction"))?;
        vars.input(Var::scalar("A").desc("Current drive variable A"))?;
        vars.input(Var::scalar("Zb").desc("Neutral beam ion charge"))?;
        vars.input(Var::scalar("Z_eff").desc("Effective ion charge"))?;
        vars.output(Var::scalar("G").lower(0.0).desc("Current drive variable G"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

/// The three factors of Start et al., eq. 45:
///
/// ```text
/// term1 = τs v0 Zb G / (2π R (1 + α³) E_NBI)
/// term2 = 1 + (3 - 2 α³ β1) T_e / (2 E_NBI (1 + α³)²)
/// term3 = ∫₀¹ x^(3+β1) ((1 + α³) / (x³ + α³))^(1 + β1/3) dx
/// ```
///
/// The integral is evaluated by quadrature rather than through its
/// hypergeometric closed form, which keeps it differentiable in β1.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDriveEfficiencyTerms;

impl CurrentDriveEfficiencyTerms {
    fn formula<T: DualNum<f64> + Copy>(&self, inputs: &Values<T>, outputs: &mut Values<T>) -> Result<(), EvaluationError> {
        let tau_s = inputs.scalar("τs")?;
        let v0 = inputs.scalar("v0")?;
        let zb = inputs.scalar("Zb")?;
        let g = inputs.scalar("G")?;
        let r = inputs.scalar("R")?;
        let alpha3 = inputs.scalar("α³")?;
        let e_nbi = inputs.scalar("E_NBI")?;
        let beta1 = inputs.scalar("β1")?;
        let te = inputs.scalar("<T_e>")?;
        positive(inputs.owner(), "R", &r)?;
        positive(inputs.owner(), "E_NBI", &e_nbi)?;
        if alpha3.re() < MIN_ALPHA_CUBED {
            return Err(EvaluationError::domain(
                inputs.owner(),
                "α³",
                format!("current drive α³ is too small: {:e}", alpha3.re()),
            ));
        }

        let one_plus = alpha3 + 1.0;
        let term1 = tau_s * v0 * zb * g * MEGA / (r * one_plus * e_nbi * (2.0 * PI * KILO));
        let term2 = (-(alpha3 * beta1 * 2.0) + 3.0) * te / (e_nbi * one_plus * one_plus * 2.0) + 1.0;

        let power = beta1 / 3.0 + 1.0;
        let log_one_plus = one_plus.ln();
        let term3 = integrate(
            |x: f64| ((beta1 + 3.0) * x.ln() + power * (log_one_plus - (alpha3 + x.powi(3)).ln())).exp(),
            0.0,
            1.0,
            TERM3_PANELS,
        );

        outputs.set_scalar("term1", term1);
        outputs.set_scalar("term2", term2);
        outputs.set_scalar("term3", term3);
        Ok(())
    }
}

impl Component for CurrentDriveEfficiencyTerms {
    fn name(&self) -> &'static str {
        "CurrentDriveEfficiencyTerms"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("τs").units("s").desc("Slowing time of beam ions on electrons"))?;
        vars.input(Var::scalar("v0").units("Mm/s").desc("Beam ion initial velocity"))?;
        vars.input(Var::scalar("Zb").desc("Beam ion charge"))?;
        vars.input(Var::scalar("G").desc("Current drive variable G"))?;
        vars.input(Var::scalar("R").units("m").desc("Major radius"))?;
        vars.input(Var::scalar("α³").desc("Current drive variable α³"))?;
        vars.input(Var::scalar("E_NBI").units("keV").desc("Beam ion initial energy"))?;
        vars.input(Var::scalar("β1").desc("Current drive variable β₁"))?;
        vars.input(Var::scalar("<T_e>").units("keV").desc("Electron temperature"))?;
        vars.output(Var::scalar("term1").units("A/W").desc("Line 1 of the efficiency equation"))?;
        vars.output(Var::scalar("term2").desc("Line 2 of the efficiency equation"))?;
        vars.output(Var::scalar("term3").lower(0.0).desc("Line 3 of the efficiency equation"))
    }

    fn declare_partials(&self, _vars: &VariableRegistry, sparsity: &mut Sparsity) {
        sparsity.declare_all(&["term1"], &["τs", "v0", "Zb", "G", "R", "α³", "E_NBI"]);
        sparsity.declare_all(&["term2"], &["α³", "β1", "<T_e>", "E_NBI"]);
        sparsity.declare_all(&["term3"], &["α³", "β1"]);
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn compute_dual(&self, inputs: &Values<Dual64>, _discrete: &DiscreteValues, outputs: &mut Values<Dual64>) -> Result<(), EvaluationError> {
        self.formula(inputs, outputs)
    }

    fn differentiation(&self) -> Differentiation {
        Differentiation::Dual
    }
}

/// It/P = term1 · term2 · term3
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentDriveEfficiencyEquation;

impl Component for CurrentDriveEfficiencyEquation {
    fn name(&self) -> &'static str {
        "CurrentDriveEfficiencyEquation"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::scalar("term1").units("A/W").desc("Line 1 of the efficiency equation"))?;
        vars.input(Var::scalar("term2").desc("Line 2 of the efficiency equation"))?;
        vars.input(Var::scalar("term3").desc("Line 3 of the efficiency equation"))?;
        vars.output(Var::scalar("It/P").units("A/W").desc("Neutral beam current drive efficiency"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let product = inputs.scalar("term1")? * inputs.scalar("term2")? * inputs.scalar("term3")?;
        outputs.set_scalar("It/P", product);
        Ok(())
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let t1 = inputs.scalar("term1")?;
        let t2 = inputs.scalar("term2")?;
        let t3 = inputs.scalar("term3")?;
        partials.set("It/P", "term1", t2 * t3)?;
        partials.set("It/P", "term2", t1 * t3)?;
        partials.set("It/P", "term3", t1 * t2)
    }
}

/// Current drive settings read from the constants tree: the evaluation
/// flux surface as a fraction of the edge inverse aspect ratio.
pub fn current_drive_properties(config: &impl ConfigAccessor) -> Result<Group, ModelError> {
    let fraction = estimate_setting(config, "ε fraction")?;
    let mut group = Group::new();
    group.add_subsystem(
        "ivc",
        ExecComp::new(&[], &["ε fraction"], move |_| vec![Dual64::from(fraction)]),
    )?;
    group.promotes("ivc", &["*"]);
    Ok(group)
}

/// NBI current drive efficiency of one beam in a plasma of `n_species`
/// ion species.
///
/// Promoted inputs: `Ab`, `Zb`, `vb`, `Eb`, `R0`, `ε`, `Z_eff`, `ne`,
/// `<T_e>`, `vth_e`, `τs`, `ni`, `Ai`, `Zi`. Promoted outputs include
/// `ftrap_u`, `A_bar` and `It/P`.
pub fn current_drive_efficiency(config: &impl ConfigAccessor, n_species: usize) -> Result<Group, ModelError> {
    let mut group = Group::new();

    group.add_group("props", current_drive_properties(config)?)?;
    group.promote("props.ε fraction", "ε fraction");

    group.add_subsystem("eps_neo", ExecComp::new(&["eps_frac", "eps"], &["eps_neo"], |x| vec![x[0] * x[1]]))?;
    group.promote("eps_neo.eps_frac", "ε fraction");
    group.promote("eps_neo.eps", "ε");
    group.promote("eps_neo.eps_neo", "ε_neoclass");

    group.add_subsystem("A_bar", AverageIonMass::new(n_species))?;
    group.promotes("A_bar", &["ni", "Ai", "A_bar"]);

    group.add_subsystem("beta1", CurrentDriveBeta1)?;
    group.promotes("beta1", &["Z_eff", "Ab"]);
    group.promote("beta1.Ai", "A_bar");

    group.add_subsystem("A", CurrentDriveA)?;
    group.promotes("A", &["Z_eff", "vb", "vth_e"]);

    group.add_subsystem("ftrapped", TrappedParticleFraction)?;
    group.promote("ftrapped.ε", "ε_neoclass");
    group.promote("ftrapped.ftrap_u", "ftrap_u");

    group.add_subsystem("G", CurrentDriveG)?;
    group.promotes("G", &["ftrap_u", "Zb", "Z_eff"]);
    group.connect("A.A", "G.A");

    group.add_subsystem("alphacubed", CurrentDriveAlphaCubed::new(n_species))?;
    group.promote("alphacubed.v0", "vb");
    group.promote("alphacubed.ve", "vth_e");
    group.promotes("alphacubed", &["ne", "ni", "Ai", "Zi"]);

    group.add_subsystem("threelines", CurrentDriveEfficiencyTerms)?;
    group.promotes("threelines", &["τs", "Zb", "<T_e>", "term1", "term2", "term3"]);
    group.promote("threelines.v0", "vb");
    group.promote("threelines.R", "R0");
    group.promote("threelines.E_NBI", "Eb");
    group.connect("beta1.β1", "threelines.β1");
    group.connect("G.G", "threelines.G");
    group.connect("alphacubed.α³", "threelines.α³");

    group.add_subsystem("eff", CurrentDriveEfficiencyEquation)?;
    group.promotes("eff", &["*"]);

    Ok(group)
}

/// Current driven by a beam with several energy components,
/// I_NBI = fudge Σ S E_b (It/P).
#[derive(Debug, Clone, Copy)]
pub struct NBICurrent {
    n_sources: usize,
    fudge: f64,
}

impl NBICurrent {
    pub fn new(config: &impl ConfigAccessor, n_sources: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            n_sources,
            fudge: estimate_setting(config, "fudge factor")?,
        })
    }

    /// Without a constants tree the fudge factor defaults to one.
    pub fn unadjusted(n_sources: usize) -> Self {
        Self { n_sources, fudge: 1.0 }
    }

    /// keV · A/W · 1/s to MA
    fn scale() -> f64 {
        KILO * ELEMENTARY_CHARGE / MEGA
    }
}

impl Component for NBICurrent {
    fn name(&self) -> &'static str {
        "NBICurrent"
    }

    fn declare(&self, vars: &mut VariableRegistry) -> Result<(), AssemblyError> {
        vars.input(Var::array("S", self.n_sources).units("1/s").desc("Neutral beam source rates"))?;
        vars.input(Var::array("Eb", self.n_sources).units("keV").desc("Neutral beam initial energies"))?;
        vars.input(Var::array("It/P", self.n_sources).units("A/W").desc("Current drive efficiency of each source"))?;
        vars.input(Var::scalar("fudge").default(self.fudge).desc("Overall multiplier"))?;
        vars.output(Var::scalar("I_NBI").units("MA").desc("Neutral-beam-driven current"))
    }

    fn compute(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, outputs: &mut Values<f64>) -> Result<(), EvaluationError> {
        let s = inputs.array("S")?;
        let eb = inputs.array("Eb")?;
        let eff = inputs.array("It/P")?;
        let total: f64 = s.iter().zip(eb).zip(eff).map(|((s, e), k)| s * e * k).sum();
        outputs.set_scalar("I_NBI", inputs.scalar("fudge")? * Self::scale() * total);
        Ok(())
    }

    fn compute_partials(&self, inputs: &Values<f64>, _discrete: &DiscreteValues, partials: &mut Partials) -> Result<(), EvaluationError> {
        let s = inputs.array("S")?;
        let eb = inputs.array("Eb")?;
        let eff = inputs.array("It/P")?;
        let factor = inputs.scalar("fudge")? * Self::scale();
        let sources = || s.iter().zip(eb).zip(eff);

        let d_s: Vec<f64> = sources().map(|((_, e), k)| factor * e * k).collect();
        let d_eb: Vec<f64> = sources().map(|((s, _), k)| factor * s * k).collect();
        let d_eff: Vec<f64> = sources().map(|((s, e), _)| factor * s * e).collect();
        let total: f64 = sources().map(|((s, e), k)| s * e * k).sum();
        partials.set_values("I_NBI", "S", &d_s)?;
        partials.set_values("I_NBI", "Eb", &d_eb)?;
        partials.set_values("I_NBI", "It/P", &d_eff)?;
        partials.set("I_NBI", "fudge", Self::scale() * total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Problem;
    use crate::jacobian::CheckOptions;

    fn assert_partials(problem: &mut Problem, options: &[CheckOptions]) {
        for options in options {
            let report = problem.check_partials(options).unwrap();
            assert!(report.passed(), "{}", report.to_json().unwrap());
        }
    }

    /// A three-species D-T-C plasma with a 500 keV deuterium beam.
    fn beam_problem() -> Problem {
        let config = Config::builtin().unwrap();
        let mut problem = Problem::new(current_drive_efficiency(&config, 3).unwrap()).unwrap();
        problem
            .set_inputs(&[
                ("Ab", vec![2.0]),
                ("Zb", vec![1.0]),
                ("vb", vec![6.922]),
                ("Eb", vec![500.0]),
                ("R0", vec![3.0]),
                ("ε", vec![1.0 / 1.6]),
                ("Z_eff", vec![2.0]),
                ("ne", vec![1.06]),
                ("<T_e>", vec![9.2]),
                ("vth_e", vec![56.922]),
                ("τs", vec![0.599]),
                ("ni", vec![0.424, 0.424, 0.0353]),
                ("Ai", vec![2.0, 3.0, 12.0]),
                ("Zi", vec![1.0, 1.0, 6.0]),
            ])
            .unwrap();
        problem
    }

    #[test]
    fn test_beam_efficiency_reference_values() {
        let mut problem = beam_problem();
        problem.run().unwrap();

        let close = |name: &str, expected: f64| {
            let value = problem.get_scalar(name).unwrap();
            assert!((value - expected).abs() < 1e-9 * expected, "{}: {} vs {}", name, value, expected);
        };
        close("ε fraction", 0.5);
        close("A_bar", 2.879_655_836_069_286);
        close("ftrap_u", 0.726_029_286_503_121);
        close("alphacubed.α³", 0.175_690_914_874_169_24);
        close("term1", 0.359_265_760_079_350_24);
        close("term2", 1.013_232_708_388_565_5);
        // hypergeometric closed form of the same integral
        close("term3", 0.357_923_980_498_822_74);
        close("It/P", 0.130_291_422_638_630_75);
    }

    #[test]
    fn test_group_partials_and_totals() {
        let mut problem = beam_problem();
        assert_partials(&mut problem, &[CheckOptions::finite_difference()]);

        let totals = problem
            .check_totals(&["It/P"], &["vb", "Z_eff", "ni", "<T_e>"], &CheckOptions::finite_difference())
            .unwrap();
        assert!(totals.passed(), "{}", totals.to_json().unwrap());
    }

    #[test]
    fn test_component_partials() {
        let both = [CheckOptions::finite_difference(), CheckOptions::dual()];

        let mut beta1 = Problem::from_component("beta1", CurrentDriveBeta1).unwrap();
        beta1
            .set_inputs(&[("Z_eff", vec![1.7]), ("Ab", vec![2.0]), ("Ai", vec![2.5])])
            .unwrap();
        assert_partials(&mut beta1, &both);

        let mut a = Problem::from_component("A", CurrentDriveA).unwrap();
        a.set_inputs(&[("Z_eff", vec![1.7]), ("vb", vec![7.0]), ("vth_e", vec![50.0])])
            .unwrap();
        assert_partials(&mut a, &both);

        let mut alpha = Problem::from_component("alpha", CurrentDriveAlphaCubed::new(2)).unwrap();
        alpha
            .set_inputs(&[
                ("v0", vec![7.0]),
                ("ve", vec![55.0]),
                ("ne", vec![1.1]),
                ("ni", vec![0.5, 0.4]),
                ("Ai", vec![2.0, 3.0]),
                ("Zi", vec![1.0, 2.0]),
            ])
            .unwrap();
        assert_partials(&mut alpha, &both);

        let mut current = Problem::from_component("nbi", NBICurrent::unadjusted(2)).unwrap();
        current
            .set_inputs(&[
                ("S", vec![1.0e20, 2.0e20]),
                ("Eb", vec![500.0, 250.0]),
                ("It/P", vec![0.13, 0.1]),
            ])
            .unwrap();
        assert_partials(&mut current, &[CheckOptions::dual()]);
    }

    #[test]
    fn test_term3_limits() {
        let mut problem = Problem::from_component("terms", CurrentDriveEfficiencyTerms).unwrap();
        // a large α³ flattens the bracket to one, leaving ∫ x^(3+β1) dx
        problem.set_inputs(&[("α³", vec![1.0e8]), ("β1", vec![2.0])]).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("term3").unwrap() - 1.0 / 6.0).abs() < 1e-7);

        problem.set_scalar("α³", 1.0e-12).unwrap();
        let err = problem.run().unwrap_err();
        assert!(matches!(err, EvaluationError::Domain { ref variable, .. } if variable == "α³"));
    }

    #[test]
    fn test_trapped_fraction() {
        let mut problem = Problem::from_component("ft", TrappedParticleFraction).unwrap();
        problem.set_scalar("ε", 0.3).unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("ftrap_u").unwrap() - 0.714_582_027_953_133_6).abs() < 1e-12);
        assert_partials(&mut problem, &[CheckOptions::finite_difference()]);

        problem.set_scalar("ε", 1.0).unwrap();
        assert!(problem.run().is_err());
    }

    #[test]
    fn test_driven_current_uses_fudge_factor() {
        let overrides = Config::from_yaml_str("h_cd:\n  NBI:\n    current drive estimate:\n      fudge factor: 0.5\n").unwrap();
        let config = Config::builtin().unwrap().merged(overrides);

        let mut problem = Problem::from_component("nbi", NBICurrent::new(&config, 2).unwrap()).unwrap();
        problem
            .set_inputs(&[
                ("S", vec![1.0e20, 2.0e20]),
                ("Eb", vec![500.0, 250.0]),
                ("It/P", vec![0.130_291_422_638_630_75, 0.8 * 0.130_291_422_638_630_75]),
            ])
            .unwrap();
        problem.run().unwrap();
        assert!((problem.get_scalar("I_NBI").unwrap() - 0.5 * 1.878_748_856_660_095).abs() < 1e-9);
    }
}
