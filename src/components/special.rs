// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Modified Bessel and Struve functions of small integer order, and
//! fixed-order quadrature.
//!
//! Everything is evaluated on any [`DualNum`], so the formulas that use
//! them can be differentiated with dual numbers. The series converge for
//! every argument but are intended for the moderate range (|x| < 20) that
//! coil shape parameters occupy.

use num_dual::DualNum;
use std::f64::consts::PI;

const MAX_TERMS: usize = 200;
const TOLERANCE: f64 = 1e-17;

/// Sum `first * Π ratio(k)` until the terms stop contributing.
fn series<T: DualNum<f64> + Copy>(first: T, ratio: impl Fn(f64) -> f64, x_half_sq: T) -> T {
    let mut term = first;
    let mut sum = first;
    for k in 0..MAX_TERMS {
        term = term * x_half_sq * ratio(k as f64);
        sum = sum + term;
        if term.re().abs() <= TOLERANCE * sum.re().abs() {
            break;
        }
    }
    sum
}

/// I₀(x)
pub fn bessel_i0<T: DualNum<f64> + Copy>(x: T) -> T {
    let q = x * x * 0.25;
    series(T::from(1.0f64), |k| 1.0 / ((k + 1.0) * (k + 1.0)), q)
}

/// I₁(x)
pub fn bessel_i1<T: DualNum<f64> + Copy>(x: T) -> T {
    let q = x * x * 0.25;
    series(x * 0.5, |k| 1.0 / ((k + 1.0) * (k + 2.0)), q)
}

/// L₀(x)
pub fn struve_l0<T: DualNum<f64> + Copy>(x: T) -> T {
    let q = x * x * 0.25;
    // Γ(3/2)² = π/4
    series(x * (2.0 / PI), |k| 1.0 / ((k + 1.5) * (k + 1.5)), q)
}

/// L₁(x)
pub fn struve_l1<T: DualNum<f64> + Copy>(x: T) -> T {
    let q = x * x * 0.25;
    // Γ(3/2)·Γ(5/2) = 3π/8
    series(q * (8.0 / (3.0 * PI)), |k| 1.0 / ((k + 1.5) * (k + 2.5)), q)
}

/// L₋₁(x) = L₁(x) + 2/π
pub fn struve_l_minus1<T: DualNum<f64> + Copy>(x: T) -> T {
    struve_l1(x) + 2.0 / PI
}

/// Positive nodes and weights of 8-point Gauss-Legendre on [-1, 1].
const GAUSS_LEGENDRE_8: [(f64, f64); 4] = [
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
];

/// ∫ f(x) dx over [a, b] by 8-point Gauss-Legendre on `panels` equal
/// sub-intervals. The endpoints are never sampled.
pub fn integrate<T: DualNum<f64> + Copy>(f: impl Fn(f64) -> T, a: f64, b: f64, panels: usize) -> T {
    let h = (b - a) / panels as f64;
    let mut sum = T::from(0.0f64);
    for p in 0..panels {
        let mid = a + (p as f64 + 0.5) * h;
        for (node, weight) in GAUSS_LEGENDRE_8 {
            let offset = 0.5 * h * node;
            sum = sum + (f(mid - offset) + f(mid + offset)) * weight;
        }
    }
    sum * (0.5 * h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_dual::Dual64;

    #[test]
    fn test_bessel_reference_values() {
        let cases = [
            (1.0, 1.266_065_877_752_008_4, 0.565_159_103_992_485_1),
            (3.0, 4.880_792_585_865_024, 3.953_370_217_402_609),
        ];
        for (x, i0, i1) in cases {
            assert!((bessel_i0(x) - i0).abs() < 1e-12, "I0({})", x);
            assert!((bessel_i1(x) - i1).abs() < 1e-12, "I1({})", x);
        }
        assert_eq!(bessel_i0(0.0), 1.0);
        assert_eq!(bessel_i1(0.0), 0.0);
    }

    #[test]
    fn test_struve_reference_value() {
        assert!((struve_l0(1.0) - 0.710_243_185_937_890_9).abs() < 1e-9);
        assert!((struve_l_minus1(0.0) - 2.0 / PI).abs() < 1e-15);
    }

    #[test]
    fn test_derivative_identities() {
        // I0' = I1 and L0' = L1 + 2/π
        for x in [0.3, 1.0, 2.5] {
            let dx = Dual64::from(x).derivative();
            assert!((bessel_i0(dx).eps - bessel_i1(x)).abs() < 1e-12);
            assert!((struve_l0(dx).eps - struve_l_minus1(x)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_integrate_polynomials_and_parameters() {
        // exact for degree 15 on a single panel
        let poly: f64 = integrate(|x| x.powi(15) + 3.0 * x * x, 0.0, 2.0, 1);
        let exact = 2f64.powi(16) / 16.0 + 8.0;
        assert!((poly - exact).abs() < 1e-12 * exact);

        // d/dp ∫₀¹ e^(p x) dx = ((p - 1) e^p + 1) / p²
        let p = Dual64::from(1.5).derivative();
        let value = integrate(|x| (p * x).exp(), 0.0, 1.0, 8);
        let exact = ((1.5f64 - 1.0) * 1.5f64.exp() + 1.0) / 2.25;
        assert!((value.re - (1.5f64.exp() - 1.0) / 1.5).abs() < 1e-14);
        assert!((value.eps - exact).abs() < 1e-13);
    }
}
