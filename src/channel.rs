// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Noisy quantum channels in Kraus form and the channel composer.
//!
//! A channel is an ordered list of Kraus operators {Eᵢ} with
//! Σ Eᵢ†Eᵢ = I. Measuring O after the channel is equivalent to measuring
//! the effective observable
//!
//!   OO = Σᵢ Eᵢ† O Eᵢ
//!
//! on the input state, which is what the verifier works with.
//!
//! Ref: Nielsen & Chuang, "Quantum Computation and Quantum Information" (2010), §8.3.

use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::{c, dagger, identity, kron};

/// A quantum channel given by its Kraus operators.
#[derive(Debug, Clone, PartialEq)]
pub struct KrausChannel {
    /// Kraus operators (each d × d), applied as ρ ↦ Σ Eᵢ ρ Eᵢ†.
    pub operators: Vec<Array2<Complex64>>,
}

impl KrausChannel {
    pub fn new(operators: Vec<Array2<Complex64>>) -> Self {
        Self { operators }
    }

    /// Noiseless channel on a d-dimensional system.
    pub fn identity(d: usize) -> Self {
        Self::new(vec![identity(d)])
    }

    /// Bit flip: X applied with probability p.
    ///
    /// E₀ = √(1−p)·I, E₁ = √p·X
    pub fn bit_flip(p: f64) -> Result<Self, String> {
        check_probability("p", p)?;
        Ok(Self::new(vec![
            identity(2) * c((1.0 - p).sqrt()),
            pauli_x() * c(p.sqrt()),
        ]))
    }

    /// Phase flip: Z applied with probability p.
    pub fn phase_flip(p: f64) -> Result<Self, String> {
        check_probability("p", p)?;
        Ok(Self::new(vec![
            identity(2) * c((1.0 - p).sqrt()),
            pauli_z() * c(p.sqrt()),
        ]))
    }

    /// Depolarizing channel: ρ ↦ (1−p)ρ + p·I/2.
    ///
    /// E₀ = √(1−3p/4)·I, E₁,₂,₃ = √(p/4)·{X, Y, Z}
    pub fn depolarizing(p: f64) -> Result<Self, String> {
        check_probability("p", p)?;
        let k = c((p / 4.0).sqrt());
        Ok(Self::new(vec![
            identity(2) * c((1.0 - 3.0 * p / 4.0).sqrt()),
            pauli_x() * k,
            pauli_y() * k,
            pauli_z() * k,
        ]))
    }

    /// Amplitude damping with decay probability γ.
    ///
    /// E₀ = |0⟩⟨0| + √(1−γ)|1⟩⟨1|, E₁ = √γ|0⟩⟨1|
    pub fn amplitude_damping(gamma: f64) -> Result<Self, String> {
        check_probability("gamma", gamma)?;
        let mut e0 = Array2::zeros((2, 2));
        e0[[0, 0]] = c(1.0);
        e0[[1, 1]] = c((1.0 - gamma).sqrt());
        let mut e1 = Array2::zeros((2, 2));
        e1[[0, 1]] = c(gamma.sqrt());
        Ok(Self::new(vec![e0, e1]))
    }

    /// Hilbert-space dimension (0 for an empty channel).
    pub fn dim(&self) -> usize {
        self.operators.first().map(|e| e.nrows()).unwrap_or(0)
    }

    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    /// Embed a single-qubit channel acting on `target` into an n-qubit register.
    ///
    /// Qubit 0 is the most significant tensor factor.
    pub fn on_qubit(&self, num_qubits: usize, target: usize) -> Result<Self, String> {
        if self.dim() != 2 {
            return Err(format!(
                "on_qubit requires a single-qubit channel, got dimension {}",
                self.dim()
            ));
        }
        if target >= num_qubits {
            return Err(format!(
                "target qubit {target} out of range for {num_qubits} qubits"
            ));
        }
        let left = identity(1 << target);
        let right = identity(1 << (num_qubits - target - 1));
        let operators = self
            .operators
            .iter()
            .map(|e| kron(&kron(&left, e), &right))
            .collect();
        Ok(Self::new(operators))
    }

    /// Sequential composition: apply `self`, then `next`.
    ///
    /// Kraus operators of the composite are all products Fⱼ·Eᵢ.
    pub fn then(&self, next: &KrausChannel) -> Result<Self, String> {
        if self.dim() != next.dim() {
            return Err(format!(
                "cannot compose channels of dimension {} and {}",
                self.dim(),
                next.dim()
            ));
        }
        let mut operators = Vec::with_capacity(self.operators.len() * next.operators.len());
        for f in &next.operators {
            for e in &self.operators {
                operators.push(f.dot(e));
            }
        }
        Ok(Self::new(operators))
    }

    /// Apply the channel to a density matrix: Σ Eᵢ ρ Eᵢ†.
    pub fn apply(&self, rho: &Array2<Complex64>) -> Array2<Complex64> {
        let d = rho.nrows();
        let mut out = Array2::zeros((d, d));
        for e in &self.operators {
            out = out + e.dot(rho).dot(&dagger(e));
        }
        out
    }

    /// max |Σ Eᵢ†Eᵢ − I|, zero for a trace-preserving channel.
    pub fn completeness_deviation(&self) -> f64 {
        let d = self.dim();
        let mut sum = Array2::<Complex64>::zeros((d, d));
        for e in &self.operators {
            sum = sum + dagger(e).dot(e);
        }
        let eye = identity(d);
        sum.iter()
            .zip(eye.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max)
    }

    /// Effective observable of measuring `observable` after this channel.
    pub fn effective_observable(&self, observable: &Array2<Complex64>) -> Array2<Complex64> {
        effective_observable(&self.operators, observable)
    }
}

/// OO = Σᵢ Eᵢ† O Eᵢ, accumulated term by term in Kraus order.
pub fn effective_observable(
    kraus: &[Array2<Complex64>],
    observable: &Array2<Complex64>,
) -> Array2<Complex64> {
    let d = observable.nrows();
    let mut oo = Array2::zeros((d, d));
    for e in kraus {
        oo = oo + dagger(e).dot(observable).dot(e);
    }
    oo
}

/// Pauli X.
pub fn pauli_x() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = c(1.0);
    m[[1, 0]] = c(1.0);
    m
}

/// Pauli Y.
pub fn pauli_y() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 1]] = Complex64::new(0.0, -1.0);
    m[[1, 0]] = Complex64::new(0.0, 1.0);
    m
}

/// Pauli Z.
pub fn pauli_z() -> Array2<Complex64> {
    let mut m = Array2::zeros((2, 2));
    m[[0, 0]] = c(1.0);
    m[[1, 1]] = c(-1.0);
    m
}

fn check_probability(name: &str, p: f64) -> Result<(), String> {
    if !(0.0..=1.0).contains(&p) {
        return Err(format!("{name} must be in [0, 1], got {p}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::hermiticity_deviation;
    use crate::test_utils::{projector_zero, random_hermitian_unit_spectrum, random_kraus_channel};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_standard_channels_are_trace_preserving() {
        let channels = [
            KrausChannel::identity(2),
            KrausChannel::bit_flip(0.1).unwrap(),
            KrausChannel::phase_flip(0.3).unwrap(),
            KrausChannel::depolarizing(0.25).unwrap(),
            KrausChannel::amplitude_damping(0.4).unwrap(),
        ];
        for ch in &channels {
            assert!(ch.completeness_deviation() < 1e-12);
        }
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        assert!(KrausChannel::bit_flip(-0.1).is_err());
        assert!(KrausChannel::depolarizing(1.5).is_err());
        let err = KrausChannel::amplitude_damping(2.0).unwrap_err();
        assert!(err.contains("gamma must be in [0, 1]"));
    }

    #[test]
    fn test_identity_channel_leaves_observable_unchanged() {
        let o = projector_zero();
        let oo = KrausChannel::identity(2).effective_observable(&o);
        assert_eq!(oo, o);
    }

    #[test]
    fn test_depolarizing_shrinks_projector_towards_half() {
        // OO = (1−p)·|0⟩⟨0| + (p/2)·I
        let p = 0.2;
        let oo = KrausChannel::depolarizing(p)
            .unwrap()
            .effective_observable(&projector_zero());
        assert_relative_eq!(oo[[0, 0]].re, 1.0 - p / 2.0, epsilon = 1e-12);
        assert_relative_eq!(oo[[1, 1]].re, p / 2.0, epsilon = 1e-12);
        assert_relative_eq!(oo[[0, 1]].norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_amplitude_damping_effective_observable() {
        // Measuring |0⟩⟨0| after damping: ⟨1|OO|1⟩ = γ
        let gamma = 0.3;
        let oo = KrausChannel::amplitude_damping(gamma)
            .unwrap()
            .effective_observable(&projector_zero());
        assert_relative_eq!(oo[[0, 0]].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(oo[[1, 1]].re, gamma, epsilon = 1e-12);
    }

    #[test]
    fn test_heisenberg_picture_matches_schrodinger() {
        // tr(OO·ρ) = tr(O·N(ρ))
        let ch = KrausChannel::amplitude_damping(0.35)
            .unwrap()
            .then(&KrausChannel::depolarizing(0.1).unwrap())
            .unwrap();
        let o = projector_zero();
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(0.4);
        rho[[1, 1]] = c(0.6);
        rho[[0, 1]] = Complex64::new(0.2, 0.1);
        rho[[1, 0]] = Complex64::new(0.2, -0.1);

        let lhs = crate::linalg::expectation(&ch.effective_observable(&o), &rho);
        let rhs = crate::linalg::expectation(&o, &ch.apply(&rho));
        assert_relative_eq!(lhs, rhs, epsilon = 1e-12);
    }

    #[test]
    fn test_on_qubit_embedding() {
        let ch = KrausChannel::bit_flip(0.2).unwrap().on_qubit(3, 1).unwrap();
        assert_eq!(ch.dim(), 8);
        assert_eq!(ch.num_operators(), 2);
        assert!(ch.completeness_deviation() < 1e-12);
        assert!(KrausChannel::bit_flip(0.2).unwrap().on_qubit(2, 2).is_err());
    }

    #[test]
    fn test_composition_dimension_mismatch() {
        let a = KrausChannel::identity(2);
        let b = KrausChannel::identity(4);
        assert!(a.then(&b).is_err());
    }

    proptest! {
        #[test]
        fn prop_random_channels_are_complete(seed in 0u64..500, k in 1usize..4) {
            let ch = random_kraus_channel(4, k, seed);
            prop_assert!(ch.completeness_deviation() < 1e-9);
        }

        #[test]
        fn prop_effective_observable_is_hermitian(seed in 0u64..500, k in 1usize..4) {
            let ch = random_kraus_channel(4, k, seed);
            let o = random_hermitian_unit_spectrum(4, seed.wrapping_add(17));
            let oo = ch.effective_observable(&o);
            prop_assert!(hermiticity_deviation(&oo) < 1e-10);
        }
    }
}
