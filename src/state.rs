// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quantum states and labelled datasets.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::linalg::{expectation, trace, vector_expectation};

/// Whether a dataset holds density matrices or state vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateMode {
    /// Density matrices (d × d)
    Mixed,
    /// State vectors (length d)
    Pure,
}

impl std::fmt::Display for StateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateMode::Mixed => write!(f, "mixed"),
            StateMode::Pure => write!(f, "pure"),
        }
    }
}

impl std::str::FromStr for StateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mixed" => Ok(StateMode::Mixed),
            "pure" => Ok(StateMode::Pure),
            other => Err(format!("unknown state mode '{other}' (expected mixed or pure)")),
        }
    }
}

/// A quantum state, either mixed or pure.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantumState {
    /// Hermitian, PSD, unit-trace density matrix
    Mixed(Array2<Complex64>),
    /// Unit-norm state vector
    Pure(Array1<Complex64>),
}

impl QuantumState {
    /// Hilbert-space dimension.
    pub fn dim(&self) -> usize {
        match self {
            QuantumState::Mixed(rho) => rho.nrows(),
            QuantumState::Pure(psi) => psi.len(),
        }
    }

    pub fn mode(&self) -> StateMode {
        match self {
            QuantumState::Mixed(_) => StateMode::Mixed,
            QuantumState::Pure(_) => StateMode::Pure,
        }
    }

    /// Re tr(A·ρ) or Re ⟨ψ|A|ψ⟩.
    pub fn expectation(&self, observable: &Array2<Complex64>) -> f64 {
        match self {
            QuantumState::Mixed(rho) => expectation(observable, rho),
            QuantumState::Pure(psi) => vector_expectation(observable, psi),
        }
    }

    /// tr(ρ) for mixed states, ⟨ψ|ψ⟩ for pure states.
    pub fn norm(&self) -> f64 {
        match self {
            QuantumState::Mixed(rho) => trace(rho).re,
            QuantumState::Pure(psi) => psi.iter().map(|z| z.norm_sqr()).sum(),
        }
    }

    /// Density matrix of the state (|ψ⟩⟨ψ| for pure states).
    pub fn density_matrix(&self) -> Array2<Complex64> {
        match self {
            QuantumState::Mixed(rho) => rho.clone(),
            QuantumState::Pure(psi) => {
                let d = psi.len();
                Array2::from_shape_fn((d, d), |(i, j)| psi[i] * psi[j].conj())
            }
        }
    }

    /// Whether any entry is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        let bad = |z: &Complex64| !z.re.is_finite() || !z.im.is_finite();
        match self {
            QuantumState::Mixed(rho) => rho.iter().any(bad),
            QuantumState::Pure(psi) => psi.iter().any(bad),
        }
    }
}

/// Ordered sequence of labelled states.
///
/// Labels are the ground-truth binary targets (0 or 1). A prediction is
/// label 1 iff the observable's expectation exceeds 0.5.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub states: Vec<QuantumState>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn new(states: Vec<QuantumState>, labels: Vec<u8>) -> Self {
        Self { states, labels }
    }

    /// Dataset of density matrices.
    pub fn mixed(states: Vec<Array2<Complex64>>, labels: Vec<u8>) -> Self {
        Self::new(states.into_iter().map(QuantumState::Mixed).collect(), labels)
    }

    /// Dataset of state vectors.
    pub fn pure(states: Vec<Array1<Complex64>>, labels: Vec<u8>) -> Self {
        Self::new(states.into_iter().map(QuantumState::Pure).collect(), labels)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Mode of the first state, if any.
    pub fn mode(&self) -> Option<StateMode> {
        self.states.first().map(QuantumState::mode)
    }

    /// Dimension of the first state, if any.
    pub fn dim(&self) -> Option<usize> {
        self.states.first().map(QuantumState::dim)
    }

    /// Entries selected by a boolean mask, keeping their dataset indices.
    pub fn select(&self, mask: &[bool]) -> Vec<(usize, &QuantumState, u8)> {
        self.states
            .iter()
            .zip(self.labels.iter())
            .enumerate()
            .filter(|(i, _)| mask.get(*i).copied().unwrap_or(false))
            .map(|(i, (s, &l))| (i, s, l))
            .collect()
    }
}
