// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quantum convolutional neural network classifier.

use std::f64::consts::PI;
use std::fmt::Write as _;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::linalg::{c, dagger};

use super::gates::RotationGate;

/// Gate sequence of a QCNN on a fixed register.
#[derive(Debug, Clone, PartialEq)]
pub struct QcnnLayout {
    num_qubits: usize,
    gates: Vec<RotationGate>,
}

impl QcnnLayout {
    /// Convolution and pooling blocks until at most two qubits remain active,
    /// then a single-qubit block on the last qubit.
    pub fn new(num_qubits: usize) -> Result<Self, String> {
        if num_qubits == 0 {
            return Err("QCNN needs at least one qubit".into());
        }

        let mut gates = Vec::new();
        let mut start = 0;
        let end = num_qubits;
        while start + 2 < end {
            convolution(&mut gates, start, end);
            let mid = ((end - start + 1) >> 1) + start;
            pooling(&mut gates, start..mid, mid..end);
            start = mid;
        }
        local(&mut gates, end - 1);

        Ok(Self { num_qubits, gates })
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    pub fn gates(&self) -> &[RotationGate] {
        &self.gates
    }

    /// Number of trainable angles (one per gate).
    pub fn num_parameters(&self) -> usize {
        self.gates.len()
    }
}

/// Three rotations giving an arbitrary single-qubit unitary up to phase.
fn local(gates: &mut Vec<RotationGate>, qubit: usize) {
    gates.extend([
        RotationGate::Rx { qubit },
        RotationGate::Rz { qubit },
        RotationGate::Rx { qubit },
    ]);
}

/// Neighbouring pairs at even offsets, then at odd offsets.
fn convolution(gates: &mut Vec<RotationGate>, start: usize, end: usize) {
    for j in (start..end - 1).step_by(2) {
        local(gates, j);
        local(gates, j + 1);
        gates.push(RotationGate::Crz {
            control: j,
            target: j + 1,
        });
    }
    for j in (start + 1..end - 1).step_by(2) {
        local(gates, j);
        local(gates, j + 1);
        gates.push(RotationGate::Crz {
            control: j + 1,
            target: j,
        });
    }
}

/// Fold each sink into its source with controlled rotations both ways.
fn pooling(
    gates: &mut Vec<RotationGate>,
    sources: std::ops::Range<usize>,
    sinks: std::ops::Range<usize>,
) {
    for (j, k) in sources.zip(sinks) {
        local(gates, j);
        local(gates, k);
        gates.push(RotationGate::Crz {
            control: k,
            target: j,
        });
        local(gates, j);
        local(gates, k);
        gates.push(RotationGate::Crz {
            control: j,
            target: k,
        });
    }
}

/// A QCNN with concrete parameters.
///
/// The classifier predicts label 1 when the probability of measuring the
/// last qubit in |0⟩ exceeds 0.5.
#[derive(Debug, Clone)]
pub struct Qcnn {
    layout: QcnnLayout,
    parameters: Array1<f64>,
}

impl Qcnn {
    /// Parameters drawn uniformly from [0, 4π) with a fixed seed.
    pub fn with_seed(num_qubits: usize, seed: u64) -> Result<Self, String> {
        let layout = QcnnLayout::new(num_qubits)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let parameters = (0..layout.num_parameters())
            .map(|_| rng.random_range(0.0..4.0 * PI))
            .collect();
        Ok(Self { layout, parameters })
    }

    pub fn with_parameters(layout: QcnnLayout, parameters: Array1<f64>) -> Result<Self, String> {
        if parameters.len() != layout.num_parameters() {
            return Err(format!(
                "layout has {} gates, got {} parameters",
                layout.num_parameters(),
                parameters.len()
            ));
        }
        Ok(Self { layout, parameters })
    }

    pub fn layout(&self) -> &QcnnLayout {
        &self.layout
    }

    pub fn parameters(&self) -> &Array1<f64> {
        &self.parameters
    }

    /// U|ψ⟩.
    pub fn evolve(&self, state: &Array1<Complex64>) -> Array1<Complex64> {
        let n = self.layout.num_qubits;
        self.layout
            .gates
            .iter()
            .zip(self.parameters.iter())
            .fold(state.clone(), |psi, (gate, &angle)| gate.apply(&psi, angle, n))
    }

    /// Probability that the last qubit is measured in |0⟩.
    pub fn predict(&self, state: &Array1<Complex64>) -> f64 {
        self.evolve(state)
            .iter()
            .step_by(2)
            .map(|z| z.norm_sqr())
            .sum()
    }

    /// Full circuit unitary, column j = U|j⟩.
    pub fn unitary(&self) -> Array2<Complex64> {
        let d = self.layout.dim();
        let mut u = Array2::zeros((d, d));
        for j in 0..d {
            let mut basis = Array1::zeros(d);
            basis[j] = c(1.0);
            u.column_mut(j).assign(&self.evolve(&basis));
        }
        u
    }

    /// Measurement observable O = U†(I ⊗ |0⟩⟨0|)U, so that ⟨ψ|O|ψ⟩ is
    /// the prediction for |ψ⟩.
    pub fn observable(&self) -> Array2<Complex64> {
        let u = self.unitary();
        let d = u.nrows();
        let projector = Array2::from_shape_fn((d, d), |(i, j)| {
            if i == j && i % 2 == 0 {
                c(1.0)
            } else {
                c(0.0)
            }
        });
        dagger(&u).dot(&projector).dot(&u)
    }

    /// Fraction of states whose thresholded prediction matches the label.
    pub fn accuracy(&self, states: &[Array1<Complex64>], labels: &[u8]) -> f64 {
        if states.is_empty() {
            return 0.0;
        }
        let correct = states
            .iter()
            .zip(labels)
            .filter(|&(psi, &label)| (self.predict(psi) > 0.5) == (label == 1))
            .count();
        correct as f64 / states.len() as f64
    }

    /// Mean squared error between predictions and labels.
    pub fn mse_loss(&self, states: &[Array1<Complex64>], labels: &[u8]) -> f64 {
        if states.is_empty() {
            return 0.0;
        }
        let total: f64 = states
            .iter()
            .zip(labels)
            .map(|(psi, &label)| (self.predict(psi) - label as f64).powi(2))
            .sum();
        total / states.len() as f64
    }

    /// OpenQASM 2.0 program measuring the last qubit.
    pub fn to_qasm(&self) -> String {
        let n = self.layout.num_qubits;
        let mut qasm = String::from("OPENQASM 2.0;\ninclude \"qelib1.inc\";");
        let _ = write!(qasm, "\nqreg q[{}];\ncreg c[1];", n);
        for (gate, &angle) in self.layout.gates.iter().zip(self.parameters.iter()) {
            let _ = write!(qasm, "\n{};", gate.to_qasm(angle));
        }
        let _ = write!(qasm, "\nmeasure q[{}] -> c[0];", n - 1);
        qasm
    }
}
