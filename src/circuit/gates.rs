// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameterized rotation gates.
//!
//! Every gate is `U(θ) = exp(−i·θ·G)` for a generator with `G² ∝` a
//! projector, so the exponential has a closed form:
//!
//! - `RX`, `RY`, `RZ`: `G = P/2`, `U = cos(θ/2)·I − i·sin(θ/2)·P`
//! - `CRZ`: `G = |1⟩⟨1| ⊗ Z/2`, `U = |0⟩⟨0| ⊗ I + |1⟩⟨1| ⊗ RZ(θ)`
//!
//! Qubit 0 is the most significant bit of a basis index.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::channel::{pauli_x, pauli_y, pauli_z};
use crate::linalg::{c, identity, kron};

/// A rotation gate acting on fixed qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationGate {
    Rx { qubit: usize },
    Ry { qubit: usize },
    Rz { qubit: usize },
    /// Z rotation on `target` conditioned on `control` being |1⟩
    Crz { control: usize, target: usize },
}

impl RotationGate {
    /// Qubits the gate acts on, most significant first.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            RotationGate::Rx { qubit } | RotationGate::Ry { qubit } | RotationGate::Rz { qubit } => {
                vec![qubit]
            }
            RotationGate::Crz { control, target } => vec![control, target],
        }
    }

    /// Hermitian generator G on the gate's own qubits.
    pub fn generator(&self) -> Array2<Complex64> {
        let half = c(0.5);
        match self {
            RotationGate::Rx { .. } => pauli_x() * half,
            RotationGate::Ry { .. } => pauli_y() * half,
            RotationGate::Rz { .. } => pauli_z() * half,
            RotationGate::Crz { .. } => {
                let mut one = Array2::zeros((2, 2));
                one[[1, 1]] = c(1.0);
                kron(&one, &pauli_z()) * half
            }
        }
    }

    /// exp(−i·angle·G).
    pub fn unitary(&self, angle: f64) -> Array2<Complex64> {
        let (cos, sin) = ((angle / 2.0).cos(), (angle / 2.0).sin());
        let rotation = |pauli: Array2<Complex64>| {
            identity(2) * c(cos) - pauli * Complex64::new(0.0, sin)
        };
        match self {
            RotationGate::Rx { .. } => rotation(pauli_x()),
            RotationGate::Ry { .. } => rotation(pauli_y()),
            RotationGate::Rz { .. } => rotation(pauli_z()),
            RotationGate::Crz { .. } => {
                let mut u = identity(4);
                let rz = rotation(pauli_z());
                for i in 0..2 {
                    for j in 0..2 {
                        u[[2 + i, 2 + j]] = rz[[i, j]];
                    }
                }
                u
            }
        }
    }

    /// Apply the gate to an `num_qubits`-qubit state vector.
    pub fn apply(&self, state: &Array1<Complex64>, angle: f64, num_qubits: usize) -> Array1<Complex64> {
        let u = self.unitary(angle);
        let mut out = state.clone();
        let bit = |q: usize| 1usize << (num_qubits - 1 - q);

        match *self {
            RotationGate::Rx { qubit } | RotationGate::Ry { qubit } | RotationGate::Rz { qubit } => {
                let m = bit(qubit);
                for i in (0..state.len()).filter(|i| i & m == 0) {
                    let (a0, a1) = (state[i], state[i | m]);
                    out[i] = u[[0, 0]] * a0 + u[[0, 1]] * a1;
                    out[i | m] = u[[1, 0]] * a0 + u[[1, 1]] * a1;
                }
            }
            RotationGate::Crz { control, target } => {
                let (mc, mt) = (bit(control), bit(target));
                for i in (0..state.len()).filter(|i| i & (mc | mt) == 0) {
                    let idx = [i, i | mt, i | mc, i | mc | mt];
                    let amps = idx.map(|k| state[k]);
                    for (r, &k) in idx.iter().enumerate() {
                        out[k] = (0..4).map(|s| u[[r, s]] * amps[s]).sum();
                    }
                }
            }
        }
        out
    }

    /// OpenQASM 2.0 instruction (without the trailing semicolon).
    pub fn to_qasm(&self, angle: f64) -> String {
        match self {
            RotationGate::Rx { qubit } => format!("rx({}) q[{}]", angle, qubit),
            RotationGate::Ry { qubit } => format!("ry({}) q[{}]", angle, qubit),
            RotationGate::Rz { qubit } => format!("rz({}) q[{}]", angle, qubit),
            RotationGate::Crz { control, target } => {
                format!("crz({}) q[{}], q[{}]", angle, control, target)
            }
        }
    }
}
