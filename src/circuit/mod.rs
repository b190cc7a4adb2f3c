// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parameterized classifier circuits.
//!
//! The verifier consumes a measurement observable O; this module produces
//! one from a quantum convolutional neural network (QCNN):
//!
//! ```text
//! O = U(θ)† · (I ⊗ |0⟩⟨0|) · U(θ)
//! ```
//!
//! where U(θ) is the circuit unitary and the projector acts on the last
//! qubit. Training the parameters is left to the caller.
//!
//! # Architecture
//!
//! - [`RotationGate`]: tagged gate variants with closed-form unitaries
//! - [`QcnnLayout`]: convolution / pooling gate sequence for n qubits
//! - [`Qcnn`]: layout plus parameters; evaluation, observable, QASM export
//!
//! # References
//!
//! - Cong, Choi, Lukin, "Quantum convolutional neural networks",
//!   Nature Physics 15, 1273 (2019)

pub mod gates;
pub mod qcnn;

pub use gates::RotationGate;
pub use qcnn::{Qcnn, QcnnLayout};
