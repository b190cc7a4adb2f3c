// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mixed-state exact verification as a semidefinite program.
//!
//! For a density matrix ρ with label ℓ the verifier solves
//!
//!   maximize    Re tr(X)
//!   subject to  tr(σ) = 1,  [[ρ, X], [X†, σ]] ⪰ 0,
//!               Re tr((OO/d)·σ) ≥ 0.5/d   (ℓ = 0)
//!               Re tr((OO/d)·σ) ≤ 0.5/d   (ℓ = 1)
//!
//! whose optimum is the root fidelity between ρ and the closest state on
//! the other side of the decision boundary.
//!
//! The module is split into:
//!
//! - [`FidelitySdp`]: problem data, constraint residuals, certificate check
//! - [`SdpSolver`]: the engine seam
//! - [`SpectralSdpSolver`]: exact engine for this problem class
//!
//! # References
//!
//! - Watrous (2013), "Simpler semidefinite programs for completely bounded
//!   norms", Chicago J. Theor. Comput. Sci. (fidelity SDP).
//! - Uhlmann (1976), Rep. Math. Phys. 9, 273.

pub mod problem;
pub mod solver;

pub use problem::{FidelitySdp, SdpSolution};
pub use solver::{SdpSolver, SpectralSdpSolver};
