// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pure-state exact verification as a constrained nonlinear program.
//!
//! For a state vector ψ with label ℓ the verifier minimizes the fidelity
//! loss 1 − (ψᵀφ)² over unit vectors φ on the other side of the decision
//! boundary. The problem is a non-convex QCQP; gradients and Hessians of
//! the objective and every constraint are supplied analytically.
//!
//! # Architecture
//!
//! - [`ConstrainedProblem`]: `min f(x) s.t. c(x) ≤ 0` with exact derivatives
//! - [`FlipQcqp`]: the decision-flip problem
//! - [`NlpSolver`]: the engine seam
//! - [`TrustRegionSolver`]: augmented Lagrangian + trust-region Newton
//!
//! # References
//!
//! - Nocedal & Wright (2006), "Numerical Optimization", 2nd ed., Springer.
//! - Steihaug (1983), "The conjugate gradient method and trust regions in
//!   large scale optimization", SIAM J. Numer. Anal. 20(3), 626.

pub mod problem;
pub mod trust_region;
pub mod types;

pub use problem::{ConstrainedProblem, FlipQcqp};
pub use trust_region::TrustRegionSolver;
pub use types::{NlpResult, NlpSolver, TrustRegionConfig};
