// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Mixed-state exact verifier.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::SolverError;
use crate::sdp::{FidelitySdp, SdpSolver, SpectralSdpSolver};

use super::outcome::{OutcomeCounts, StateOutcome};

/// Convert a squared-fidelity budget ε into the root-fidelity budget the
/// SDP objective is measured in: 1 − F < ε' ⟺ 1 − F² < ε.
pub fn mixed_threshold(epsilon: f64) -> f64 {
    1.0 - (1.0 - epsilon).sqrt()
}

/// Runs the fidelity SDP for individual density matrices.
pub struct MixedVerifier<'a> {
    solver: &'a dyn SdpSolver,
    degenerate_tolerance: f64,
}

impl<'a> MixedVerifier<'a> {
    pub fn new(solver: &'a dyn SdpSolver, degenerate_tolerance: f64) -> Self {
        Self {
            solver,
            degenerate_tolerance,
        }
    }

    /// Worst-case fidelity loss δ for one state.
    pub fn fidelity_loss(
        &self,
        rho: &Array2<Complex64>,
        effective_observable: &Array2<Complex64>,
        label: u8,
    ) -> Result<f64, SolverError> {
        let problem = FidelitySdp::new(rho, effective_observable, label);
        let solution = self.solver.solve(&problem)?;
        problem.fidelity_loss(&solution, self.degenerate_tolerance)
    }

    /// Decide one state against the budget ε.
    pub fn verify_state(
        &self,
        rho: &Array2<Complex64>,
        effective_observable: &Array2<Complex64>,
        label: u8,
        epsilon: f64,
    ) -> StateOutcome {
        match self.fidelity_loss(rho, effective_observable, label) {
            Ok(delta) => StateOutcome::classify(delta, mixed_threshold(epsilon)),
            Err(e) => {
                tracing::warn!(solver = self.solver.name(), error = %e, "SDP solve failed");
                StateOutcome::Failed(e)
            }
        }
    }
}

/// Number of non-robust states among already-flagged density matrices.
///
/// Uses the spectral SDP engine with default settings; failures are logged
/// and excluded from the count.
pub fn verify_mixed(
    effective_observable: &Array2<Complex64>,
    states: &[Array2<Complex64>],
    labels: &[u8],
    epsilon: f64,
) -> usize {
    let solver = SpectralSdpSolver::default();
    let verifier = MixedVerifier::new(&solver, crate::config::default_degenerate_tolerance());
    let outcomes: Vec<StateOutcome> = states
        .iter()
        .zip(labels.iter())
        .map(|(rho, &label)| verifier.verify_state(rho, effective_observable, label, epsilon))
        .collect();
    OutcomeCounts::tally(&outcomes).non_robust
}
