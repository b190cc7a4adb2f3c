// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fidelity SDP formulation and certificate checks.

use ndarray::{s, Array2};
use num_complex::Complex64;

use crate::error::SolverError;
use crate::linalg::{dagger, expectation, min_eigenvalue, trace};

/// One mixed-state flip problem.
#[derive(Debug, Clone, Copy)]
pub struct FidelitySdp<'a> {
    /// Input density matrix ρ
    pub rho: &'a Array2<Complex64>,
    /// Effective observable OO
    pub effective_observable: &'a Array2<Complex64>,
    /// Ground-truth label of ρ
    pub label: u8,
}

/// Candidate optimum returned by an [`SdpSolver`](super::SdpSolver).
#[derive(Debug, Clone)]
pub struct SdpSolution {
    /// Perturbed density matrix σ*
    pub sigma: Array2<Complex64>,
    /// Coupling block X*
    pub coupling: Array2<Complex64>,
    /// 1 − Re tr(X*)
    pub objective: f64,
}

impl<'a> FidelitySdp<'a> {
    pub fn new(
        rho: &'a Array2<Complex64>,
        effective_observable: &'a Array2<Complex64>,
        label: u8,
    ) -> Self {
        Self {
            rho,
            effective_observable,
            label,
        }
    }

    pub fn dim(&self) -> usize {
        self.rho.nrows()
    }

    /// Decision-side residual; non-negative iff σ is on the flipped side.
    pub fn decision_residual(&self, sigma: &Array2<Complex64>) -> f64 {
        let d = self.dim() as f64;
        let value = expectation(self.effective_observable, sigma) / d - 0.5 / d;
        if self.label == 0 {
            value
        } else {
            -value
        }
    }

    /// The block matrix [[ρ, X], [X†, σ]].
    pub fn block_matrix(
        &self,
        coupling: &Array2<Complex64>,
        sigma: &Array2<Complex64>,
    ) -> Array2<Complex64> {
        let d = self.dim();
        let mut block = Array2::zeros((2 * d, 2 * d));
        block.slice_mut(s![..d, ..d]).assign(self.rho);
        block.slice_mut(s![..d, d..]).assign(coupling);
        block.slice_mut(s![d.., ..d]).assign(&dagger(coupling));
        block.slice_mut(s![d.., d..]).assign(sigma);
        block
    }

    /// 1 − Re tr(X).
    pub fn objective(&self, coupling: &Array2<Complex64>) -> f64 {
        1.0 - trace(coupling).re
    }

    /// Check that a solution satisfies every constraint within `tol`.
    pub fn check_certificate(&self, solution: &SdpSolution, tol: f64) -> Result<(), SolverError> {
        let tr = trace(&solution.sigma).re;
        if (tr - 1.0).abs() > tol {
            return Err(SolverError::CertificateViolation(format!(
                "tr(sigma) = {tr:.9} differs from 1"
            )));
        }
        let residual = self.decision_residual(&solution.sigma);
        if residual < -tol {
            return Err(SolverError::CertificateViolation(format!(
                "decision constraint violated by {:.3e}",
                -residual
            )));
        }
        let min_eig = min_eigenvalue(&self.block_matrix(&solution.coupling, &solution.sigma));
        if min_eig < -tol {
            return Err(SolverError::CertificateViolation(format!(
                "block matrix has eigenvalue {min_eig:.3e}"
            )));
        }
        Ok(())
    }

    /// δ = 1 − (1 − v*) / tr(σ*).
    ///
    /// Fails with `NumericDegenerate` when tr(σ*) is below `degenerate_tol`.
    pub fn fidelity_loss(
        &self,
        solution: &SdpSolution,
        degenerate_tol: f64,
    ) -> Result<f64, SolverError> {
        let tr = trace(&solution.sigma).re;
        if tr.abs() < degenerate_tol || !tr.is_finite() {
            return Err(SolverError::NumericDegenerate(format!(
                "tr(sigma) = {tr:.3e}"
            )));
        }
        Ok(1.0 - (1.0 - solution.objective) / tr)
    }
}
