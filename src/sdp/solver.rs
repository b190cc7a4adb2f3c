// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! SDP engines.

use crate::error::SolverError;
use crate::linalg::{dagger, psd_factor};
use crate::spectral::{flip_operator, maximize_overlap, SpectralConfig};

use super::problem::{FidelitySdp, SdpSolution};

/// An engine able to solve [`FidelitySdp`] instances.
///
/// Implementations must be usable from several worker threads at once.
pub trait SdpSolver: Send + Sync {
    /// Engine name used in logs.
    fn name(&self) -> &str;

    /// Solve one problem, returning the optimal (σ*, X*, v*).
    fn solve(&self, problem: &FidelitySdp<'_>) -> Result<SdpSolution, SolverError>;
}

/// Exact solver for the fidelity SDP via its spectral dual.
///
/// Factors ρ = W·W†, solves the purified flip problem and lifts the
/// optimizer M back to σ = M·M† and X = W·M†. The lifted block matrix
/// is [W; M]·[W; M]†, so it is PSD by construction.
#[derive(Debug, Clone, Default)]
pub struct SpectralSdpSolver {
    config: SpectralConfig,
}

impl SpectralSdpSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: SpectralConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }
}

impl SdpSolver for SpectralSdpSolver {
    fn name(&self) -> &str {
        "spectral"
    }

    fn solve(&self, problem: &FidelitySdp<'_>) -> Result<SdpSolution, SolverError> {
        let factor = psd_factor(problem.rho);
        let flip = flip_operator(problem.effective_observable, problem.label);
        let dual = maximize_overlap(&factor, &flip, &self.config)?;

        let m = &dual.optimizer;
        let sigma = m.dot(&dagger(m));
        let coupling = factor.dot(&dagger(m));
        let solution = SdpSolution {
            objective: problem.objective(&coupling),
            sigma,
            coupling,
        };

        if self.config.check_certificate {
            problem.check_certificate(&solution, self.config.certificate_tolerance)?;
        }
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::KrausChannel;
    use crate::linalg::{c, trace};
    use crate::state::QuantumState;
    use crate::test_utils::{projector_zero, random_density_matrix, real_qubit};
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use num_complex::Complex64;

    #[test]
    fn test_pure_density_matrix_root_fidelity() {
        // F = (√p + √(1−p))/√2 for a rank-one ρ and a projector
        let theta: f64 = 0.4;
        let rho = QuantumState::Pure(real_qubit(theta)).density_matrix();
        let oo = projector_zero();
        let problem = FidelitySdp::new(&rho, &oo, 1);
        let sol = SpectralSdpSolver::default().solve(&problem).unwrap();

        let p = theta.cos().powi(2);
        let expected = (p.sqrt() + (1.0 - p).sqrt()) / std::f64::consts::SQRT_2;
        assert_relative_eq!(1.0 - sol.objective, expected, epsilon = 1e-8);
        assert_relative_eq!(trace(&sol.sigma).re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(problem.decision_residual(&sol.sigma), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_diagonal_mixed_state() {
        // ρ = diag(q, 1−q) commutes with OO = |0⟩⟨0|; the optimum moves
        // weight to the boundary, F = √(q/2) + √((1−q)/2)
        let q: f64 = 0.8;
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(q);
        rho[[1, 1]] = c(1.0 - q);
        let oo = projector_zero();
        let sol = SpectralSdpSolver::default()
            .solve(&FidelitySdp::new(&rho, &oo, 1))
            .unwrap();
        let expected = (q / 2.0).sqrt() + ((1.0 - q) / 2.0).sqrt();
        assert_relative_eq!(1.0 - sol.objective, expected, epsilon = 1e-8);
    }

    #[test]
    fn test_random_mixed_states_pass_certificate() {
        let solver = SpectralSdpSolver::default();
        let channel = KrausChannel::depolarizing(0.1)
            .unwrap()
            .on_qubit(2, 1)
            .unwrap();
        let mut o = Array2::zeros((4, 4));
        o[[0, 0]] = c(1.0);
        o[[2, 2]] = c(1.0);
        let oo = channel.effective_observable(&o);

        for seed in 0..10u64 {
            let rho = random_density_matrix(4, 2, seed);
            let ex = crate::linalg::expectation(&oo, &rho);
            let label = u8::from(ex > 0.5);
            let problem = FidelitySdp::new(&rho, &oo, label);
            let sol = solver.solve(&problem).unwrap();
            let fidelity = 1.0 - sol.objective;
            assert!(fidelity > 0.0 && fidelity <= 1.0 + 1e-9);
            assert!(problem.check_certificate(&sol, 1e-7).is_ok());
        }
    }

    #[test]
    fn test_infeasible_flip_propagates() {
        let oo = Array2::from_diag(&ndarray::arr1(&[c(0.9), c(0.8)]));
        let rho = QuantumState::Pure(real_qubit(0.3)).density_matrix();
        let err = SpectralSdpSolver::default()
            .solve(&FidelitySdp::new(&rho, &oo, 1))
            .unwrap_err();
        assert!(matches!(err, SolverError::Infeasible(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SpectralConfig {
            gap_tolerance: 0.0,
            ..SpectralConfig::default()
        };
        assert!(SpectralSdpSolver::new(config).is_err());
    }

    #[test]
    fn test_coupling_trace_is_real() {
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(0.7);
        rho[[1, 1]] = c(0.3);
        rho[[0, 1]] = Complex64::new(0.1, 0.25);
        rho[[1, 0]] = Complex64::new(0.1, -0.25);
        let oo = projector_zero();
        let sol = SpectralSdpSolver::default()
            .solve(&FidelitySdp::new(&rho, &oo, 1))
            .unwrap();
        assert!(trace(&sol.coupling).im.abs() < 1e-12);
    }
}
