// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pure-state exact verifier.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::linalg::{c, column, real_embedding, real_stack};
use crate::nlp::{ConstrainedProblem, FlipQcqp, NlpSolver, TrustRegionSolver};
use crate::spectral::{flip_operator, maximize_overlap, SpectralConfig};

use super::outcome::{OutcomeCounts, StateOutcome};

/// Engine used for the pure-state flip problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PureEngine {
    /// Local trust-region solve seeded at ψ
    #[default]
    TrustRegion,
    /// Global optimum via the spectral dual
    Spectral,
}

impl std::fmt::Display for PureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PureEngine::TrustRegion => write!(f, "trust-region"),
            PureEngine::Spectral => write!(f, "spectral"),
        }
    }
}

impl std::str::FromStr for PureEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trust-region" | "trust_region" => Ok(PureEngine::TrustRegion),
            "spectral" => Ok(PureEngine::Spectral),
            other => Err(format!(
                "unknown pure engine '{other}' (expected trust-region or spectral)"
            )),
        }
    }
}

/// How complex amplitudes enter the real-valued flip problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmplitudeMode {
    /// Drop imaginary parts of ψ and OO
    #[default]
    RealProjection,
    /// Solve over ℝ²ᵈ with ψ ↦ [Re ψ; Im ψ] and the real embedding of OO
    ComplexEmbedding,
}

impl std::fmt::Display for AmplitudeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmplitudeMode::RealProjection => write!(f, "real-projection"),
            AmplitudeMode::ComplexEmbedding => write!(f, "complex-embedding"),
        }
    }
}

impl std::str::FromStr for AmplitudeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "real-projection" | "real_projection" | "real" => Ok(AmplitudeMode::RealProjection),
            "complex-embedding" | "complex_embedding" | "complex" => {
                Ok(AmplitudeMode::ComplexEmbedding)
            }
            other => Err(format!(
                "unknown amplitude mode '{other}' (expected real-projection or complex-embedding)"
            )),
        }
    }
}

/// Worst-case perturbation found for one state.
#[derive(Debug, Clone)]
pub struct PureSolve {
    /// δ = 1 − (1 − f(φ*)) / (φ*·φ*)
    pub delta: f64,
    /// φ* mapped back to ℂᵈ
    pub adversarial: Array1<Complex64>,
}

/// Runs the flip QCQP for individual state vectors.
pub struct PureVerifier<'a> {
    engine: PureEngine,
    mode: AmplitudeMode,
    nlp: &'a dyn NlpSolver,
    spectral: &'a SpectralConfig,
    degenerate_tolerance: f64,
}

impl<'a> PureVerifier<'a> {
    pub fn new(
        engine: PureEngine,
        mode: AmplitudeMode,
        nlp: &'a dyn NlpSolver,
        spectral: &'a SpectralConfig,
        degenerate_tolerance: f64,
    ) -> Self {
        Self {
            engine,
            mode,
            nlp,
            spectral,
            degenerate_tolerance,
        }
    }

    /// Real-valued flip problem for ψ under the configured amplitude mode.
    pub fn formulate(
        &self,
        psi: &Array1<Complex64>,
        effective_observable: &Array2<Complex64>,
        label: u8,
    ) -> FlipQcqp {
        match self.mode {
            AmplitudeMode::RealProjection => FlipQcqp::new(
                psi.mapv(|z| z.re),
                effective_observable.mapv(|z| z.re),
                label,
            ),
            AmplitudeMode::ComplexEmbedding => FlipQcqp::new(
                real_stack(psi),
                real_embedding(effective_observable),
                label,
            ),
        }
    }

    /// Solve the flip problem for one state.
    pub fn solve_state(
        &self,
        psi: &Array1<Complex64>,
        effective_observable: &Array2<Complex64>,
        label: u8,
    ) -> Result<PureSolve, SolverError> {
        let problem = self.formulate(psi, effective_observable, label);
        let x = match self.engine {
            PureEngine::TrustRegion => self.nlp.minimize(&problem, problem.target())?.x,
            PureEngine::Spectral => {
                let target = problem.target().mapv(c);
                let observable = problem.observable().mapv(c);
                let flip = flip_operator(&observable, label);
                let dual = maximize_overlap(&column(&target), &flip, self.spectral)?;
                dual.optimizer.column(0).mapv(|z| z.re)
            }
        };

        let norm_sq = x.dot(&x);
        if norm_sq < self.degenerate_tolerance || !norm_sq.is_finite() {
            return Err(SolverError::NumericDegenerate(format!(
                "phi*.phi* = {norm_sq:.3e}"
            )));
        }
        let delta = 1.0 - (1.0 - problem.objective(&x)) / norm_sq;
        Ok(PureSolve {
            delta,
            adversarial: self.lift(&x, psi.len()),
        })
    }

    /// Map a real solution back to ℂᵈ.
    fn lift(&self, x: &Array1<f64>, d: usize) -> Array1<Complex64> {
        match self.mode {
            AmplitudeMode::RealProjection => x.mapv(c),
            AmplitudeMode::ComplexEmbedding => {
                Array1::from_shape_fn(d, |i| Complex64::new(x[i], x[i + d]))
            }
        }
    }

    /// Decide one state against the budget ε; returns φ* when non-robust.
    pub fn verify_state(
        &self,
        psi: &Array1<Complex64>,
        effective_observable: &Array2<Complex64>,
        label: u8,
        epsilon: f64,
    ) -> (StateOutcome, Option<Array1<Complex64>>) {
        match self.solve_state(psi, effective_observable, label) {
            Ok(solve) => {
                let outcome = StateOutcome::classify(solve.delta, epsilon);
                let adversarial = outcome.is_non_robust().then_some(solve.adversarial);
                (outcome, adversarial)
            }
            Err(e) => {
                tracing::warn!(engine = %self.engine, error = %e, "pure-state solve failed");
                (StateOutcome::Failed(e), None)
            }
        }
    }
}

/// Number of non-robust states among already-flagged state vectors.
///
/// Uses the trust-region engine on real projections, as the batch driver
/// does by default. With `emit_adversarial_examples` every non-robust
/// state is rendered by a [`PgmReporter`](crate::adversary::PgmReporter)
/// into the default report directory.
pub fn verify_pure(
    effective_observable: &Array2<Complex64>,
    states: &[Array1<Complex64>],
    labels: &[u8],
    epsilon: f64,
    emit_adversarial_examples: bool,
) -> usize {
    use crate::adversary::{AdversarialExample, AdversaryReporter, PgmReporter};

    let nlp = TrustRegionSolver::default();
    let spectral = SpectralConfig::default();
    let verifier = PureVerifier::new(
        PureEngine::TrustRegion,
        AmplitudeMode::RealProjection,
        &nlp,
        &spectral,
        crate::config::default_degenerate_tolerance(),
    );
    let reporter = emit_adversarial_examples
        .then(|| PgmReporter::new(crate::config::ReportConfig::default()));

    let mut outcomes = Vec::with_capacity(states.len());
    for (index, (psi, &label)) in states.iter().zip(labels.iter()).enumerate() {
        let (outcome, adversarial) = verifier.verify_state(psi, effective_observable, label, epsilon);
        if let (Some(reporter), Some(adversarial), Some(delta)) =
            (reporter.as_ref(), adversarial, outcome.delta())
        {
            let example = AdversarialExample {
                ordinal: OutcomeCounts::tally(&outcomes).non_robust + 1,
                index,
                label,
                delta,
                original: psi.clone(),
                adversarial,
            };
            if let Err(e) = reporter.report(&example) {
                tracing::warn!(error = %e, "failed to write adversarial example");
            }
        }
        outcomes.push(outcome);
    }
    OutcomeCounts::tally(&outcomes).non_robust
}
