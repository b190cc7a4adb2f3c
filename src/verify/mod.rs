// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Two-stage robustness verification.
//!
//! A run composes the channel into an effective observable, lets the
//! analytic filter certify every state it can, and hands the remaining
//! states to an exact verifier:
//!
//! - density matrices go to the fidelity SDP ([`MixedVerifier`])
//! - state vectors go to the flip QCQP ([`PureVerifier`])
//!
//! # Architecture
//!
//! Each flagged state is solved independently and produces a
//! [`StateOutcome`]. Outcomes are collected in dataset order and reduced by
//! counting into a [`VerificationReport`], so the optional rayon-parallel
//! loop yields exactly the counts of the sequential one. A failed solve is
//! recorded as [`StateOutcome::Failed`] and never aborts the batch.
//!
//! # References
//!
//! - Guan, Fang, Ying, "Robustness Verification of Quantum Classifiers",
//!   CAV 2021

pub mod mixed;
pub mod outcome;
pub mod pure;
pub mod report;

pub use mixed::{mixed_threshold, verify_mixed, MixedVerifier};
pub use outcome::{OutcomeCounts, StateOutcome};
pub use pure::{verify_pure, AmplitudeMode, PureEngine, PureSolve, PureVerifier};
pub use report::VerificationReport;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::adversary::{AdversarialExample, AdversaryReporter, PgmReporter};
use crate::channel::KrausChannel;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::analytic_filter;
use crate::nlp::{NlpSolver, TrustRegionSolver};
use crate::sdp::{SdpSolver, SpectralSdpSolver};
use crate::state::{Dataset, QuantumState};
use crate::validation::{validate_dataset, validate_problem};

/// One exact solve: dataset index, outcome, adversarial vector if any.
type Solved = (usize, StateOutcome, Option<Array1<Complex64>>);

/// Orchestrates filter, exact verifiers and aggregation.
pub struct RobustnessVerifier {
    config: Config,
    sdp: Box<dyn SdpSolver>,
    nlp: Box<dyn NlpSolver>,
    reporter: Option<Arc<dyn AdversaryReporter>>,
}

impl RobustnessVerifier {
    /// Build a verifier with the shipped engines configured from `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let sdp = SpectralSdpSolver::new(config.solver.spectral.clone()).map_err(Error::Config)?;
        let nlp =
            TrustRegionSolver::new(config.solver.trust_region.clone()).map_err(Error::Config)?;
        let reporter: Option<Arc<dyn AdversaryReporter>> =
            if config.verifier.emit_adversarial_examples {
                Some(Arc::new(PgmReporter::new(config.report.clone())))
            } else {
                None
            };

        Ok(Self {
            config,
            sdp: Box::new(sdp),
            nlp: Box::new(nlp),
            reporter,
        })
    }

    /// Replace the mixed-state engine.
    pub fn with_sdp_solver(mut self, solver: Box<dyn SdpSolver>) -> Self {
        self.sdp = solver;
        self
    }

    /// Replace the pure-state trust-region engine.
    pub fn with_nlp_solver(mut self, solver: Box<dyn NlpSolver>) -> Self {
        self.nlp = solver;
        self
    }

    /// Install an adversarial-example hook (replaces the configured one).
    pub fn with_reporter(mut self, reporter: Arc<dyn AdversaryReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate the inputs, compose the channel and verify every state.
    pub fn verify(
        &self,
        channel: &KrausChannel,
        observable: &Array2<Complex64>,
        dataset: &Dataset,
        epsilon: f64,
    ) -> Result<VerificationReport> {
        validate_problem(channel, observable, dataset, epsilon, &self.config.validation)?;
        let effective_observable = channel.effective_observable(observable);
        self.run(&effective_observable, dataset, epsilon)
    }

    /// Verify against an already composed effective observable.
    pub fn verify_with_observable(
        &self,
        effective_observable: &Array2<Complex64>,
        dataset: &Dataset,
        epsilon: f64,
    ) -> Result<VerificationReport> {
        validate_dataset(effective_observable, dataset, epsilon, &self.config.validation)?;
        self.run(effective_observable, dataset, epsilon)
    }

    fn run(
        &self,
        effective_observable: &Array2<Complex64>,
        dataset: &Dataset,
        epsilon: f64,
    ) -> Result<VerificationReport> {
        let start = Instant::now();

        let filter = analytic_filter(
            effective_observable,
            &dataset.states,
            &dataset.labels,
            epsilon,
        );
        let filter_elapsed = start.elapsed();
        info!(
            epsilon,
            states = dataset.len(),
            flagged = filter.flagged,
            elapsed_ms = filter_elapsed.as_millis() as u64,
            "analytic filter done"
        );

        let flagged = dataset.select(&filter.mask);
        let solved = if flagged.is_empty() {
            Vec::new()
        } else {
            self.solve_flagged(effective_observable, &flagged, epsilon)?
        };
        let total_elapsed = start.elapsed();

        if let Some(reporter) = &self.reporter {
            emit_adversarial(reporter.as_ref(), &solved, dataset);
        }

        let outcomes = solved
            .into_iter()
            .map(|(index, outcome, _)| (index, outcome))
            .collect();
        let report = VerificationReport::aggregate(
            epsilon,
            dataset.len(),
            filter.flagged,
            outcomes,
            filter_elapsed,
            total_elapsed,
        );
        info!(
            epsilon,
            non_robust = report.non_robust[1],
            failed = report.failed,
            robust_accuracy = report.robust_accuracy[1],
            elapsed_ms = total_elapsed.as_millis() as u64,
            "exact verification done"
        );
        Ok(report)
    }

    /// Exact verification of the flagged subset, in input order.
    fn solve_flagged(
        &self,
        effective_observable: &Array2<Complex64>,
        flagged: &[(usize, &QuantumState, u8)],
        epsilon: f64,
    ) -> Result<Vec<Solved>> {
        let total = flagged.len();
        let progress = AtomicUsize::new(0);

        let solve = |k: usize| -> Solved {
            let (index, state, label) = flagged[k];
            let (outcome, adversarial) =
                self.solve_state(effective_observable, state, label, epsilon);
            let completed = progress.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(index, outcome = %outcome, "{}/{} states checked", completed, total);
            (index, outcome, adversarial)
        };

        if !self.config.verifier.parallel {
            return Ok((0..total).map(&solve).collect());
        }

        let pool = match self.config.verifier.max_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Config(format!("failed to create thread pool: {}", e)))?,
            ),
            None => None,
        };

        let solved: Vec<Solved> = if let Some(pool) = pool {
            pool.install(|| (0..total).into_par_iter().map(&solve).collect())
        } else {
            (0..total).into_par_iter().map(&solve).collect()
        };
        Ok(solved)
    }

    fn solve_state(
        &self,
        effective_observable: &Array2<Complex64>,
        state: &QuantumState,
        label: u8,
        epsilon: f64,
    ) -> (StateOutcome, Option<Array1<Complex64>>) {
        let tolerance = self.config.solver.degenerate_tolerance;
        match state {
            QuantumState::Mixed(rho) => {
                let verifier = MixedVerifier::new(self.sdp.as_ref(), tolerance);
                (
                    verifier.verify_state(rho, effective_observable, label, epsilon),
                    None,
                )
            }
            QuantumState::Pure(psi) => {
                let verifier = PureVerifier::new(
                    self.config.verifier.pure_engine,
                    self.config.verifier.amplitude_mode,
                    self.nlp.as_ref(),
                    &self.config.solver.spectral,
                    tolerance,
                );
                verifier.verify_state(psi, effective_observable, label, epsilon)
            }
        }
    }
}

/// Hand non-robust pure states to the reporter, numbered 1, 2, … in
/// dataset order.
fn emit_adversarial(reporter: &dyn AdversaryReporter, solved: &[Solved], dataset: &Dataset) {
    let mut ordinal = 0;
    for (index, outcome, adversarial) in solved {
        if !outcome.is_non_robust() {
            continue;
        }
        ordinal += 1;
        let (Some(adversarial), Some(QuantumState::Pure(original)), Some(delta)) =
            (adversarial, dataset.states.get(*index), outcome.delta())
        else {
            continue;
        };
        let example = AdversarialExample {
            index: *index,
            ordinal,
            label: dataset.labels[*index],
            delta,
            original: original.clone(),
            adversarial: adversarial.clone(),
        };
        if let Err(e) = reporter.report(&example) {
            warn!(index, error = %e, "failed to write adversarial example");
        }
    }
}

/// One-shot verification with default settings.
///
/// Returns `(robust_accuracy, check_time)`; index 0 is the analytic bound,
/// index 1 the exact result.
pub fn robustness_verifier(
    kraus: &[Array2<Complex64>],
    observable: &Array2<Complex64>,
    states: Vec<QuantumState>,
    labels: Vec<u8>,
    epsilon: f64,
) -> Result<([f64; 2], [f64; 2])> {
    let channel = KrausChannel::new(kraus.to_vec());
    let dataset = Dataset::new(states, labels);
    let report = RobustnessVerifier::new(Config::default())?.verify(
        &channel,
        observable,
        &dataset,
        epsilon,
    )?;
    Ok((report.robust_accuracy, report.check_time))
}
