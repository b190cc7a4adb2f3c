// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregated results of one verification run.

use std::time::Duration;

use super::outcome::{OutcomeCounts, StateOutcome};

/// Robust accuracy and timing for one ε.
///
/// Index 0 of each pair is the analytic bound alone, index 1 the bound
/// refined by the exact verifier.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub epsilon: f64,
    pub num_states: usize,
    /// States the analytic filter could not certify
    pub flagged: usize,
    pub non_robust: [usize; 2],
    /// Flagged states whose exact solve failed
    pub failed: usize,
    pub robust_accuracy: [f64; 2],
    /// Seconds since the start of the run at each checkpoint
    pub check_time: [f64; 2],
    /// Seconds spent in the exact verifier
    pub exact_time: f64,
    /// Exact outcomes keyed by dataset index, in dataset order
    pub outcomes: Vec<(usize, StateOutcome)>,
}

impl VerificationReport {
    /// Reduce filter and exact-verifier results into a report.
    ///
    /// Failed solves count against `robust_accuracy[1]` but not against
    /// `non_robust[1]`.
    pub fn aggregate(
        epsilon: f64,
        num_states: usize,
        flagged: usize,
        outcomes: Vec<(usize, StateOutcome)>,
        filter_elapsed: Duration,
        total_elapsed: Duration,
    ) -> Self {
        let counts = OutcomeCounts::tally(outcomes.iter().map(|(_, o)| o));
        let non_robust = [flagged, counts.non_robust];
        let n = num_states.max(1) as f64;
        let robust_accuracy = [
            1.0 - non_robust[0] as f64 / n,
            1.0 - (non_robust[1] + counts.failed) as f64 / n,
        ];
        let check_time = [filter_elapsed.as_secs_f64(), total_elapsed.as_secs_f64()];

        Self {
            epsilon,
            num_states,
            flagged,
            non_robust,
            failed: counts.failed,
            robust_accuracy,
            check_time,
            exact_time: check_time[1] - check_time[0],
            outcomes,
        }
    }

    /// Dataset indices the exact verifier proved non-robust.
    pub fn non_robust_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_non_robust())
            .map(|(i, _)| *i)
            .collect()
    }

    /// Dataset indices whose exact solve failed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failed())
            .map(|(i, _)| *i)
            .collect()
    }
}

impl std::fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "epsilon = {:e}, states = {}", self.epsilon, self.num_states)?;
        writeln!(
            f,
            "  robust bound:         accuracy {:.2}%  ({} flagged)  {:.4}s",
            100.0 * self.robust_accuracy[0],
            self.non_robust[0],
            self.check_time[0]
        )?;
        write!(
            f,
            "  robustness algorithm: accuracy {:.2}%  ({} non-robust, {} failed)  {:.4}s",
            100.0 * self.robust_accuracy[1],
            self.non_robust[1],
            self.failed,
            self.check_time[1]
        )
    }
}
