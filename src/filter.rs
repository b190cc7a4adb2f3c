// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Analytic pre-filter.
//!
//! For a state with post-channel expectation `ex` the smallest fidelity
//! loss needed to push the expectation across 0.5 is bounded below by
//! (√ex − √(1−ex))² / 2. A state is flagged for the exact check iff
//!
//! - `|√ex − √(1−ex)| ≤ √(2ε)` (the flip may fit inside the budget), and
//! - `(ex > 0.5) == (label == 1)` (the state is currently classified correctly).
//!
//! Unflagged states are certified robust; flagged states may be false
//! positives and are refined by the exact verifiers.

use ndarray::Array2;
use num_complex::Complex64;

use crate::state::QuantumState;

/// Result of running the pre-filter over a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    /// Post-channel expectation per state, clamped to [0, 1]
    pub expectations: Vec<f64>,
    /// `true` where the exact verifier must run
    pub mask: Vec<bool>,
    /// Number of `true` entries in `mask`
    pub flagged: usize,
}

impl FilterOutcome {
    /// Dataset indices of the flagged states.
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }
}

/// Decide a single state from its expectation.
pub fn may_flip(expectation: f64, label: u8, epsilon: f64) -> bool {
    let ex = expectation.clamp(0.0, 1.0);
    let gap = (ex.sqrt() - (1.0 - ex).sqrt()).abs();
    let within_budget = gap <= (2.0 * epsilon).sqrt();
    let correctly_classified = (ex > 0.5) == (label == 1);
    within_budget && correctly_classified
}

/// Run the pre-filter over paired states and labels.
pub fn analytic_filter(
    effective_observable: &Array2<Complex64>,
    states: &[QuantumState],
    labels: &[u8],
    epsilon: f64,
) -> FilterOutcome {
    let expectations: Vec<f64> = states
        .iter()
        .map(|s| s.expectation(effective_observable).clamp(0.0, 1.0))
        .collect();
    let mask: Vec<bool> = expectations
        .iter()
        .zip(labels.iter())
        .map(|(&ex, &label)| may_flip(ex, label, epsilon))
        .collect();
    let flagged = mask.iter().filter(|&&m| m).count();

    tracing::debug!(
        states = states.len(),
        flagged,
        epsilon,
        "analytic pre-filter complete"
    );

    FilterOutcome {
        expectations,
        mask,
        flagged,
    }
}
