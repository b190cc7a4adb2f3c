// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-state verification outcomes.

use crate::error::SolverError;

/// Verdict of the exact verifier for one state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateOutcome {
    /// Flipping the decision costs at least the budget.
    Robust { delta: f64 },
    /// An adversary flips the decision with fidelity loss `delta` below the budget.
    NonRobust { delta: f64 },
    /// The engine produced no usable optimum; never counted as robust.
    Failed(SolverError),
}

impl StateOutcome {
    /// Non-robust iff `delta < threshold`.
    pub fn classify(delta: f64, threshold: f64) -> Self {
        if delta < threshold {
            StateOutcome::NonRobust { delta }
        } else {
            StateOutcome::Robust { delta }
        }
    }

    pub fn is_robust(&self) -> bool {
        matches!(self, StateOutcome::Robust { .. })
    }

    pub fn is_non_robust(&self) -> bool {
        matches!(self, StateOutcome::NonRobust { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StateOutcome::Failed(_))
    }

    /// Fidelity loss of the worst-case perturbation, if one was found.
    pub fn delta(&self) -> Option<f64> {
        match self {
            StateOutcome::Robust { delta } | StateOutcome::NonRobust { delta } => Some(*delta),
            StateOutcome::Failed(_) => None,
        }
    }
}

impl std::fmt::Display for StateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateOutcome::Robust { delta } => write!(f, "robust (delta={:.6e})", delta),
            StateOutcome::NonRobust { delta } => write!(f, "non-robust (delta={:.6e})", delta),
            StateOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Counts reduced from a sequence of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub robust: usize,
    pub non_robust: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a StateOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut acc, outcome| {
                match outcome {
                    StateOutcome::Robust { .. } => acc.robust += 1,
                    StateOutcome::NonRobust { .. } => acc.non_robust += 1,
                    StateOutcome::Failed(_) => acc.failed += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> usize {
        self.robust + self.non_robust + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_strict() {
        assert!(StateOutcome::classify(0.01, 0.01).is_robust());
        assert!(StateOutcome::classify(0.0099, 0.01).is_non_robust());
    }

    #[test]
    fn test_tally() {
        let outcomes = vec![
            StateOutcome::Robust { delta: 0.3 },
            StateOutcome::NonRobust { delta: 0.001 },
            StateOutcome::NonRobust { delta: 0.002 },
            StateOutcome::Failed(SolverError::Infeasible("x".into())),
        ];
        let counts = OutcomeCounts::tally(&outcomes);
        assert_eq!(counts.robust, 1);
        assert_eq!(counts.non_robust, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_delta_and_display() {
        let failed = StateOutcome::Failed(SolverError::NumericDegenerate("zero trace".into()));
        assert_eq!(failed.delta(), None);
        assert!(failed.to_string().starts_with("failed: Numerically degenerate"));
        assert_eq!(StateOutcome::Robust { delta: 0.5 }.delta(), Some(0.5));
    }
}
