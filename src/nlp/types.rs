// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! NLP solver configuration, result types and the solver seam.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;

use super::problem::ConstrainedProblem;

/// Configuration for the trust-region augmented-Lagrangian solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustRegionConfig {
    /// Maximum augmented-Lagrangian (outer) iterations.
    #[serde(default = "default_max_outer_iterations")]
    pub max_outer_iterations: usize,
    /// Maximum trust-region steps per outer iteration.
    #[serde(default = "default_max_inner_iterations")]
    pub max_inner_iterations: usize,
    /// Stationarity tolerance on ‖∇ₓL‖.
    #[serde(default = "default_gradient_tolerance")]
    pub gradient_tolerance: f64,
    /// Largest accepted constraint violation max(0, cⱼ).
    #[serde(default = "default_constraint_tolerance")]
    pub constraint_tolerance: f64,
    /// Initial trust-region radius.
    #[serde(default = "default_initial_radius")]
    pub initial_radius: f64,
    /// Upper bound on the trust-region radius.
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,
    /// Initial penalty parameter.
    #[serde(default = "default_initial_penalty")]
    pub initial_penalty: f64,
    /// Penalty growth factor when the violation stalls.
    #[serde(default = "default_penalty_growth")]
    pub penalty_growth: f64,
    /// Upper bound on the penalty parameter.
    #[serde(default = "default_max_penalty")]
    pub max_penalty: f64,
}

impl Default for TrustRegionConfig {
    fn default() -> Self {
        Self {
            max_outer_iterations: default_max_outer_iterations(),
            max_inner_iterations: default_max_inner_iterations(),
            gradient_tolerance: default_gradient_tolerance(),
            constraint_tolerance: default_constraint_tolerance(),
            initial_radius: default_initial_radius(),
            max_radius: default_max_radius(),
            initial_penalty: default_initial_penalty(),
            penalty_growth: default_penalty_growth(),
            max_penalty: default_max_penalty(),
        }
    }
}

impl TrustRegionConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_outer_iterations == 0 {
            return Err("max_outer_iterations must be > 0".into());
        }
        if self.max_inner_iterations == 0 {
            return Err("max_inner_iterations must be > 0".into());
        }
        if self.gradient_tolerance <= 0.0 {
            return Err("gradient_tolerance must be > 0".into());
        }
        if self.constraint_tolerance <= 0.0 {
            return Err("constraint_tolerance must be > 0".into());
        }
        if self.initial_radius <= 0.0 || self.initial_radius > self.max_radius {
            return Err("initial_radius must be in (0, max_radius]".into());
        }
        if self.initial_penalty <= 0.0 || self.initial_penalty > self.max_penalty {
            return Err("initial_penalty must be in (0, max_penalty]".into());
        }
        if self.penalty_growth <= 1.0 {
            return Err("penalty_growth must be > 1".into());
        }
        Ok(())
    }
}

fn default_max_outer_iterations() -> usize {
    60
}

fn default_max_inner_iterations() -> usize {
    200
}

fn default_gradient_tolerance() -> f64 {
    1e-9
}

fn default_constraint_tolerance() -> f64 {
    1e-9
}

fn default_initial_radius() -> f64 {
    0.25
}

fn default_max_radius() -> f64 {
    2.0
}

fn default_initial_penalty() -> f64 {
    10.0
}

fn default_penalty_growth() -> f64 {
    10.0
}

fn default_max_penalty() -> f64 {
    1e9
}

/// Result of a constrained minimization.
#[derive(Debug, Clone)]
pub struct NlpResult {
    /// Minimizer x*.
    pub x: Array1<f64>,
    /// f(x*).
    pub objective: f64,
    /// c(x*), each entry ≤ 0 at a feasible point.
    pub constraints: Array1<f64>,
    /// Lagrange multipliers (≥ 0).
    pub multipliers: Array1<f64>,
    /// Total trust-region steps taken.
    pub iterations: usize,
    /// Augmented-Lagrangian iterations taken.
    pub outer_iterations: usize,
    /// ‖∇f + Jᵀv‖ at x*.
    pub stationarity: f64,
    /// max(0, maxⱼ cⱼ(x*)).
    pub max_violation: f64,
}

/// A constrained nonlinear optimizer.
pub trait NlpSolver: Send + Sync {
    /// Engine name used in logs.
    fn name(&self) -> &str;

    /// Minimize `problem` from `x0`, failing with `NotConverged` when the
    /// tolerances are not met within the iteration budget.
    fn minimize(
        &self,
        problem: &dyn ConstrainedProblem,
        x0: &Array1<f64>,
    ) -> Result<NlpResult, SolverError>;
}
