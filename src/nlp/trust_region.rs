// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trust-region augmented-Lagrangian solver.
//!
//! Outer loop: Powell–Hestenes–Rockafellar augmented Lagrangian for
//! inequality constraints,
//!
//!   L_ρ(x; v) = f(x) + 1/(2ρ) Σⱼ [max(0, vⱼ + ρ·cⱼ(x))² − vⱼ²]
//!
//! with the update vⱼ ← max(0, vⱼ + ρ·cⱼ(x)). Inner loop: trust-region
//! Newton on L_ρ using the exact Hessian and Steihaug–Toint truncated
//! conjugate gradients for the step.
//!
//! Ref: Nocedal & Wright, "Numerical Optimization" (2nd ed.), §4.1, §7.1, §17.4.

use ndarray::{Array1, Array2};

use crate::error::SolverError;

use super::problem::ConstrainedProblem;
use super::types::{NlpResult, NlpSolver, TrustRegionConfig};

/// Minimum ratio of actual to predicted reduction for accepting a step.
const ACCEPT_RATIO: f64 = 1e-4;

/// Radius below which the inner loop stops making progress.
const MIN_RADIUS: f64 = 1e-14;

/// Trust-region constrained optimizer.
#[derive(Debug, Clone, Default)]
pub struct TrustRegionSolver {
    config: TrustRegionConfig,
}

impl TrustRegionSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: TrustRegionConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrustRegionConfig {
        &self.config
    }

    /// Minimize L_ρ(·; v) from `x`, returning the trust-region steps taken.
    fn inner_solve(
        &self,
        problem: &dyn ConstrainedProblem,
        x: &mut Array1<f64>,
        multipliers: &Array1<f64>,
        penalty: f64,
    ) -> usize {
        let mut radius = self.config.initial_radius;
        let mut value = augmented_value(problem, x, multipliers, penalty);

        for step in 0..self.config.max_inner_iterations {
            let (grad, hess) = augmented_derivatives(problem, x, multipliers, penalty);
            let grad_norm = grad.dot(&grad).sqrt();
            if grad_norm <= self.config.gradient_tolerance {
                return step;
            }

            let cg_tol = (grad_norm.sqrt().min(0.5) * grad_norm).max(1e-16);
            let p = steihaug_cg(&hess, &grad, radius, cg_tol);
            let predicted = -(grad.dot(&p) + 0.5 * p.dot(&hess.dot(&p)));
            let candidate = &*x + &p;
            let candidate_value = augmented_value(problem, &candidate, multipliers, penalty);
            let actual = value - candidate_value;

            let ratio = if predicted > 0.0 { actual / predicted } else { -1.0 };
            let step_norm = p.dot(&p).sqrt();

            if ratio < 0.25 {
                radius *= 0.25;
            } else if ratio > 0.75 && step_norm >= 0.99 * radius {
                radius = (2.0 * radius).min(self.config.max_radius);
            }
            if ratio > ACCEPT_RATIO {
                *x = candidate;
                value = candidate_value;
            }
            if radius < MIN_RADIUS {
                return step + 1;
            }
        }
        self.config.max_inner_iterations
    }
}

impl NlpSolver for TrustRegionSolver {
    fn name(&self) -> &str {
        "trust-region"
    }

    fn minimize(
        &self,
        problem: &dyn ConstrainedProblem,
        x0: &Array1<f64>,
    ) -> Result<NlpResult, SolverError> {
        let m = problem.num_constraints();
        let mut x = x0.clone();
        let mut multipliers = Array1::<f64>::zeros(m);
        let mut penalty = self.config.initial_penalty;
        let mut iterations = 0;
        let mut previous_violation = f64::INFINITY;
        let mut stationarity = f64::INFINITY;
        let mut max_violation = f64::INFINITY;

        for outer in 0..self.config.max_outer_iterations {
            iterations += self.inner_solve(problem, &mut x, &multipliers, penalty);

            let c = problem.constraints(&x);
            multipliers = Array1::from_shape_fn(m, |j| (multipliers[j] + penalty * c[j]).max(0.0));
            max_violation = c.iter().fold(0.0f64, |acc, &cj| acc.max(cj));
            stationarity = lagrangian_gradient(problem, &x, &multipliers)
                .iter()
                .fold(0.0f64, |acc, g| acc.max(g.abs()));

            tracing::trace!(
                outer,
                penalty,
                max_violation,
                stationarity,
                "augmented Lagrangian iteration"
            );

            if max_violation <= self.config.constraint_tolerance
                && stationarity <= self.config.gradient_tolerance.sqrt()
            {
                return Ok(NlpResult {
                    objective: problem.objective(&x),
                    constraints: c,
                    x,
                    multipliers,
                    iterations,
                    outer_iterations: outer + 1,
                    stationarity,
                    max_violation,
                });
            }

            if max_violation > 0.25 * previous_violation {
                penalty = (penalty * self.config.penalty_growth).min(self.config.max_penalty);
            }
            previous_violation = max_violation;

            if x.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::NumericDegenerate(
                    "iterate became non-finite".into(),
                ));
            }
        }

        Err(SolverError::NotConverged {
            iterations,
            residual: max_violation.max(stationarity),
        })
    }
}

/// L_ρ(x; v).
fn augmented_value(
    problem: &dyn ConstrainedProblem,
    x: &Array1<f64>,
    multipliers: &Array1<f64>,
    penalty: f64,
) -> f64 {
    let c = problem.constraints(x);
    let shifted: f64 = c
        .iter()
        .zip(multipliers.iter())
        .map(|(&cj, &vj)| {
            let t = (vj + penalty * cj).max(0.0);
            t * t - vj * vj
        })
        .sum();
    problem.objective(x) + shifted / (2.0 * penalty)
}

/// (∇L_ρ, ∇²L_ρ) at x.
fn augmented_derivatives(
    problem: &dyn ConstrainedProblem,
    x: &Array1<f64>,
    multipliers: &Array1<f64>,
    penalty: f64,
) -> (Array1<f64>, Array2<f64>) {
    let c = problem.constraints(x);
    let jac = problem.jacobian(x);
    let m = c.len();
    let weights = Array1::from_shape_fn(m, |j| (multipliers[j] + penalty * c[j]).max(0.0));

    let grad = problem.gradient(x) + jac.t().dot(&weights);

    let mut hess = problem.hessian(x) + problem.constraint_hessian(x, &weights);
    for j in 0..m {
        if multipliers[j] + penalty * c[j] > 0.0 {
            let row = jac.row(j);
            let n = row.len();
            for a in 0..n {
                for b in 0..n {
                    hess[[a, b]] += penalty * row[a] * row[b];
                }
            }
        }
    }
    (grad, hess)
}

/// ∇f + Jᵀv.
fn lagrangian_gradient(
    problem: &dyn ConstrainedProblem,
    x: &Array1<f64>,
    multipliers: &Array1<f64>,
) -> Array1<f64> {
    problem.gradient(x) + problem.jacobian(x).t().dot(multipliers)
}

/// Approximately minimize gᵀp + ½pᵀHp subject to ‖p‖ ≤ Δ.
///
/// Stops on negative curvature or at the boundary by stepping to ‖p‖ = Δ.
pub fn steihaug_cg(hess: &Array2<f64>, grad: &Array1<f64>, radius: f64, tol: f64) -> Array1<f64> {
    let n = grad.len();
    let mut z = Array1::<f64>::zeros(n);
    let mut r = grad.clone();
    let mut d = -grad;
    let mut rr = r.dot(&r);
    if rr.sqrt() < tol {
        return z;
    }

    for _ in 0..(2 * n).max(10) {
        let hd = hess.dot(&d);
        let dhd = d.dot(&hd);
        if dhd <= 0.0 {
            let tau = boundary_step(&z, &d, radius);
            return z + &d * tau;
        }
        let alpha = rr / dhd;
        let z_next = &z + &d * alpha;
        if z_next.dot(&z_next).sqrt() >= radius {
            let tau = boundary_step(&z, &d, radius);
            return z + &d * tau;
        }
        r = r + &hd * alpha;
        let rr_next = r.dot(&r);
        z = z_next;
        if rr_next.sqrt() < tol {
            return z;
        }
        d = -&r + &d * (rr_next / rr);
        rr = rr_next;
    }
    z
}

/// τ ≥ 0 with ‖z + τ·d‖ = Δ.
fn boundary_step(z: &Array1<f64>, d: &Array1<f64>, radius: f64) -> f64 {
    let a = d.dot(d);
    if a == 0.0 {
        return 0.0;
    }
    let b = 2.0 * z.dot(d);
    let c = z.dot(z) - radius * radius;
    let disc = (b * b - 4.0 * a * c).max(0.0);
    (-b + disc.sqrt()) / (2.0 * a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::problem::FlipQcqp;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    /// min ½‖x − a‖² s.t. x₀ ≤ 0
    struct HalfPlane {
        anchor: Array1<f64>,
    }

    impl ConstrainedProblem for HalfPlane {
        fn dim(&self) -> usize {
            self.anchor.len()
        }
        fn num_constraints(&self) -> usize {
            1
        }
        fn objective(&self, x: &Array1<f64>) -> f64 {
            let diff = x - &self.anchor;
            0.5 * diff.dot(&diff)
        }
        fn gradient(&self, x: &Array1<f64>) -> Array1<f64> {
            x - &self.anchor
        }
        fn hessian(&self, _x: &Array1<f64>) -> Array2<f64> {
            Array2::eye(self.dim())
        }
        fn constraints(&self, x: &Array1<f64>) -> Array1<f64> {
            Array1::from(vec![x[0]])
        }
        fn jacobian(&self, _x: &Array1<f64>) -> Array2<f64> {
            let mut j = Array2::zeros((1, self.dim()));
            j[[0, 0]] = 1.0;
            j
        }
        fn constraint_hessian(&self, _x: &Array1<f64>, _v: &Array1<f64>) -> Array2<f64> {
            Array2::zeros((self.dim(), self.dim()))
        }
    }

    #[test]
    fn test_steihaug_newton_step_inside_region() {
        let h = Array2::from_diag(&Array1::from(vec![2.0, 4.0]));
        let g = Array1::from(vec![2.0, 4.0]);
        let p = steihaug_cg(&h, &g, 10.0, 1e-12);
        assert_relative_eq!(p[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_steihaug_negative_curvature_hits_boundary() {
        let h = Array2::from_diag(&Array1::from(vec![-1.0, 1.0]));
        let g = Array1::from(vec![1.0, 0.0]);
        let p = steihaug_cg(&h, &g, 0.5, 1e-12);
        assert_relative_eq!(p.dot(&p).sqrt(), 0.5, epsilon = 1e-12);
        assert!(p[0] < 0.0);
    }

    #[test]
    fn test_projection_onto_half_plane() {
        let problem = HalfPlane {
            anchor: Array1::from(vec![1.0, 2.0]),
        };
        let result = TrustRegionSolver::default()
            .minimize(&problem, &Array1::from(vec![1.0, 2.0]))
            .unwrap();
        assert_relative_eq!(result.x[0], 0.0, epsilon = 1e-8);
        assert_relative_eq!(result.x[1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(result.multipliers[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_qubit_flip_matches_closed_form() {
        // ψ = (cos θ, sin θ), θ = π/4 − α, OO = |0⟩⟨0|, label 1: loss = sin²α
        let solver = TrustRegionSolver::default();
        for alpha in [0.05, 0.2, 0.5] {
            let theta = FRAC_PI_4 - alpha;
            let psi = Array1::from(vec![theta.cos(), theta.sin()]);
            let oo = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 0.0]).unwrap();
            let problem = FlipQcqp::new(psi.clone(), oo, 1);
            let result = solver.minimize(&problem, &psi).unwrap();

            assert_relative_eq!(result.objective, alpha.sin().powi(2), epsilon = 1e-6);
            assert_relative_eq!(result.x.dot(&result.x), 1.0, epsilon = 1e-7);
            assert!(problem.observable_value(&result.x) <= 0.5 + 1e-7);
        }
    }

    #[test]
    fn test_feasible_start_stays_put() {
        // Already on the label-0 side of the boundary for label 0's flip
        let psi = Array1::from(vec![0.9f64.sqrt(), 0.1f64.sqrt()]);
        let oo = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        let problem = FlipQcqp::new(psi.clone(), oo, 0);
        let result = TrustRegionSolver::default()
            .minimize(&problem, &psi)
            .unwrap();
        assert_relative_eq!(result.objective, 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let config = TrustRegionConfig {
            max_outer_iterations: 1,
            max_inner_iterations: 1,
            ..TrustRegionConfig::default()
        };
        let theta = FRAC_PI_4 - 0.5;
        let psi = Array1::from(vec![theta.cos(), theta.sin()]);
        let oo = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 0.0]).unwrap();
        let problem = FlipQcqp::new(psi.clone(), oo, 1);
        let err = TrustRegionSolver::new(config)
            .unwrap()
            .minimize(&problem, &psi)
            .unwrap_err();
        assert!(matches!(err, SolverError::NotConverged { .. }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TrustRegionConfig {
            penalty_growth: 1.0,
            ..TrustRegionConfig::default()
        };
        assert!(TrustRegionSolver::new(config).is_err());
    }
}
