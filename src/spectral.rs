// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spectral dual engine for the decision-flip fidelity problems.
//!
//! Both exact verifiers reduce to the same problem. Given a factor W of the
//! input state (ρ = W·W†, or W = ψ for a pure state) and the flip operator
//! B = s·(OO − ½I) with s = +1 for label 0 and s = −1 for label 1, find
//!
//!   p* = max |⟨W, M⟩|²  subject to  ‖M‖ = 1,  tr(M† B M) ≥ 0
//!
//! over d × r matrices M. By Uhlmann's theorem p* is the squared fidelity
//! between ρ and the closest state σ = M·M† on the other side of the
//! decision boundary.
//!
//! Writing B = V·diag(β)·V† and Y = V†·W, strong duality gives
//!
//!   p* = min_{λ ≥ 0} g(λ),  g(λ) = λ_max(vec(Y)·vec(Y)† + λ·diag(β) ⊗ I)
//!
//! and the largest eigenvalue solves the secular equation
//!
//!   Σⱼ wⱼ / (μ − λβⱼ) = 1,  wⱼ = ‖Yⱼ‖² = ⟨bⱼ|ρ|bⱼ⟩.
//!
//! g is convex with g'(λ) = tr(M† B M) at the top eigenvector, so λ* is
//! found by bisection on the sign of the constraint value. The primal
//! optimum is recovered in closed form, Mⱼ ∝ Yⱼ / (μ* − λ*βⱼ).
//!
//! Ref: Uhlmann, Rep. Math. Phys. 9, 273 (1976);
//!      Golub, SIAM Rev. 15, 318 (1973) (secular equation).

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::linalg::{c, dagger, hermitian_eigh, identity};

/// Tuning knobs of the spectral engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Bisection steps for the secular root μ(λ)
    #[serde(default = "default_secular_iterations")]
    pub secular_iterations: usize,

    /// Bisection steps for the dual multiplier λ*
    #[serde(default = "default_dual_iterations")]
    pub dual_iterations: usize,

    /// Largest accepted |primal − dual| in squared fidelity
    #[serde(default = "default_gap_tolerance")]
    pub gap_tolerance: f64,

    /// Re-check the returned optimum against the problem constraints
    #[serde(default = "default_check_certificate")]
    pub check_certificate: bool,

    /// Tolerance for trace, decision-side and PSD checks
    #[serde(default = "default_certificate_tolerance")]
    pub certificate_tolerance: f64,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            secular_iterations: default_secular_iterations(),
            dual_iterations: default_dual_iterations(),
            gap_tolerance: default_gap_tolerance(),
            check_certificate: default_check_certificate(),
            certificate_tolerance: default_certificate_tolerance(),
        }
    }
}

impl SpectralConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.secular_iterations == 0 {
            return Err("secular_iterations must be > 0".into());
        }
        if self.dual_iterations == 0 {
            return Err("dual_iterations must be > 0".into());
        }
        if self.gap_tolerance <= 0.0 {
            return Err("gap_tolerance must be > 0".into());
        }
        if self.certificate_tolerance <= 0.0 {
            return Err("certificate_tolerance must be > 0".into());
        }
        Ok(())
    }
}

fn default_secular_iterations() -> usize {
    200
}

fn default_dual_iterations() -> usize {
    200
}

fn default_gap_tolerance() -> f64 {
    1e-6
}

fn default_check_certificate() -> bool {
    true
}

fn default_certificate_tolerance() -> f64 {
    1e-7
}

/// Optimum of the flip problem.
#[derive(Debug, Clone)]
pub struct DualSolution {
    /// Primal value |⟨W, M*⟩|² (squared fidelity)
    pub overlap: f64,
    /// Dual value g(λ*)
    pub dual_value: f64,
    /// Optimal multiplier λ*
    pub multiplier: f64,
    /// Unit-norm optimizer M* (d × r), phased so that ⟨W, M*⟩ ≥ 0
    pub optimizer: Array2<Complex64>,
}

/// Flip operator B = s·(OO − ½I): tr(B·σ) ≥ 0 iff σ is classified
/// opposite to `label`.
pub fn flip_operator(effective_observable: &Array2<Complex64>, label: u8) -> Array2<Complex64> {
    let d = effective_observable.nrows();
    let shifted = effective_observable - &(identity(d) * c(0.5));
    if label == 0 {
        shifted
    } else {
        -shifted
    }
}

/// Eigen-coordinates of the problem: β ascending, Y = V†·W, wⱼ = ‖Yⱼ‖².
struct Coordinates {
    betas: Array1<f64>,
    basis: Array2<Complex64>,
    rows: Array2<Complex64>,
    weights: Vec<f64>,
}

impl Coordinates {
    fn new(factor: &Array2<Complex64>, flip: &Array2<Complex64>) -> Self {
        let (betas, basis) = hermitian_eigh(flip);
        let rows = dagger(&basis).dot(factor);
        let weights = rows
            .rows()
            .into_iter()
            .map(|r| r.iter().map(|z| z.norm_sqr()).sum())
            .collect();
        Self {
            betas,
            basis,
            rows,
            weights,
        }
    }

    fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Constraint value Σⱼ βⱼ‖Yⱼ‖² of the unperturbed state.
    fn initial_constraint(&self) -> f64 {
        self.betas
            .iter()
            .zip(&self.weights)
            .map(|(b, w)| b * w)
            .sum()
    }

    /// Largest β among rows carrying weight.
    fn supported_beta_max(&self, floor: f64) -> f64 {
        self.betas
            .iter()
            .zip(&self.weights)
            .filter(|(_, &w)| w > floor)
            .map(|(&b, _)| b)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Solve the flip problem for factor W (d × r) and flip operator B (d × d).
pub fn maximize_overlap(
    factor: &Array2<Complex64>,
    flip: &Array2<Complex64>,
    config: &SpectralConfig,
) -> Result<DualSolution, SolverError> {
    let coords = Coordinates::new(factor, flip);
    let d = coords.betas.len();
    if d == 0 {
        return Err(SolverError::NumericDegenerate("empty problem".into()));
    }
    let total = coords.total_weight();
    if total <= 0.0 || !total.is_finite() {
        return Err(SolverError::NumericDegenerate(format!(
            "state has non-positive norm {total:.3e}"
        )));
    }

    let beta_scale = coords.betas.iter().fold(0.0f64, |m, b| m.max(b.abs()));
    let tol = 1e-12 * beta_scale.max(1.0);
    let beta_max = coords.betas[d - 1];

    if beta_max < -tol {
        return Err(SolverError::Infeasible(format!(
            "no state crosses the decision boundary (largest flip eigenvalue {beta_max:.3e})"
        )));
    }

    // Already on the target side: σ = ρ
    if coords.initial_constraint() >= 0.0 {
        let optimizer = factor.mapv(|z| z / total.sqrt());
        return finish(&coords, factor, optimizer, 0.0, total, config);
    }

    if beta_max <= tol {
        // Only the boundary itself is reachable: project onto the null block
        return boundary_projection(&coords, factor, tol, total, config);
    }

    let floor = 1e-15 * total;
    let supported_max = coords.supported_beta_max(floor);

    // g(λ) ≥ λ·β_max and g(0) = total bound λ* to [0, total/β_max]
    let mut lo = 0.0;
    let mut hi = total / beta_max;
    for _ in 0..config.dual_iterations {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let mu = secular_root(&coords, mid, supported_max, floor, config.secular_iterations);
        if mu <= mid * beta_max {
            // Past the kink, g grows with slope β_max
            hi = mid;
            continue;
        }
        if constraint_at(&coords, mid, mu, floor) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let lambda = hi;
    let mu_secular = secular_root(&coords, lambda, supported_max, floor, config.secular_iterations);
    let dual_value = mu_secular.max(lambda * beta_max);

    // Mⱼ = Yⱼ / (μ − λβⱼ), then repair the constraint along the β_max row
    let r = factor.ncols();
    let mut coeffs = Array2::<Complex64>::zeros((d, r));
    for j in 0..d {
        if coords.weights[j] <= floor {
            continue;
        }
        let denom = dual_value - lambda * coords.betas[j];
        if denom <= 0.0 {
            continue;
        }
        let row = coords.rows.row(j).mapv(|z| z / denom);
        coeffs.row_mut(j).assign(&row);
    }
    repair_constraint(&coords, &mut coeffs);

    let optimizer = normalize(&coords.basis.dot(&coeffs))?;
    finish(&coords, factor, optimizer, lambda, dual_value, config)
}

/// μ(λ): largest root of Σ wⱼ/(μ − λβⱼ) = 1.
fn secular_root(
    coords: &Coordinates,
    lambda: f64,
    supported_max: f64,
    floor: f64,
    iterations: usize,
) -> f64 {
    let total = coords.total_weight();
    let pole = lambda * supported_max;
    let mut lo = pole;
    let mut hi = pole + total;
    for _ in 0..iterations {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f: f64 = coords
            .betas
            .iter()
            .zip(&coords.weights)
            .filter(|(_, &w)| w > floor)
            .map(|(&b, &w)| w / (mid - lambda * b))
            .sum();
        if f > 1.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// Σⱼ βⱼ·wⱼ/(μ − λβⱼ)², the sign of g'(λ).
fn constraint_at(coords: &Coordinates, lambda: f64, mu: f64, floor: f64) -> f64 {
    coords
        .betas
        .iter()
        .zip(&coords.weights)
        .filter(|(_, &w)| w > floor)
        .map(|(&b, &w)| {
            let denom = mu - lambda * b;
            b * w / (denom * denom)
        })
        .sum()
}

/// Raise the β_max row until Σ βⱼ‖Cⱼ‖² = 0 when it is negative.
fn repair_constraint(coords: &Coordinates, coeffs: &mut Array2<Complex64>) {
    let d = coords.betas.len();
    let t = d - 1;
    let beta_t = coords.betas[t];
    let rest: f64 = (0..t)
        .map(|j| coords.betas[j] * coeffs.row(j).iter().map(|z| z.norm_sqr()).sum::<f64>())
        .sum();
    let current: f64 = coeffs.row(t).iter().map(|z| z.norm_sqr()).sum();
    if rest + beta_t * current >= 0.0 || beta_t <= 0.0 {
        return;
    }

    let magnitude = (-rest / beta_t).sqrt();
    let y_t = coords.rows.row(t);
    let y_norm: f64 = y_t.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    let mut row = Array1::<Complex64>::zeros(coeffs.ncols());
    if y_norm > 0.0 {
        row.assign(&y_t.mapv(|z| z * (magnitude / y_norm)));
    } else {
        row[0] = c(magnitude);
    }
    coeffs.row_mut(t).assign(&row);
}

fn boundary_projection(
    coords: &Coordinates,
    factor: &Array2<Complex64>,
    tol: f64,
    total: f64,
    config: &SpectralConfig,
) -> Result<DualSolution, SolverError> {
    let d = coords.betas.len();
    let mut coeffs = Array2::<Complex64>::zeros(coords.rows.dim());
    for j in 0..d {
        if coords.betas[j] >= -tol {
            coeffs.row_mut(j).assign(&coords.rows.row(j));
        }
    }
    let weight: f64 = coeffs.iter().map(|z| z.norm_sqr()).sum();
    if weight <= 1e-15 * total {
        coeffs[[d - 1, 0]] = c(1.0);
    }
    let optimizer = normalize(&coords.basis.dot(&coeffs))?;
    finish(coords, factor, optimizer, f64::INFINITY, weight, config)
}

fn normalize(m: &Array2<Complex64>) -> Result<Array2<Complex64>, SolverError> {
    let norm: f64 = m.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    if norm <= 1e-300 || !norm.is_finite() {
        return Err(SolverError::NumericDegenerate(format!(
            "optimizer norm {norm:.3e}"
        )));
    }
    Ok(m.mapv(|z| z / norm))
}

/// Phase-align M, compute the primal value and check the duality gap.
fn finish(
    coords: &Coordinates,
    factor: &Array2<Complex64>,
    optimizer: Array2<Complex64>,
    multiplier: f64,
    dual_value: f64,
    config: &SpectralConfig,
) -> Result<DualSolution, SolverError> {
    let inner: Complex64 = factor
        .iter()
        .zip(optimizer.iter())
        .map(|(w, m)| w.conj() * m)
        .sum();
    let phase = if inner.norm() > 0.0 {
        inner.conj() / inner.norm()
    } else {
        c(1.0)
    };
    let optimizer = optimizer.mapv(|z| z * phase);
    let overlap = inner.norm_sqr();

    if (overlap - dual_value).abs() > config.gap_tolerance {
        return Err(SolverError::DualityGap {
            primal: overlap,
            dual: dual_value,
        });
    }

    tracing::trace!(
        overlap,
        dual_value,
        multiplier,
        dim = coords.betas.len(),
        "spectral flip problem solved"
    );

    Ok(DualSolution {
        overlap,
        dual_value,
        multiplier,
        optimizer,
    })
}
