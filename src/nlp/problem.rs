// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Constrained problems with exact derivatives.

use ndarray::{Array1, Array2};

/// A smooth problem `min f(x)  s.t.  c(x) ≤ 0` with analytic derivatives.
pub trait ConstrainedProblem {
    /// Number of variables n.
    fn dim(&self) -> usize;
    /// Number of inequality constraints m.
    fn num_constraints(&self) -> usize;
    fn objective(&self, x: &Array1<f64>) -> f64;
    /// ∇f (length n).
    fn gradient(&self, x: &Array1<f64>) -> Array1<f64>;
    /// ∇²f (n × n).
    fn hessian(&self, x: &Array1<f64>) -> Array2<f64>;
    /// c(x) (length m).
    fn constraints(&self, x: &Array1<f64>) -> Array1<f64>;
    /// Jacobian of c (m × n).
    fn jacobian(&self, x: &Array1<f64>) -> Array2<f64>;
    /// Σⱼ vⱼ·∇²cⱼ(x) (n × n).
    fn constraint_hessian(&self, x: &Array1<f64>, v: &Array1<f64>) -> Array2<f64>;
}

/// Pure-state decision-flip QCQP.
///
/// ```text
/// min  1 − φᵀAφ,  A = ψψᵀ
/// s.t. s·(0.5 − φᵀ·OO·φ) ≤ 0      s = +1 (ℓ = 0), −1 (ℓ = 1)
///      φᵀφ − 1 ≤ 0
///      1 − φᵀφ ≤ 0
/// ```
#[derive(Debug, Clone)]
pub struct FlipQcqp {
    target: Array1<f64>,
    observable: Array2<f64>,
    label: u8,
}

impl FlipQcqp {
    /// `target` is ψ, `observable` the (real symmetric) OO.
    pub fn new(target: Array1<f64>, observable: Array2<f64>, label: u8) -> Self {
        Self {
            target,
            observable,
            label,
        }
    }

    pub fn target(&self) -> &Array1<f64> {
        &self.target
    }

    pub fn observable(&self) -> &Array2<f64> {
        &self.observable
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    fn side(&self) -> f64 {
        if self.label == 0 {
            1.0
        } else {
            -1.0
        }
    }

    /// φᵀ·OO·φ
    pub fn observable_value(&self, x: &Array1<f64>) -> f64 {
        x.dot(&self.observable.dot(x))
    }
}

impl ConstrainedProblem for FlipQcqp {
    fn dim(&self) -> usize {
        self.target.len()
    }

    fn num_constraints(&self) -> usize {
        3
    }

    fn objective(&self, x: &Array1<f64>) -> f64 {
        let overlap = self.target.dot(x);
        1.0 - overlap * overlap
    }

    fn gradient(&self, x: &Array1<f64>) -> Array1<f64> {
        // −2·A·φ
        let overlap = self.target.dot(x);
        self.target.mapv(|t| -2.0 * overlap * t)
    }

    fn hessian(&self, _x: &Array1<f64>) -> Array2<f64> {
        let n = self.dim();
        Array2::from_shape_fn((n, n), |(i, j)| -2.0 * self.target[i] * self.target[j])
    }

    fn constraints(&self, x: &Array1<f64>) -> Array1<f64> {
        let norm_sq = x.dot(x);
        Array1::from(vec![
            self.side() * (0.5 - self.observable_value(x)),
            norm_sq - 1.0,
            1.0 - norm_sq,
        ])
    }

    fn jacobian(&self, x: &Array1<f64>) -> Array2<f64> {
        let n = self.dim();
        let oo_x = self.observable.dot(x);
        let s = self.side();
        let mut jac = Array2::zeros((3, n));
        for i in 0..n {
            jac[[0, i]] = -2.0 * s * oo_x[i];
            jac[[1, i]] = 2.0 * x[i];
            jac[[2, i]] = -2.0 * x[i];
        }
        jac
    }

    fn constraint_hessian(&self, _x: &Array1<f64>, v: &Array1<f64>) -> Array2<f64> {
        let n = self.dim();
        let mut h = &self.observable * (-2.0 * self.side() * v[0]);
        let diag = 2.0 * (v[1] - v[2]);
        for i in 0..n {
            h[[i, i]] += diag;
        }
        h
    }
}
