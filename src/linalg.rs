// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense complex linear algebra helpers over `ndarray`.
//!
//! The verifier only needs a handful of operations on small Hermitian
//! matrices (d ≤ a few hundred), so they are implemented directly:
//!
//! - [`dagger`], [`trace`], [`expectation`], [`vector_expectation`]
//! - [`hermitian_eigh`]: cyclic complex Jacobi eigensolver
//! - [`real_embedding`]: ℂᵈ quadratic forms as ℝ²ᵈ symmetric forms
//! - [`kron`]: Kronecker product
//!
//! Ref: Golub & Van Loan, "Matrix Computations" (4th ed.), §8.5 (Jacobi methods).

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Maximum number of Jacobi sweeps before giving up on further reduction.
const MAX_SWEEPS: usize = 100;

/// Shorthand for a real-valued complex number.
#[inline]
pub fn c(x: f64) -> Complex64 {
    Complex64::new(x, 0.0)
}

/// Complex identity matrix.
pub fn identity(d: usize) -> Array2<Complex64> {
    Array2::from_diag_elem(d, c(1.0))
}

/// Conjugate transpose (dagger) of a matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Trace of a square matrix.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    (0..m.nrows().min(m.ncols())).map(|i| m[[i, i]]).sum()
}

/// Re tr(A·ρ) without forming the product.
pub fn expectation(a: &Array2<Complex64>, rho: &Array2<Complex64>) -> f64 {
    let d = a.nrows();
    let mut acc = Complex64::new(0.0, 0.0);
    for i in 0..d {
        for k in 0..d {
            acc += a[[i, k]] * rho[[k, i]];
        }
    }
    acc.re
}

/// Re ⟨ψ|A|ψ⟩.
pub fn vector_expectation(a: &Array2<Complex64>, psi: &Array1<Complex64>) -> f64 {
    let a_psi = a.dot(psi);
    psi.iter()
        .zip(a_psi.iter())
        .map(|(p, q)| p.conj() * q)
        .sum::<Complex64>()
        .re
}

/// Largest entry-wise deviation from Hermiticity, max |A − A†|.
pub fn hermiticity_deviation(m: &Array2<Complex64>) -> f64 {
    let d = m.nrows();
    let mut worst = 0.0f64;
    for i in 0..d {
        for j in i..d {
            worst = worst.max((m[[i, j]] - m[[j, i]].conj()).norm());
        }
    }
    worst
}

/// Kronecker product A ⊗ B.
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut out = Array2::zeros((ar * br, ac * bc));
    for i in 0..ar {
        for j in 0..ac {
            let aij = a[[i, j]];
            if aij == Complex64::new(0.0, 0.0) {
                continue;
            }
            for k in 0..br {
                for l in 0..bc {
                    out[[i * br + k, j * bc + l]] = aij * b[[k, l]];
                }
            }
        }
    }
    out
}

/// Real symmetric embedding of a Hermitian matrix.
///
/// For φ = a + i·b, ⟨φ|M|φ⟩ = [a; b]ᵀ · [[Re M, −Im M], [Im M, Re M]] · [a; b].
pub fn real_embedding(m: &Array2<Complex64>) -> Array2<f64> {
    let d = m.nrows();
    let mut out = Array2::zeros((2 * d, 2 * d));
    for i in 0..d {
        for j in 0..d {
            let z = m[[i, j]];
            out[[i, j]] = z.re;
            out[[i, j + d]] = -z.im;
            out[[i + d, j]] = z.im;
            out[[i + d, j + d]] = z.re;
        }
    }
    out
}

/// A state vector as a d × 1 matrix.
pub fn column(v: &Array1<Complex64>) -> Array2<Complex64> {
    Array2::from_shape_fn((v.len(), 1), |(i, _)| v[i])
}

/// Stack real and imaginary parts: a + i·b ↦ [a; b].
pub fn real_stack(v: &Array1<Complex64>) -> Array1<f64> {
    let d = v.len();
    let mut out = Array1::zeros(2 * d);
    for (i, z) in v.iter().enumerate() {
        out[i] = z.re;
        out[i + d] = z.im;
    }
    out
}

/// Eigen-decomposition of a Hermitian matrix.
///
/// Returns eigenvalues in ascending order and the matching orthonormal
/// eigenvectors as columns. Only the upper triangle's Hermitian part is
/// meaningful; the input is symmetrized first.
pub fn hermitian_eigh(m: &Array2<Complex64>) -> (Array1<f64>, Array2<Complex64>) {
    let n = m.nrows();
    assert_eq!(n, m.ncols(), "hermitian_eigh requires a square matrix");

    // Work on the Hermitian part so roundoff asymmetry cannot stall sweeps
    let mut a = Array2::from_shape_fn((n, n), |(i, j)| (m[[i, j]] + m[[j, i]].conj()) * 0.5);
    let mut v = identity(n);

    let scale: f64 = a.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    if n <= 1 || scale == 0.0 {
        let values = Array1::from_iter((0..n).map(|i| a[[i, i]].re));
        return sort_eigenpairs(values, v);
    }
    let threshold = 1e-15 * scale;

    for _sweep in 0..MAX_SWEEPS {
        let off: f64 = off_diagonal_norm(&a);
        if off <= threshold {
            break;
        }
        for p in 0..n - 1 {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                let r = apq.norm();
                if r <= 1e-300 {
                    continue;
                }
                let phase = apq / r; // e^{iφ}
                let app = a[[p, p]].re;
                let aqq = a[[q, q]].re;

                // Real 2×2 Jacobi rotation on [[app, r], [r, aqq]]
                let theta = (aqq - app) / (2.0 * r);
                let t = if theta.abs() > 1e150 {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let cs = 1.0 / (t * t + 1.0).sqrt();
                let sn = t * cs;

                // J = D·R with D = diag(1, e^{-iφ}) on the (p, q) plane
                let jpp = c(cs);
                let jpq = c(sn);
                let jqp = phase.conj() * (-sn);
                let jqq = phase.conj() * cs;

                apply_rotation(&mut a, p, q, jpp, jpq, jqp, jqq);

                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = vkp * jpp + vkq * jqp;
                    v[[k, q]] = vkp * jpq + vkq * jqq;
                }
            }
        }
    }

    let values = Array1::from_iter((0..n).map(|i| a[[i, i]].re));
    sort_eigenpairs(values, v)
}

/// A ← J†·A·J for a rotation J acting on the (p, q) plane.
fn apply_rotation(
    a: &mut Array2<Complex64>,
    p: usize,
    q: usize,
    jpp: Complex64,
    jpq: Complex64,
    jqp: Complex64,
    jqq: Complex64,
) {
    let n = a.nrows();
    // Columns: A·J
    for k in 0..n {
        let akp = a[[k, p]];
        let akq = a[[k, q]];
        a[[k, p]] = akp * jpp + akq * jqp;
        a[[k, q]] = akp * jpq + akq * jqq;
    }
    // Rows: J†·(A·J)
    for k in 0..n {
        let apk = a[[p, k]];
        let aqk = a[[q, k]];
        a[[p, k]] = jpp.conj() * apk + jqp.conj() * aqk;
        a[[q, k]] = jpq.conj() * apk + jqq.conj() * aqk;
    }
    a[[p, q]] = Complex64::new(0.0, 0.0);
    a[[q, p]] = Complex64::new(0.0, 0.0);
    a[[p, p]] = c(a[[p, p]].re);
    a[[q, q]] = c(a[[q, q]].re);
}

fn off_diagonal_norm(a: &Array2<Complex64>) -> f64 {
    let n = a.nrows();
    let mut acc = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                acc += a[[i, j]].norm_sqr();
            }
        }
    }
    acc.sqrt()
}

fn sort_eigenpairs(
    values: Array1<f64>,
    vectors: Array2<Complex64>,
) -> (Array1<f64>, Array2<Complex64>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let sorted_values = Array1::from_iter(order.iter().map(|&i| values[i]));
    let mut sorted_vectors = Array2::zeros((n, n));
    for (col, &src) in order.iter().enumerate() {
        sorted_vectors.column_mut(col).assign(&vectors.column(src));
    }
    (sorted_values, sorted_vectors)
}

/// Smallest eigenvalue of a Hermitian matrix.
pub fn min_eigenvalue(m: &Array2<Complex64>) -> f64 {
    let (values, _) = hermitian_eigh(m);
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Factor a positive-semidefinite matrix as ρ = W·W†.
///
/// Uses the eigen-decomposition ρ = V·diag(p)·V† and W = V·diag(√p);
/// slightly negative eigenvalues from roundoff are clamped to zero.
pub fn psd_factor(rho: &Array2<Complex64>) -> Array2<Complex64> {
    let (values, vectors) = hermitian_eigh(rho);
    let mut w = vectors;
    for (j, &p) in values.iter().enumerate() {
        let s = p.max(0.0).sqrt();
        w.column_mut(j).mapv_inplace(|z| z * s);
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for ((i, j), val) in a.indexed_iter() {
            let diff = (val - b[[i, j]]).norm();
            assert!(
                diff < tol,
                "Mismatch at ({}, {}): {:?} vs {:?} (diff={})",
                i,
                j,
                val,
                b[[i, j]],
                diff
            );
        }
    }

    fn reconstruct(values: &Array1<f64>, vectors: &Array2<Complex64>) -> Array2<Complex64> {
        let n = values.len();
        let mut scaled = vectors.clone();
        for j in 0..n {
            scaled.column_mut(j).mapv_inplace(|z| z * values[j]);
        }
        scaled.dot(&dagger(vectors))
    }

    #[test]
    fn test_eigh_pauli_y() {
        let mut y = Array2::zeros((2, 2));
        y[[0, 1]] = Complex64::new(0.0, -1.0);
        y[[1, 0]] = Complex64::new(0.0, 1.0);
        let (values, vectors) = hermitian_eigh(&y);
        assert_relative_eq!(values[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(values[1], 1.0, epsilon = 1e-12);
        assert_matrix_close(&reconstruct(&values, &vectors), &y, 1e-12);
    }

    #[test]
    fn test_eigh_complex_4x4_reconstructs() {
        let mut m = Array2::zeros((4, 4));
        let entries = [
            (0, 0, 1.0, 0.0),
            (1, 1, -0.5, 0.0),
            (2, 2, 0.25, 0.0),
            (3, 3, 2.0, 0.0),
            (0, 1, 0.3, 0.4),
            (0, 3, -0.2, 0.1),
            (1, 2, 0.0, 0.7),
            (2, 3, 0.5, -0.5),
        ];
        for &(i, j, re, im) in &entries {
            m[[i, j]] = Complex64::new(re, im);
            m[[j, i]] = Complex64::new(re, -im);
        }
        let (values, vectors) = hermitian_eigh(&m);

        // Ascending order
        for k in 1..4 {
            assert!(values[k - 1] <= values[k]);
        }
        // Unitary eigenvectors
        assert_matrix_close(&dagger(&vectors).dot(&vectors), &identity(4), 1e-10);
        // V·Λ·V† = M
        assert_matrix_close(&reconstruct(&values, &vectors), &m, 1e-10);
        // Trace preserved
        assert_relative_eq!(values.sum(), 2.75, epsilon = 1e-10);
    }

    #[test]
    fn test_eigh_degenerate_identity() {
        let (values, vectors) = hermitian_eigh(&identity(3));
        for v in values.iter() {
            assert_relative_eq!(*v, 1.0, epsilon = 1e-14);
        }
        assert_matrix_close(&vectors, &identity(3), 1e-14);
    }

    #[test]
    fn test_psd_factor_reproduces_rho() {
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(0.7);
        rho[[1, 1]] = c(0.3);
        rho[[0, 1]] = Complex64::new(0.1, 0.2);
        rho[[1, 0]] = Complex64::new(0.1, -0.2);
        let w = psd_factor(&rho);
        assert_matrix_close(&w.dot(&dagger(&w)), &rho, 1e-12);
    }

    #[test]
    fn test_expectation_matches_trace_of_product() {
        let mut a = Array2::zeros((2, 2));
        a[[0, 0]] = c(1.0);
        a[[0, 1]] = Complex64::new(0.0, 0.5);
        a[[1, 0]] = Complex64::new(0.0, -0.5);
        let mut rho = Array2::zeros((2, 2));
        rho[[0, 0]] = c(0.5);
        rho[[1, 1]] = c(0.5);
        rho[[0, 1]] = Complex64::new(0.0, 0.5);
        rho[[1, 0]] = Complex64::new(0.0, -0.5);
        let expected = trace(&a.dot(&rho)).re;
        assert_relative_eq!(expectation(&a, &rho), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_real_embedding_preserves_quadratic_form() {
        let mut m = Array2::zeros((2, 2));
        m[[0, 0]] = c(0.2);
        m[[1, 1]] = c(0.9);
        m[[0, 1]] = Complex64::new(0.3, -0.4);
        m[[1, 0]] = Complex64::new(0.3, 0.4);
        let psi = Array1::from(vec![Complex64::new(0.6, 0.1), Complex64::new(-0.2, 0.7)]);
        let x = real_stack(&psi);
        let embedded = real_embedding(&m);
        let quad = x.dot(&embedded.dot(&x));
        assert_relative_eq!(quad, vector_expectation(&m, &psi), epsilon = 1e-14);
    }

    #[test]
    fn test_kron_dimensions_and_entries() {
        let a = identity(2);
        let mut b = Array2::zeros((2, 2));
        b[[0, 1]] = c(1.0);
        b[[1, 0]] = c(1.0);
        let k = kron(&a, &b);
        assert_eq!(k.dim(), (4, 4));
        assert_eq!(k[[0, 1]], c(1.0));
        assert_eq!(k[[2, 3]], c(1.0));
        assert_eq!(k[[0, 3]], c(0.0));
    }

    #[test]
    fn test_hermiticity_deviation() {
        let mut m = identity(2);
        assert_eq!(hermiticity_deviation(&m), 0.0);
        m[[0, 1]] = c(1.0);
        assert_relative_eq!(hermiticity_deviation(&m), 1.0, epsilon = 1e-15);
    }
}
