// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures: seeded random states, observables and channels.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::channel::KrausChannel;
use crate::linalg::{c, dagger, trace};

/// |0⟩⟨0| on one qubit.
pub fn projector_zero() -> Array2<Complex64> {
    let mut p = Array2::zeros((2, 2));
    p[[0, 0]] = c(1.0);
    p
}

/// cos θ|0⟩ + sin θ|1⟩.
pub fn real_qubit(theta: f64) -> Array1<Complex64> {
    Array1::from(vec![c(theta.cos()), c(theta.sin())])
}

fn random_complex(rng: &mut StdRng) -> Complex64 {
    Complex64::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
}

fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<Complex64> {
    Array2::from_shape_fn((rows, cols), |_| random_complex(rng))
}

/// Modified Gram–Schmidt on the columns of a tall matrix.
fn orthonormal_columns(mut m: Array2<Complex64>) -> Array2<Complex64> {
    for j in 0..m.ncols() {
        for i in 0..j {
            let proj: Complex64 = m
                .column(i)
                .iter()
                .zip(m.column(j).iter())
                .map(|(a, b)| a.conj() * b)
                .sum();
            let qi = m.column(i).to_owned();
            m.column_mut(j).zip_mut_with(&qi, |x, &q| *x -= proj * q);
        }
        let norm = m.column(j).iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        m.column_mut(j).mapv_inplace(|z| z / norm);
    }
    m
}

/// Normalized random state vector.
pub fn random_pure_state(d: usize, seed: u64) -> Array1<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let v: Array1<Complex64> = (0..d).map(|_| random_complex(&mut rng)).collect();
    let norm = v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    v.mapv(|z| z / norm)
}

/// Random density matrix of the given rank, ρ = GG†/tr(GG†).
pub fn random_density_matrix(d: usize, rank: usize, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let g = random_matrix(d, rank, &mut rng);
    let rho = g.dot(&dagger(&g));
    let tr = trace(&rho);
    rho.mapv(|z| z / tr)
}

/// Random Hermitian matrix with spectrum in [0, 1].
pub fn random_hermitian_unit_spectrum(d: usize, seed: u64) -> Array2<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let v = orthonormal_columns(random_matrix(d, d, &mut rng));
    let spectrum: Vec<f64> = (0..d).map(|_| rng.random_range(0.0..1.0)).collect();
    let scaled = Array2::from_shape_fn((d, d), |(i, j)| v[[i, j]] * spectrum[j]);
    scaled.dot(&dagger(&v))
}

/// Random trace-preserving channel with k Kraus operators.
///
/// Stacks the operators into a (k·d) × d isometry V, so Σ Eᵢ†Eᵢ = V†V = I.
pub fn random_kraus_channel(d: usize, k: usize, seed: u64) -> KrausChannel {
    let mut rng = StdRng::seed_from_u64(seed);
    let v = orthonormal_columns(random_matrix(k * d, d, &mut rng));
    let operators = (0..k)
        .map(|i| v.slice(ndarray::s![i * d..(i + 1) * d, ..]).to_owned())
        .collect();
    KrausChannel::new(operators)
}
