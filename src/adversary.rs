// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adversarial-example reporting.
//!
//! When the pure-state verifier proves a state non-robust, the worst-case
//! perturbation it found can be handed to an [`AdversaryReporter`]. Two
//! reporters ship with the crate:
//!
//! - [`PgmReporter`] renders original, scaled difference and adversarial
//!   amplitudes side by side as a grayscale PGM image
//! - [`CollectingReporter`] keeps the examples in memory

use std::fmt::Write as _;
use std::path::PathBuf;

use ndarray::Array1;
use num_complex::Complex64;
use parking_lot::Mutex;

use crate::config::ReportConfig;
use crate::error::{Error, Result};

/// A state proven non-robust together with the perturbation that flips it.
#[derive(Debug, Clone)]
pub struct AdversarialExample {
    /// Position in the dataset
    pub index: usize,
    /// 1-based count among the non-robust states of the run
    pub ordinal: usize,
    pub label: u8,
    pub delta: f64,
    pub original: Array1<Complex64>,
    pub adversarial: Array1<Complex64>,
}

/// Hook invoked for every non-robust pure state.
pub trait AdversaryReporter: Send + Sync {
    fn name(&self) -> &str;

    fn report(&self, example: &AdversarialExample) -> Result<()>;
}

/// Writes `adversarial_example_<ordinal>.pgm` files.
#[derive(Debug, Clone)]
pub struct PgmReporter {
    config: ReportConfig,
}

/// Gray levels of the rendered image.
const MAX_GRAY: u32 = 255;

impl PgmReporter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Output path for the k-th example.
    pub fn path_for(&self, ordinal: usize) -> PathBuf {
        PathBuf::from(&self.config.directory).join(format!("adversarial_example_{}.pgm", ordinal))
    }

    fn grid_side(&self, dim: usize) -> Result<usize> {
        let side = self
            .config
            .grid_side
            .unwrap_or_else(|| (dim as f64).sqrt().ceil() as usize);
        if side * side < dim {
            return Err(Error::Config(format!(
                "report grid side {} cannot hold {} amplitudes",
                side, dim
            )));
        }
        Ok(side)
    }

    /// Render the three panels as an ASCII (P2) graymap.
    ///
    /// Amplitudes fill each `side × side` panel column by column. The
    /// original and adversarial panels share the scale [0, max]; the
    /// difference panel is scaled by `difference_scale` and stretched over
    /// its own range.
    pub fn render(&self, example: &AdversarialExample) -> Result<String> {
        let dim = example.original.len();
        if example.adversarial.len() != dim {
            return Err(Error::Config(format!(
                "adversarial vector has {} amplitudes, original has {}",
                example.adversarial.len(),
                dim
            )));
        }
        let side = self.grid_side(dim)?;

        let original = pixel_values(&example.original);
        let adversarial = pixel_values(&example.adversarial);
        let difference: Vec<f64> = adversarial
            .iter()
            .zip(&original)
            .map(|(a, o)| self.config.difference_scale * (a - o))
            .collect();

        let vmax = original
            .iter()
            .chain(&adversarial)
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let (dmin, dmax) = difference
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let panels = [
            (original.as_slice(), 0.0, vmax),
            (difference.as_slice(), dmin, dmax),
            (adversarial.as_slice(), 0.0, vmax),
        ];

        let width = 3 * side + 2;
        let mut out = String::new();
        let _ = writeln!(out, "P2");
        let _ = writeln!(
            out,
            "# index {} label {} -> {} delta {:e}",
            example.index,
            example.label,
            1 - example.label.min(1),
            example.delta
        );
        let _ = writeln!(out, "{} {}", width, side);
        let _ = writeln!(out, "{}", MAX_GRAY);

        for row in 0..side {
            let mut line = Vec::with_capacity(width);
            for (p, (values, lo, hi)) in panels.iter().enumerate() {
                if p > 0 {
                    line.push(MAX_GRAY.to_string());
                }
                for col in 0..side {
                    let v = values.get(col * side + row).copied().unwrap_or(0.0);
                    line.push(gray(v, *lo, *hi).to_string());
                }
            }
            let _ = writeln!(out, "{}", line.join(" "));
        }
        Ok(out)
    }
}

impl AdversaryReporter for PgmReporter {
    fn name(&self) -> &str {
        "pgm"
    }

    fn report(&self, example: &AdversarialExample) -> Result<()> {
        let image = self.render(example)?;
        std::fs::create_dir_all(&self.config.directory)?;
        let path = self.path_for(example.ordinal);
        std::fs::write(&path, image)?;
        tracing::info!(
            index = example.index,
            delta = example.delta,
            path = %path.display(),
            "adversarial example written"
        );
        Ok(())
    }
}

/// Real parts for real amplitudes, moduli otherwise.
fn pixel_values(v: &Array1<Complex64>) -> Vec<f64> {
    if v.iter().all(|z| z.im == 0.0) {
        v.iter().map(|z| z.re).collect()
    } else {
        v.iter().map(|z| z.norm()).collect()
    }
}

fn gray(v: f64, lo: f64, hi: f64) -> u32 {
    if !(hi > lo) || !v.is_finite() {
        return 0;
    }
    let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    (t * MAX_GRAY as f64).round() as u32
}

/// Keeps every reported example in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    examples: Mutex<Vec<AdversarialExample>>,
}

impl CollectingReporter {
    /// Examples reported so far, in report order.
    pub fn examples(&self) -> Vec<AdversarialExample> {
        self.examples.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.examples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.lock().is_empty()
    }
}

impl AdversaryReporter for CollectingReporter {
    fn name(&self) -> &str {
        "collect"
    }

    fn report(&self, example: &AdversarialExample) -> Result<()> {
        self.examples.lock().push(example.clone());
        Ok(())
    }
}
