// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Problem files: channel, observable and labelled states on disk.
//!
//! A problem file is JSON, or YAML when the extension is `.yaml`/`.yml`.
//! Complex numbers are `[re, im]` pairs and matrices are lists of rows:
//!
//! ```yaml
//! mode: pure
//! kraus:
//!   - [[[1, 0], [0, 0]], [[0, 0], [1, 0]]]
//! observable: [[[1, 0], [0, 0]], [[0, 0], [0, 0]]]
//! states:
//!   - [[0.8, 0], [0.6, 0]]
//! labels: [1]
//! ```

use std::path::Path;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::channel::KrausChannel;
use crate::error::{Result, ValidationError};
use crate::state::{Dataset, QuantumState, StateMode};

/// A complex number as `[re, im]`.
pub type ComplexPair = [f64; 2];

/// A complex matrix as a list of rows.
pub type ComplexRows = Vec<Vec<ComplexPair>>;

/// One state: a vector for pure datasets, a matrix for mixed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateData {
    Vector(Vec<ComplexPair>),
    Matrix(ComplexRows),
}

/// Serialized form of a verification problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    pub mode: StateMode,
    pub kraus: Vec<ComplexRows>,
    pub observable: ComplexRows,
    pub states: Vec<StateData>,
    pub labels: Vec<u8>,
}

/// Typed verification problem.
#[derive(Debug, Clone)]
pub struct VerificationProblem {
    pub channel: KrausChannel,
    pub observable: Array2<Complex64>,
    pub dataset: Dataset,
}

impl ProblemFile {
    /// Convert to typed arrays; shapes are checked, physics is not.
    pub fn into_problem(self) -> Result<VerificationProblem> {
        let kraus = self
            .kraus
            .iter()
            .enumerate()
            .map(|(i, rows)| matrix_from_rows(rows, &format!("kraus[{}]", i)))
            .collect::<Result<Vec<_>>>()?;
        let observable = matrix_from_rows(&self.observable, "observable")?;

        let states = self
            .states
            .iter()
            .enumerate()
            .map(|(i, data)| match (self.mode, data) {
                (StateMode::Pure, StateData::Vector(v)) => Ok(QuantumState::Pure(vector(v))),
                (StateMode::Mixed, StateData::Matrix(rows)) => Ok(QuantumState::Mixed(
                    matrix_from_rows(rows, &format!("states[{}]", i))?,
                )),
                (mode, _) => Err(ValidationError::Field {
                    field: format!("states[{}]", i),
                    message: format!("shape does not match {} mode", mode),
                }
                .into()),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VerificationProblem {
            channel: KrausChannel::new(kraus),
            observable,
            dataset: Dataset::new(states, self.labels),
        })
    }

    pub fn from_problem(problem: &VerificationProblem) -> Result<Self> {
        let mode = problem.dataset.mode().ok_or_else(|| ValidationError::Field {
            field: "states".into(),
            message: "dataset is empty".into(),
        })?;
        let states = problem
            .dataset
            .states
            .iter()
            .map(|state| match state {
                QuantumState::Pure(psi) => StateData::Vector(psi.iter().map(pair).collect()),
                QuantumState::Mixed(rho) => StateData::Matrix(rows(rho)),
            })
            .collect();

        Ok(Self {
            mode,
            kraus: problem.channel.operators.iter().map(rows).collect(),
            observable: rows(&problem.observable),
            states,
            labels: problem.dataset.labels.clone(),
        })
    }
}

/// Load a problem file (JSON, or YAML by extension).
pub fn load_problem(path: &Path) -> Result<VerificationProblem> {
    let content = std::fs::read_to_string(path)?;
    let file: ProblemFile = if is_yaml(path) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    tracing::debug!(
        path = %path.display(),
        mode = %file.mode,
        states = file.states.len(),
        kraus = file.kraus.len(),
        "problem file loaded"
    );
    file.into_problem()
}

/// Write a problem file (JSON, or YAML by extension).
pub fn save_problem(path: &Path, problem: &VerificationProblem) -> Result<()> {
    let file = ProblemFile::from_problem(problem)?;
    let content = if is_yaml(path) {
        serde_yaml::to_string(&file)?
    } else {
        serde_json::to_string_pretty(&file)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn vector(entries: &[ComplexPair]) -> Array1<Complex64> {
    entries.iter().map(|&[re, im]| Complex64::new(re, im)).collect()
}

fn matrix_from_rows(rows: &[Vec<ComplexPair>], what: &str) -> Result<Array2<Complex64>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    let mut m = Array2::zeros((nrows, ncols));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != ncols {
            return Err(ValidationError::Dimension {
                what: format!("{} row {}", what, i),
                expected: ncols,
                actual: row.len(),
            }
            .into());
        }
        for (j, &[re, im]) in row.iter().enumerate() {
            m[[i, j]] = Complex64::new(re, im);
        }
    }
    Ok(m)
}

fn pair(z: &Complex64) -> ComplexPair {
    [z.re, z.im]
}

fn rows(m: &Array2<Complex64>) -> ComplexRows {
    m.outer_iter()
        .map(|row| row.iter().map(pair).collect())
        .collect()
}
