// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation for verification runs.
//!
//! Everything here runs before any solve: malformed input aborts the run
//! with a [`ValidationError`], while physically suspicious but usable input
//! (incomplete Kraus sets, unnormalized states, a slightly non-Hermitian
//! observable in non-strict mode) only logs a warning.

use ndarray::Array2;
use num_complex::Complex64;

use crate::channel::KrausChannel;
use crate::config::ValidationConfig;
use crate::error::{Result, ValidationError};
use crate::linalg::hermiticity_deviation;
use crate::state::{Dataset, QuantumState};

/// Largest |tr ρ − 1| or |⟨ψ|ψ⟩ − 1| accepted without a warning.
const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Validate channel, observable, dataset and budget of a run.
pub fn validate_problem(
    channel: &KrausChannel,
    observable: &Array2<Complex64>,
    dataset: &Dataset,
    epsilon: f64,
    config: &ValidationConfig,
) -> Result<()> {
    validate_epsilon(epsilon)?;

    if channel.operators.is_empty() {
        return Err(ValidationError::Field {
            field: "kraus".into(),
            message: "channel has no Kraus operators".into(),
        }
        .into());
    }

    let d = observable.nrows();
    for (i, e) in channel.operators.iter().enumerate() {
        if e.nrows() != d {
            return Err(ValidationError::Dimension {
                what: format!("kraus[{}] rows", i),
                expected: d,
                actual: e.nrows(),
            }
            .into());
        }
        if e.ncols() != d {
            return Err(ValidationError::Dimension {
                what: format!("kraus[{}] columns", i),
                expected: d,
                actual: e.ncols(),
            }
            .into());
        }
        if has_non_finite(e.iter()) {
            return Err(ValidationError::Field {
                field: format!("kraus[{}]", i),
                message: "contains NaN or Inf".into(),
            }
            .into());
        }
    }

    let deviation = channel.completeness_deviation();
    if deviation > config.kraus_tolerance {
        tracing::warn!(
            deviation,
            tolerance = config.kraus_tolerance,
            "Kraus operators are not trace preserving"
        );
    }

    validate_dataset(observable, dataset, epsilon, config)
}

/// Validate an (effective) observable against a dataset.
pub fn validate_dataset(
    observable: &Array2<Complex64>,
    dataset: &Dataset,
    epsilon: f64,
    config: &ValidationConfig,
) -> Result<()> {
    validate_epsilon(epsilon)?;
    validate_observable(observable, config)?;
    let d = observable.nrows();

    let n = dataset.len();
    if n == 0 {
        return Err(ValidationError::Field {
            field: "states".into(),
            message: "dataset is empty".into(),
        }
        .into());
    }
    if dataset.labels.len() != n {
        return Err(ValidationError::Dimension {
            what: "labels".into(),
            expected: n,
            actual: dataset.labels.len(),
        }
        .into());
    }
    if n as u64 > config.limits.max_states as u64 {
        return Err(ValidationError::ResourceLimit {
            resource: "states".into(),
            limit: config.limits.max_states as u64,
            requested: n as u64,
        }
        .into());
    }

    let mode = dataset.states[0].mode();
    for (i, state) in dataset.states.iter().enumerate() {
        if state.mode() != mode {
            return Err(ValidationError::Field {
                field: format!("states[{}]", i),
                message: format!("{} state in a {} dataset", state.mode(), mode),
            }
            .into());
        }
        validate_state(i, state, d)?;
    }

    for (i, &label) in dataset.labels.iter().enumerate() {
        if label > 1 {
            return Err(ValidationError::Field {
                field: format!("labels[{}]", i),
                message: format!("label must be 0 or 1, got {}", label),
            }
            .into());
        }
    }

    Ok(())
}

fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !(epsilon > 0.0 && epsilon < 1.0) {
        return Err(ValidationError::Field {
            field: "epsilon".into(),
            message: format!("must be in (0, 1), got {}", epsilon),
        }
        .into());
    }
    Ok(())
}

fn validate_observable(observable: &Array2<Complex64>, config: &ValidationConfig) -> Result<()> {
    let d = observable.nrows();
    if observable.ncols() != d {
        return Err(ValidationError::Dimension {
            what: "observable columns".into(),
            expected: d,
            actual: observable.ncols(),
        }
        .into());
    }
    if d == 0 {
        return Err(ValidationError::Field {
            field: "observable".into(),
            message: "dimension must be greater than 0".into(),
        }
        .into());
    }
    if d as u64 > config.limits.max_dimension as u64 {
        return Err(ValidationError::ResourceLimit {
            resource: "dimension".into(),
            limit: config.limits.max_dimension as u64,
            requested: d as u64,
        }
        .into());
    }
    if has_non_finite(observable.iter()) {
        return Err(ValidationError::Field {
            field: "observable".into(),
            message: "contains NaN or Inf".into(),
        }
        .into());
    }

    let deviation = hermiticity_deviation(observable);
    if deviation > config.hermitian_tolerance {
        if config.strict {
            return Err(ValidationError::PhysicsConstraint(format!(
                "observable is not Hermitian (max |O - O†| = {:.3e})",
                deviation
            ))
            .into());
        }
        tracing::warn!(deviation, "observable is not Hermitian");
    }
    Ok(())
}

fn validate_state(index: usize, state: &QuantumState, d: usize) -> Result<()> {
    if let QuantumState::Mixed(rho) = state {
        if rho.ncols() != rho.nrows() {
            return Err(ValidationError::Dimension {
                what: format!("states[{}] columns", index),
                expected: rho.nrows(),
                actual: rho.ncols(),
            }
            .into());
        }
    }
    if state.dim() != d {
        return Err(ValidationError::Dimension {
            what: format!("states[{}]", index),
            expected: d,
            actual: state.dim(),
        }
        .into());
    }
    if state.has_non_finite() {
        return Err(ValidationError::Field {
            field: format!("states[{}]", index),
            message: "contains NaN or Inf".into(),
        }
        .into());
    }
    let norm = state.norm();
    if (norm - 1.0).abs() > NORMALIZATION_TOLERANCE {
        tracing::warn!(index, norm, "state is not normalized");
    }
    Ok(())
}

fn has_non_finite<'a>(mut values: impl Iterator<Item = &'a Complex64>) -> bool {
    values.any(|z| !z.re.is_finite() || !z.im.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::linalg::{c, identity};
    use crate::test_utils::{projector_zero, real_qubit};
    use ndarray::Array1;

    fn qubit_dataset() -> Dataset {
        Dataset::pure(vec![real_qubit(0.3), real_qubit(1.2)], vec![1, 0])
    }

    fn validation_error(result: Result<()>) -> ValidationError {
        match result {
            Err(Error::Validation(e)) => e,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_problem() {
        let config = ValidationConfig::default();
        assert!(validate_problem(
            &KrausChannel::identity(2),
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config
        )
        .is_ok());
    }

    #[test]
    fn test_epsilon_range() {
        let config = ValidationConfig::default();
        for epsilon in [0.0, 1.0, -0.1, f64::NAN] {
            let e = validation_error(validate_dataset(
                &projector_zero(),
                &qubit_dataset(),
                epsilon,
                &config,
            ));
            assert!(matches!(e, ValidationError::Field { ref field, .. } if field == "epsilon"));
        }
    }

    #[test]
    fn test_kraus_dimension_mismatch() {
        let config = ValidationConfig::default();
        let e = validation_error(validate_problem(
            &KrausChannel::identity(4),
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config,
        ));
        assert_eq!(
            e,
            ValidationError::Dimension {
                what: "kraus[0] rows".into(),
                expected: 2,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_empty_channel() {
        let config = ValidationConfig::default();
        let e = validation_error(validate_problem(
            &KrausChannel::new(Vec::new()),
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config,
        ));
        assert!(matches!(e, ValidationError::Field { ref field, .. } if field == "kraus"));
    }

    #[test]
    fn test_state_dimension_and_labels() {
        let config = ValidationConfig::default();
        let dataset = Dataset::pure(
            vec![real_qubit(0.3), Array1::from(vec![c(1.0), c(0.0), c(0.0)])],
            vec![1, 0],
        );
        let e = validation_error(validate_dataset(&projector_zero(), &dataset, 0.01, &config));
        assert!(matches!(e, ValidationError::Dimension { actual: 3, .. }));

        let dataset = Dataset::pure(vec![real_qubit(0.3)], vec![1, 0]);
        let e = validation_error(validate_dataset(&projector_zero(), &dataset, 0.01, &config));
        assert!(matches!(e, ValidationError::Dimension { ref what, .. } if what == "labels"));

        let dataset = Dataset::pure(vec![real_qubit(0.3)], vec![2]);
        let e = validation_error(validate_dataset(&projector_zero(), &dataset, 0.01, &config));
        assert!(matches!(e, ValidationError::Field { ref field, .. } if field == "labels[0]"));
    }

    #[test]
    fn test_mixed_modes_rejected() {
        let config = ValidationConfig::default();
        let dataset = Dataset::new(
            vec![
                QuantumState::Pure(real_qubit(0.3)),
                QuantumState::Mixed(identity(2) / c(2.0)),
            ],
            vec![1, 0],
        );
        let e = validation_error(validate_dataset(&projector_zero(), &dataset, 0.01, &config));
        assert!(matches!(e, ValidationError::Field { ref field, .. } if field == "states[1]"));
    }

    #[test]
    fn test_non_finite_state() {
        let config = ValidationConfig::default();
        let dataset = Dataset::pure(
            vec![Array1::from(vec![c(f64::NAN), c(0.0)])],
            vec![0],
        );
        assert!(validate_dataset(&projector_zero(), &dataset, 0.01, &config).is_err());
    }

    #[test]
    fn test_hermiticity_strict_and_lenient() {
        let mut observable = projector_zero();
        observable[[0, 1]] = c(0.1);

        let strict = ValidationConfig::default();
        let e = validation_error(validate_dataset(&observable, &qubit_dataset(), 0.01, &strict));
        assert!(matches!(e, ValidationError::PhysicsConstraint(_)));

        let lenient = ValidationConfig {
            strict: false,
            ..ValidationConfig::default()
        };
        assert!(validate_dataset(&observable, &qubit_dataset(), 0.01, &lenient).is_ok());
    }

    #[test]
    fn test_resource_limits() {
        let mut config = ValidationConfig::default();
        config.limits.max_states = 1;
        let e = validation_error(validate_dataset(
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config,
        ));
        assert_eq!(
            e,
            ValidationError::ResourceLimit {
                resource: "states".into(),
                limit: 1,
                requested: 2,
            }
        );

        config.limits.max_states = 10;
        config.limits.max_dimension = 1;
        let e = validation_error(validate_dataset(
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config,
        ));
        assert!(matches!(e, ValidationError::ResourceLimit { ref resource, .. } if resource == "dimension"));
    }

    #[test]
    fn test_incomplete_channel_only_warns() {
        let config = ValidationConfig::default();
        let channel = KrausChannel::new(vec![identity(2) * c(0.5)]);
        assert!(validate_problem(
            &channel,
            &projector_zero(),
            &qubit_dataset(),
            0.01,
            &config
        )
        .is_ok());
    }
}
