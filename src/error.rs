// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the robustness verifier.

use std::fmt;

/// Result type alias for verifier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Malformed input rejected at the boundary
    Validation(ValidationError),
    /// Numerical engine failure that escaped per-state handling
    Solver(SolverError),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Solver(e) => write!(f, "Solver error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Solver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<SolverError> for Error {
    fn from(e: SolverError) -> Self {
        Error::Solver(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Failures of the exact (SDP / NLP) engines for a single state.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// No state on the other side of the decision boundary exists
    Infeasible(String),
    /// Iteration budget exhausted before the tolerances were met
    NotConverged { iterations: usize, residual: f64 },
    /// Primal and dual values disagree beyond tolerance
    DualityGap { primal: f64, dual: f64 },
    /// Normalization of the optimum is (close to) zero
    NumericDegenerate(String),
    /// Returned optimum does not satisfy the problem constraints
    CertificateViolation(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::Infeasible(msg) => write!(f, "Infeasible problem: {}", msg),
            SolverError::NotConverged {
                iterations,
                residual,
            } => write!(
                f,
                "Not converged after {} iterations (residual {:.3e})",
                iterations, residual
            ),
            SolverError::DualityGap { primal, dual } => write!(
                f,
                "Duality gap too large: primal={:.6e}, dual={:.6e}",
                primal, dual
            ),
            SolverError::NumericDegenerate(msg) => write!(f, "Numerically degenerate: {}", msg),
            SolverError::CertificateViolation(msg) => {
                write!(f, "Certificate violation: {}", msg)
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Validation errors (malformed input).
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field validation failed
    Field { field: String, message: String },
    /// Array dimensions disagree
    Dimension {
        what: String,
        expected: usize,
        actual: usize,
    },
    /// Physics constraint violated
    PhysicsConstraint(String),
    /// Resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Field { field, message } => {
                write!(f, "Field '{}': {}", field, message)
            }
            ValidationError::Dimension {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, got {}",
                    what, expected, actual
                )
            }
            ValidationError::PhysicsConstraint(msg) => {
                write!(f, "Physics constraint violated: {}", msg)
            }
            ValidationError::ResourceLimit {
                resource,
                limit,
                requested,
            } => {
                write!(
                    f,
                    "Resource limit exceeded for {}: limit={}, requested={}",
                    resource, limit, requested
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
