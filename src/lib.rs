// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS robustness verifier
//!
//! Certifies whether a quantum classifier's predictions survive bounded
//! perturbations of its input state under a noisy channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Kraus channel + observable O               │
//! │          │ channel::effective_observable    │
//! │          ▼                                  │
//! │  OO = Σ Eᵢ† O Eᵢ                            │
//! ├─────────────────────────────────────────────┤
//! │  filter: analytic necessary condition       │
//! │          │ flagged states only              │
//! │          ▼                                  │
//! ├──────────────────────┬──────────────────────┤
//! │  sdp (mixed states)  │  nlp (pure states)   │
//! │  spectral dual       │  trust region        │
//! ├──────────────────────┴──────────────────────┤
//! │  verify: outcomes → VerificationReport      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`channel`]: Kraus channels and the effective observable
//! - [`filter`]: Analytic pre-filter
//! - [`spectral`]: Secular-equation dual shared by the exact engines
//! - [`sdp`]: Fidelity SDP formulation and solver seam
//! - [`nlp`]: Flip QCQP formulation and trust-region solver
//! - [`verify`]: Orchestration and aggregation
//! - [`adversary`]: Adversarial-example reporting
//! - [`circuit`]: QCNN classifier producing the observable
//! - [`dataset`]: Problem files
//! - [`config`]: Configuration management
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod adversary;
pub mod channel;
pub mod circuit;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod linalg;
pub mod nlp;
pub mod sdp;
pub mod spectral;
pub mod state;
pub mod validation;
pub mod verify;

pub use channel::{effective_observable, KrausChannel};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::analytic_filter;
pub use state::{Dataset, QuantumState, StateMode};
pub use verify::{
    robustness_verifier, verify_mixed, verify_pure, RobustnessVerifier, StateOutcome,
    VerificationReport,
};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
