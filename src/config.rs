// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the verifier.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. qrobust.yaml file
//! 3. Environment variables (QROBUST_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};
use crate::nlp::TrustRegionConfig;
use crate::spectral::SpectralConfig;
use crate::verify::{AmplitudeMode, PureEngine};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exact-verifier orchestration
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Numerical engine settings
    #[serde(default)]
    pub solver: SolverConfig,

    /// Adversarial-example output
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["qrobust.yaml", "qrobust.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QROBUST_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("QROBUST_PARALLEL") {
            self.verifier.parallel = parse_flag(&val);
        }
        if let Ok(val) = env::var("QROBUST_MAX_THREADS") {
            if let Ok(threads) = val.parse() {
                self.verifier.max_threads = Some(threads);
            }
        }
        if let Ok(val) = env::var("QROBUST_PURE_ENGINE") {
            match val.parse() {
                Ok(engine) => self.verifier.pure_engine = engine,
                Err(e) => tracing::warn!("ignoring QROBUST_PURE_ENGINE: {}", e),
            }
        }
        if let Ok(val) = env::var("QROBUST_AMPLITUDE_MODE") {
            match val.parse() {
                Ok(mode) => self.verifier.amplitude_mode = mode,
                Err(e) => tracing::warn!("ignoring QROBUST_AMPLITUDE_MODE: {}", e),
            }
        }
        if let Ok(val) = env::var("QROBUST_STRICT_VALIDATION") {
            self.validation.strict = parse_flag(&val);
        }
        if let Ok(val) = env::var("QROBUST_ADVERSARY_DIR") {
            self.report.directory = val;
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.verifier.max_threads == Some(0) {
            return Err(Error::Config("max_threads cannot be 0".into()));
        }
        self.solver
            .spectral
            .validate()
            .map_err(|e| Error::Config(format!("solver.spectral: {}", e)))?;
        self.solver
            .trust_region
            .validate()
            .map_err(|e| Error::Config(format!("solver.trust_region: {}", e)))?;
        if !(self.solver.degenerate_tolerance > 0.0) {
            return Err(Error::Config(
                "solver.degenerate_tolerance must be positive".into(),
            ));
        }
        if self.report.grid_side == Some(0) {
            return Err(Error::Config("report.grid_side cannot be 0".into()));
        }
        if !(self.report.difference_scale > 0.0) {
            return Err(Error::Config(
                "report.difference_scale must be positive".into(),
            ));
        }
        if !(self.validation.hermitian_tolerance > 0.0) || !(self.validation.kraus_tolerance > 0.0)
        {
            return Err(Error::Config(
                "validation tolerances must be positive".into(),
            ));
        }
        if self.validation.limits.max_dimension == 0 || self.validation.limits.max_states == 0 {
            return Err(Error::Config("resource limits cannot be 0".into()));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            return Err(Error::Config(format!(
                "unknown log format '{}' (expected json or pretty)",
                self.logging.format
            )));
        }
        if self.verifier.parallel && self.verifier.emit_adversarial_examples {
            tracing::warn!(
                "adversarial examples are written after the parallel solve completes; \
                 output order follows the dataset, not solve completion"
            );
        }
        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Exact-verifier orchestration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Solve flagged states on a rayon pool
    #[serde(default)]
    pub parallel: bool,

    /// Dedicated pool size (global rayon pool when unset)
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Engine for pure states
    #[serde(default)]
    pub pure_engine: PureEngine,

    /// Treatment of complex amplitudes on the pure path
    #[serde(default)]
    pub amplitude_mode: AmplitudeMode,

    /// Render non-robust pure states through the adversary reporter
    #[serde(default)]
    pub emit_adversarial_examples: bool,
}

/// Numerical engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Spectral dual engine (mixed states, optional for pure states)
    #[serde(default)]
    pub spectral: SpectralConfig,

    /// Augmented-Lagrangian trust-region engine (pure states)
    #[serde(default)]
    pub trust_region: TrustRegionConfig,

    /// Normalizers tr(σ*) or φ*·φ* below this are degenerate
    #[serde(default = "default_degenerate_tolerance")]
    pub degenerate_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            spectral: SpectralConfig::default(),
            trust_region: TrustRegionConfig::default(),
            degenerate_tolerance: default_degenerate_tolerance(),
        }
    }
}

pub fn default_degenerate_tolerance() -> f64 {
    1e-12
}

/// Adversarial-example output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output directory for rendered examples
    #[serde(default = "default_report_dir")]
    pub directory: String,

    /// Side of the square amplitude grid (ceil(√d) when unset)
    #[serde(default)]
    pub grid_side: Option<usize>,

    /// Multiplier applied to the amplitude difference panel
    #[serde(default = "default_difference_scale")]
    pub difference_scale: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: default_report_dir(),
            grid_side: None,
            difference_scale: default_difference_scale(),
        }
    }
}

fn default_report_dir() -> String {
    "./adversary_examples".into()
}

fn default_difference_scale() -> f64 {
    1e4
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject non-Hermitian observables instead of warning
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Max-abs deviation of O from O†
    #[serde(default = "default_hermitian_tolerance")]
    pub hermitian_tolerance: f64,

    /// Max-abs deviation of Σ Eᵢ†Eᵢ from I before warning
    #[serde(default = "default_kraus_tolerance")]
    pub kraus_tolerance: f64,

    /// Resource limits
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strict: true,
            hermitian_tolerance: default_hermitian_tolerance(),
            kraus_tolerance: default_kraus_tolerance(),
            limits: ResourceLimits::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hermitian_tolerance() -> f64 {
    1e-8
}

fn default_kraus_tolerance() -> f64 {
    1e-6
}

/// Resource limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum Hilbert space dimension
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// Maximum number of states per run
    #[serde(default = "default_max_states")]
    pub max_states: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            max_states: default_max_states(),
        }
    }
}

fn default_max_dimension() -> u32 {
    1024
}

fn default_max_states() -> u32 {
    100_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.verifier.parallel);
        assert_eq!(config.verifier.pure_engine, PureEngine::TrustRegion);
        assert_eq!(config.verifier.amplitude_mode, AmplitudeMode::RealProjection);
        assert_eq!(config.solver.degenerate_tolerance, 1e-12);
        assert_eq!(config.report.difference_scale, 1e4);
        assert!(config.validation.strict);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad_config = Config::default();
        bad_config.verifier.max_threads = Some(0);
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
verifier:
  parallel: true
  max_threads: 4
  pure_engine: spectral
  amplitude_mode: complex-embedding
solver:
  trust_region:
    max_outer_iterations: 30
report:
  grid_side: 16
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert!(config.verifier.parallel);
        assert_eq!(config.verifier.max_threads, Some(4));
        assert_eq!(config.verifier.pure_engine, PureEngine::Spectral);
        assert_eq!(
            config.verifier.amplitude_mode,
            AmplitudeMode::ComplexEmbedding
        );
        assert_eq!(config.solver.trust_region.max_outer_iterations, 30);
        // Unspecified fields keep their defaults
        assert_eq!(config.solver.trust_region.max_inner_iterations, 200);
        assert_eq!(config.report.grid_side, Some(16));
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        // When a path is provided but doesn't exist, load returns defaults
        let path = std::path::Path::new("/tmp/does_not_exist_qrobust_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert!(!config.verifier.emit_adversarial_examples);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_log_level() {
        let mut config = Config::default();
        std::env::set_var("QROBUST_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.logging.level, "debug");
        std::env::remove_var("QROBUST_LOG_LEVEL");
    }

    #[test]
    fn test_env_override_parallel_and_threads() {
        let mut config = Config::default();
        std::env::set_var("QROBUST_PARALLEL", "1");
        std::env::set_var("QROBUST_MAX_THREADS", "3");
        config.apply_env_overrides();
        assert!(config.verifier.parallel);
        assert_eq!(config.verifier.max_threads, Some(3));
        std::env::remove_var("QROBUST_PARALLEL");
        std::env::remove_var("QROBUST_MAX_THREADS");
    }

    #[test]
    fn test_env_override_engine_and_mode() {
        let mut config = Config::default();
        std::env::set_var("QROBUST_PURE_ENGINE", "spectral");
        std::env::set_var("QROBUST_AMPLITUDE_MODE", "bogus");
        config.apply_env_overrides();
        assert_eq!(config.verifier.pure_engine, PureEngine::Spectral);
        // Unparseable values are ignored
        assert_eq!(config.verifier.amplitude_mode, AmplitudeMode::RealProjection);
        std::env::remove_var("QROBUST_PURE_ENGINE");
        std::env::remove_var("QROBUST_AMPLITUDE_MODE");
    }

    #[test]
    fn test_env_override_strict_validation() {
        let mut config = Config::default();
        std::env::set_var("QROBUST_STRICT_VALIDATION", "false");
        config.apply_env_overrides();
        assert!(!config.validation.strict);
        std::env::remove_var("QROBUST_STRICT_VALIDATION");

        std::env::set_var("QROBUST_STRICT_VALIDATION", "1");
        config.apply_env_overrides();
        assert!(config.validation.strict);
        std::env::remove_var("QROBUST_STRICT_VALIDATION");
    }

    #[test]
    fn test_env_override_adversary_dir() {
        let mut config = Config::default();
        std::env::set_var("QROBUST_ADVERSARY_DIR", "/tmp/adv");
        config.apply_env_overrides();
        assert_eq!(config.report.directory, "/tmp/adv");
        std::env::remove_var("QROBUST_ADVERSARY_DIR");
    }

    #[test]
    fn test_validate_solver_sections() {
        let mut config = Config::default();
        config.solver.trust_region.max_outer_iterations = 0;
        let msg = format!("{}", config.validate().unwrap_err());
        assert!(msg.contains("solver.trust_region"));

        let mut config = Config::default();
        config.solver.degenerate_tolerance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        let msg = format!("{}", config.validate().unwrap_err());
        assert!(msg.contains("log format"));
    }

    #[test]
    fn test_resource_limits_defaults() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_dimension, 1024);
        assert_eq!(limits.max_states, 100_000);
    }
}
