// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! qrobust batch driver
//!
//! Runs the robustness verifier over an epsilon sweep and tabulates robust
//! accuracy and verification time.
//!
//! # Usage
//!
//! ```bash
//! # Five budgets 1e-3, 2e-3, ..., 5e-3 on a problem file
//! qrobust verify --data problem.json --epsilon 1e-3 --steps 5
//!
//! # Pure states on a dedicated 8-thread pool, global engine
//! qrobust verify --data mnist.yaml --epsilon 1e-3 --parallel --threads 8 --engine spectral
//!
//! # Print a seeded 8-qubit QCNN as OpenQASM
//! qrobust qasm --qubits 8 --seed 42
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qrobust::circuit::Qcnn;
use qrobust::config::Config;
use qrobust::dataset::load_problem;
use qrobust::state::StateMode;
use qrobust::verify::{AmplitudeMode, PureEngine, RobustnessVerifier, VerificationReport};
use qrobust::{Error, Result, VERSION};

/// Robustness verification for quantum classifiers
#[derive(Parser)]
#[command(name = "qrobust")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Robustness verification for quantum classifiers under noisy channels")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a problem file over an epsilon sweep
    Verify {
        /// Problem file (JSON, or YAML by extension)
        #[arg(short, long)]
        data: PathBuf,

        /// Smallest budget; the sweep uses epsilon·1, ..., epsilon·steps
        #[arg(short, long)]
        epsilon: f64,

        /// Number of budgets in the sweep
        #[arg(short = 'n', long, default_value_t = 1)]
        steps: usize,

        /// Expected state mode of the problem file
        #[arg(long)]
        mode: Option<StateMode>,

        /// Solve flagged states in parallel
        #[arg(long)]
        parallel: bool,

        /// Size of the dedicated thread pool
        #[arg(long)]
        threads: Option<usize>,

        /// Pure-state engine (trust-region, spectral)
        #[arg(long)]
        engine: Option<PureEngine>,

        /// Complex amplitude handling (real-projection, complex-embedding)
        #[arg(long)]
        amplitude_mode: Option<AmplitudeMode>,

        /// Write adversarial examples for non-robust pure states
        #[arg(long)]
        emit_adversarial: bool,

        /// Output directory for adversarial examples
        #[arg(long)]
        adversary_dir: Option<String>,
    },

    /// Print a seeded QCNN classifier as OpenQASM 2.0
    Qasm {
        /// Register size
        #[arg(short, long)]
        qubits: usize,

        /// Parameter seed
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging.level, &config.logging.format);

    match cli.command {
        Commands::Verify {
            data,
            epsilon,
            steps,
            mode,
            parallel,
            threads,
            engine,
            amplitude_mode,
            emit_adversarial,
            adversary_dir,
        } => {
            // Override config with CLI args
            if parallel {
                config.verifier.parallel = true;
            }
            if threads.is_some() {
                config.verifier.max_threads = threads;
            }
            if let Some(engine) = engine {
                config.verifier.pure_engine = engine;
            }
            if let Some(amplitude_mode) = amplitude_mode {
                config.verifier.amplitude_mode = amplitude_mode;
            }
            if emit_adversarial {
                config.verifier.emit_adversarial_examples = true;
            }
            if let Some(dir) = adversary_dir {
                config.report.directory = dir;
            }

            let problem = load_problem(&data)?;
            if let (Some(expected), Some(actual)) = (mode, problem.dataset.mode()) {
                if expected != actual {
                    return Err(Error::Config(format!(
                        "{} holds {} states, --mode requested {}",
                        data.display(),
                        actual,
                        expected
                    )));
                }
            }

            let verifier = RobustnessVerifier::new(config)?;
            info!(
                version = VERSION,
                data = %data.display(),
                states = problem.dataset.len(),
                steps,
                "Starting verification sweep"
            );

            let mut reports = Vec::with_capacity(steps);
            for j in 0..steps {
                let budget = epsilon * (j + 1) as f64;
                reports.push(verifier.verify(
                    &problem.channel,
                    &problem.observable,
                    &problem.dataset,
                    budget,
                )?);
            }

            println!("Robust Accuracy (in Percent)");
            println!(
                "{}",
                render_table(&reports, |r, k| format!("{:.2}", 100.0 * r.robust_accuracy[k]))
            );
            println!("Verification Times (in Seconds)");
            println!(
                "{}",
                render_table(&reports, |r, k| format!("{:.4}", r.check_time[k]))
            );
        }

        Commands::Qasm { qubits, seed } => {
            let qcnn = Qcnn::with_seed(qubits, seed).map_err(Error::Config)?;
            println!("{}", qcnn.to_qasm());
        }

        Commands::Config => {
            // Show effective configuration
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => {
            // Validate configuration
            match config.validate() {
                Ok(()) => {
                    println!("Configuration is valid");
                }
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

/// One column per budget, rows "Robust Bound" and "Robustness Algorithm".
fn render_table(
    reports: &[VerificationReport],
    cell: impl Fn(&VerificationReport, usize) -> String,
) -> String {
    let mut columns: Vec<Vec<String>> = vec![vec![
        "epsilon".into(),
        "Robust Bound".into(),
        "Robustness Algorithm".into(),
    ]];
    for report in reports {
        columns.push(vec![
            format!("{:.6e}", report.epsilon),
            cell(report, 0),
            cell(report, 1),
        ]);
    }

    let widths: Vec<usize> = columns
        .iter()
        .map(|col| col.iter().map(|s| s.chars().count()).max().unwrap_or(0))
        .collect();
    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{}+", border);

    let mut lines = vec![border.clone()];
    for row in 0..3 {
        let cells: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| format!(" {:^w$} ", col[row], w = w))
            .collect();
        lines.push(format!("|{}|", cells.join("|")));
        if row == 0 {
            lines.push(border.clone());
        }
    }
    lines.push(border);
    lines.join("\n")
}
