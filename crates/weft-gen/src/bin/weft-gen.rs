// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! weft-gen CLI
//!
//! Generates clients, proxies and controllers for every weft-annotated trait
//! matched by the given patterns.
//!
//! Usage:
//!
//! ```text
//! weft-gen [PATTERNS]... [--cwd DIR] [--out DIR] [--jobs N] [--lenient] [--rustfmt] [--fail-fast] [--continue-on-error]
//! ```
//!
//! Example:
//!
//! ```text
//! weft-gen 'src/**/*.rs' --runtime-crate my_runtime --rustfmt
//! ```

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use weft_gen::{ConfigError, GeneratorConfig, pipeline};

#[derive(Parser)]
#[command(name = "weft-gen", version)]
#[command(about = "Generate durable workflow clients and controllers from annotated traits", long_about = None)]
struct Cli {
    /// Source globs relative to the working directory (default: **/*.rs)
    patterns: Vec<String>,

    /// Working directory
    #[arg(long, env = "WEFT_CWD")]
    cwd: Option<PathBuf>,

    /// Root generated files are written under (default: the working directory)
    #[arg(long = "out", env = "WEFT_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Analyzers running at once per source file
    #[arg(short, long, env = "WEFT_JOBS")]
    jobs: Option<usize>,

    /// Resolve ambiguous declarations instead of rejecting them
    #[arg(long)]
    lenient: bool,

    /// Tag marker
    #[arg(long, env = "WEFT_MARKER")]
    marker: Option<String>,

    /// Path of the runtime crate in generated code
    #[arg(long, env = "WEFT_RUNTIME_CRATE")]
    runtime_crate: Option<String>,

    /// Default HTTP method for service routes
    #[arg(long, env = "WEFT_HTTP_METHOD")]
    http_method: Option<String>,

    /// Format generated files with rustfmt
    #[arg(long)]
    rustfmt: bool,

    /// Stop at the first source file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Keep running the other analyzers of a file after one fails
    #[arg(long)]
    continue_on_error: bool,

    /// Print the extracted service model as JSON instead of generating
    #[arg(long)]
    emit_model: bool,
}

impl Cli {
    fn apply(self, mut config: GeneratorConfig) -> Result<(GeneratorConfig, bool), ConfigError> {
        if let Some(cwd) = self.cwd {
            config.cwd = cwd;
        }
        if self.out_dir.is_some() {
            config.out_dir = self.out_dir;
        }
        if !self.patterns.is_empty() {
            config.patterns = self.patterns;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs.max(1);
        }
        if let Some(marker) = self.marker {
            config.set_marker(marker)?;
        }
        if let Some(runtime_crate) = self.runtime_crate {
            config.runtime_crate = runtime_crate;
        }
        if let Some(method) = self.http_method {
            config.http_method = method.to_ascii_uppercase();
        }
        config.strict &= !self.lenient;
        config.rustfmt |= self.rustfmt;
        config.fail_fast |= self.fail_fast;
        config.continue_on_error |= self.continue_on_error;
        Ok((config, self.emit_model))
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Default to warn if RUST_LOG is not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (config, emit_model) = match GeneratorConfig::from_env().and_then(|base| cli.apply(base)) {
        Ok(applied) => applied,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if emit_model {
        return match emit(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let report = match pipeline::run(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Generation failed: {:#}", anyhow::Error::from(e));
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in &report.diagnostics {
        eprintln!("{}", diagnostic);
    }
    for failure in &report.failures {
        eprintln!("Failed: {}: {}", failure.path, failure.error);
    }

    eprintln!(
        "Processed {} file(s): {} generated, {} warning(s), {} failed",
        report.units,
        report.artifacts.len(),
        report.diagnostics.len(),
        report.failures.len()
    );

    // Written paths go to stdout for scripts to capture
    for path in &report.written {
        println!("{}", path.display());
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn emit(config: &GeneratorConfig) -> anyhow::Result<()> {
    let packages = pipeline::models(config)?;
    println!("{}", serde_json::to_string_pretty(&packages)?);
    Ok(())
}
