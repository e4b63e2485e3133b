// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end generation run: load, analyze, generate, write.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span};

use weft_analysis::{Diagnostic, Runner, WalkOptions, analyzer};
use weft_spec::{Package, ServiceExtractor, SourceFile, load_units};

use crate::artifact::{Artifact, write_artifacts};
use crate::config::GeneratorConfig;
use crate::error::PipelineError;
use crate::generator::{Generator, analyzers};

/// A unit that failed while failures were not fatal.
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    /// Source path of the unit.
    pub path: String,
    /// Error chain, outermost first.
    pub error: String,
}

/// Outcome of a generation run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Number of source files processed.
    pub units: usize,
    /// Artifacts produced, in unit order.
    pub artifacts: Vec<Artifact>,
    /// Full paths of the written files.
    pub written: Vec<PathBuf>,
    /// Diagnostics of every unit, in unit order.
    pub diagnostics: Vec<Diagnostic>,
    /// Units that failed.
    pub failures: Vec<UnitFailure>,
}

impl RunReport {
    /// Whether every unit succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn walk_options(config: &GeneratorConfig) -> WalkOptions {
    WalkOptions {
        parallelism: config.jobs,
        continue_on_error: config.continue_on_error,
    }
}

/// Runs generation over every configured source file and writes the results.
///
/// Units are processed one after the other. A failing unit aborts the run
/// when `fail_fast` is set; otherwise it is logged, recorded in the report and
/// skipped, and the other units are still generated and written. With
/// `continue_on_error`, the other analyzers of a failing unit still run and
/// their diagnostics are kept.
///
/// Two units generating the same output path abort the run before anything
/// is written.
pub fn run(config: &GeneratorConfig) -> Result<RunReport, PipelineError> {
    let started = Instant::now();
    let units = load_units(&config.load_config())?;
    let runner = Runner::new(analyzers(&config.gen_options()))?;
    let options = walk_options(config);

    let mut report = RunReport {
        units: units.len(),
        ..RunReport::default()
    };

    let mut origins: HashMap<PathBuf, String> = HashMap::new();

    for unit in &units {
        let span = info_span!("unit", path = %unit.path, package = %unit.package);
        let _enter = span.enter();

        match runner.execute(unit, &options) {
            Ok(mut outcome) => {
                report.diagnostics.append(&mut outcome.diagnostics);
                if outcome.has_failures() {
                    if config.fail_fast {
                        return Err(PipelineError::Analyzers {
                            path: unit.path.clone(),
                            analyzers: outcome.failed,
                        });
                    }
                    let failed = outcome.failed.join(", ");
                    error!(analyzers = %failed, "Analyzers failed; continuing");
                    report.failures.push(UnitFailure {
                        path: unit.path.clone(),
                        error: format!("analyzers failed: {}", failed),
                    });
                }
                if let Some(Some(artifact)) = outcome.results.get::<Generator>() {
                    if let Some(first) = origins.get(&artifact.path) {
                        return Err(PipelineError::Collision {
                            path: artifact.path.clone(),
                            first: first.clone(),
                            second: unit.path.clone(),
                        });
                    }
                    origins.insert(artifact.path.clone(), unit.path.clone());
                    report.artifacts.push(artifact.clone());
                }
            }
            Err(source) if config.fail_fast => {
                return Err(PipelineError::Unit {
                    path: unit.path.clone(),
                    source,
                });
            }
            Err(source) => {
                let chain = format!("{:#}", anyhow::Error::from(source));
                error!(error = %chain, "Unit failed; skipping");
                report.failures.push(UnitFailure {
                    path: unit.path.clone(),
                    error: chain,
                });
            }
        }
    }

    report.written = write_artifacts(
        &config.output_root(),
        &report.artifacts,
        &config.write_options(),
    )?;

    info!(
        units = report.units,
        artifacts = report.artifacts.len(),
        warnings = report.diagnostics.len(),
        failures = report.failures.len(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Generation finished"
    );
    Ok(report)
}

/// Extracts the service model of every configured source file without
/// generating anything. Units without services are left out.
pub fn models(config: &GeneratorConfig) -> Result<Vec<Package>, PipelineError> {
    let units: Vec<SourceFile> = load_units(&config.load_config())?;
    let runner = Runner::new(vec![analyzer(ServiceExtractor::new(config.marker.clone()))])?;
    let options = walk_options(config);

    let mut packages = Vec::new();
    for unit in &units {
        let outcome = runner
            .execute(unit, &options)
            .map_err(|source| PipelineError::Unit {
                path: unit.path.clone(),
                source,
            })?;
        if let Some(package) = outcome.results.get::<ServiceExtractor>()
            && !package.is_empty()
        {
            packages.push(package.clone());
        }
    }
    Ok(packages)
}
