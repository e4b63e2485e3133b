// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The code generation analyzer and the root analyzer set.

use tracing::debug;

use weft_analysis::{Analyzer, AnalyzerRef, Pass, analyzer};
use weft_spec::{ServiceExtractor, SourceFile};

use crate::artifact::Artifact;
use crate::render::render_package;
use crate::shape::{GenOptions, PackageShape};

/// Generates the artifact of a unit from its extracted package.
///
/// Produces `None` for a unit without services. Generation does no I/O.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GenOptions,
}

impl Generator {
    /// Generator with the given settings.
    pub fn new(options: GenOptions) -> Self {
        Self { options }
    }

    /// Settings in use.
    pub fn options(&self) -> &GenOptions {
        &self.options
    }
}

impl Analyzer<SourceFile> for Generator {
    type Output = Option<Artifact>;

    fn name(&self) -> &'static str {
        "generate"
    }

    fn requires(&self) -> Vec<AnalyzerRef<SourceFile>> {
        vec![analyzer(ServiceExtractor::new(self.options.marker.clone()))]
    }

    fn run(&self, pass: &Pass<'_, SourceFile>) -> anyhow::Result<Option<Artifact>> {
        let unit = pass.unit();
        let package = pass.require::<ServiceExtractor>()?;
        if package.is_empty() {
            debug!(path = %unit.path, "No services; nothing to generate");
            return Ok(None);
        }

        let shape = PackageShape::build(package, &self.options)?;
        for skipped in &shape.skipped {
            pass.warn(skipped.location.clone(), format!("{} (skipped)", skipped.reason));
        }

        let text = render_package(&shape, &self.options)?;
        let artifact = Artifact::new(unit.dir(), &package.name, text);
        debug!(
            path = %artifact.path.display(),
            services = package.services.len(),
            "Generated artifact"
        );
        Ok(Some(artifact))
    }
}

/// The root analyzer set of a generation run.
///
/// Dependencies are discovered from here, so the extractor runs with the
/// same marker as the generator.
pub fn analyzers(options: &GenOptions) -> Vec<AnalyzerRef<SourceFile>> {
    vec![analyzer(Generator::new(options.clone()))]
}
