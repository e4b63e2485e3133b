// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Weft Gen - Durable Service Code Generation
//!
//! Turns the service traits extracted by `weft-spec` into Rust code for a
//! durable-execution runtime: typed clients and proxies for callers, and
//! controllers that register user implementations with a worker or an HTTP
//! router. One `<package>.gen.rs` file is written next to each source file
//! that declares services, meant to be pulled in with `include!`.
//!
//! Generation runs as the [`Generator`] analyzer on top of the extraction
//! analyzers, so a whole run is one analyzer graph per source file:
//!
//! ```ignore
//! let config = GeneratorConfig::from_env()?;
//! let report = weft_gen::pipeline::run(&config)?;
//! for path in &report.written {
//!     println!("{}", path.display());
//! }
//! ```
//!
//! Generated code targets the runtime crate configured in
//! [`GenOptions::runtime_crate`] (`weft_runtime` by default).

#![deny(missing_docs)]

/// Generated files and the writer.
pub mod artifact;

/// Environment configuration.
pub mod config;

/// Error types.
pub mod error;

/// The generation analyzer.
pub mod generator;

/// Generated identifiers and symbolic names.
pub mod naming;

/// Load, generate and write in one run.
pub mod pipeline;

/// Token rendering of package shapes.
pub mod render;

/// Declarative description of generated items.
pub mod shape;

pub use artifact::{Artifact, WriteOptions, write_artifacts};
pub use config::{ConfigError, GeneratorConfig};
pub use error::{GenerateError, PipelineError, WriteError};
pub use generator::{Generator, analyzers};
pub use pipeline::{RunReport, UnitFailure};
pub use render::render_package;
pub use shape::{GenOptions, PackageShape};
