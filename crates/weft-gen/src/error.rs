// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;
use thiserror::Error;

use weft_analysis::{GraphError, WalkError};
use weft_spec::LoadError;

/// Errors raised while turning a package into code.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The package breaks a generation rule.
    #[error("package `{package}` cannot be generated: {}", problems.join("; "))]
    Validation {
        /// Package name.
        package: String,
        /// Every problem found, in declaration order.
        problems: Vec<String>,
    },

    /// A type written in the source could not be re-parsed.
    #[error("invalid type `{text}` in {context}: {message}")]
    Type {
        /// Type token text.
        text: String,
        /// Where the type is used.
        context: String,
        /// Parser message.
        message: String,
    },

    /// A derived name is not a valid Rust identifier.
    #[error("`{0}` is not a valid identifier")]
    Ident(String),

    /// A method form has no rendering in the trait it was placed in.
    #[error("`{method}` cannot be rendered in {interface}")]
    Unsupported {
        /// Method name.
        method: String,
        /// Trait description.
        interface: String,
    },

    /// The configured runtime crate is not a path.
    #[error("invalid runtime crate path `{0}`")]
    RuntimePath(String),
}

/// Errors raised while persisting artifacts.
#[derive(Debug, Error)]
pub enum WriteError {
    /// A parent directory could not be created.
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors that stop a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Sources could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The analyzer set is invalid.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A unit failed and failures are fatal.
    #[error("failed to process {path}")]
    Unit {
        /// Source path of the unit.
        path: String,
        /// Why the walk failed.
        #[source]
        source: WalkError,
    },

    /// Analyzers of a unit failed in continue mode and failures are fatal.
    #[error("failed to process {path}: analyzers failed: {}", analyzers.join(", "))]
    Analyzers {
        /// Source path of the unit.
        path: String,
        /// Names of the failed analyzers.
        analyzers: Vec<&'static str>,
    },

    /// Two units generate the same output file.
    #[error("{first} and {second} both generate {}", path.display())]
    Collision {
        /// Output path relative to the module root.
        path: PathBuf,
        /// Source path of the unit generated first.
        first: String,
        /// Source path of the unit generated second.
        second: String,
    },

    /// Artifacts could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
}
