// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, reading or parsing source files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A glob pattern is malformed.
    #[error("invalid source pattern {pattern:?}")]
    Pattern {
        /// The pattern as given.
        pattern: String,
        /// Why glob rejected it.
        #[source]
        source: glob::PatternError,
    },

    /// A file could not be listed or read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid Rust.
    #[error("failed to parse {path}:{line}:{column}: {message}")]
    Parse {
        /// Path relative to the working directory.
        path: String,
        /// Line of the first syntax error (1-based).
        line: usize,
        /// Column of the first syntax error (0-based).
        column: usize,
        /// Parser message.
        message: String,
    },
}
