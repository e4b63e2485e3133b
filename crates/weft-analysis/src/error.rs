// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

/// Errors detected while building the analyzer graph. Nothing has run yet.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The requirements form a cycle. `path` starts and ends with the same analyzer.
    #[error("analyzer dependency cycle: {}", path.join(" -> "))]
    Cycle {
        /// Analyzer names along the cycle.
        path: Vec<&'static str>,
    },

    /// No root analyzers were given.
    #[error("no analyzers to run")]
    Empty,
}

/// Errors that abort the walk of one unit.
#[derive(Debug, Error)]
pub enum WalkError {
    /// An analyzer returned an error.
    #[error("analyzer `{analyzer}` failed")]
    Analyzer {
        /// Name of the failing analyzer.
        analyzer: &'static str,
        /// The error it returned.
        #[source]
        source: anyhow::Error,
    },

    /// An analyzer panicked on its worker thread.
    #[error("analyzer `{analyzer}` panicked: {message}")]
    Panicked {
        /// Name of the panicking analyzer.
        analyzer: &'static str,
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl WalkError {
    /// Name of the analyzer that caused the error.
    pub fn analyzer(&self) -> &'static str {
        match self {
            WalkError::Analyzer { analyzer, .. } | WalkError::Panicked { analyzer, .. } => {
                analyzer
            }
        }
    }
}
