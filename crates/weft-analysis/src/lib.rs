// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Weft Analysis - Dependency-Ordered Pass Scheduling
//!
//! An [`Analyzer`] is an explicit value that names itself, lists the analyzers it
//! requires and computes a typed result for one compilation unit. The analyzer's
//! own type is the key of that result, so consumers ask for it with
//! [`Pass::result_of::<A>()`](Pass::result_of) and get `A::Output` back.
//!
//! A [`Runner`] is built once from a set of root analyzers. Building collects the
//! transitive closure of their requirements and rejects dependency cycles before
//! anything runs. [`Runner::execute`] then walks the graph level by level for one
//! unit, running independent analyzers concurrently up to a configurable bound.
//!
//! ```ignore
//! let runner = Runner::new(vec![analyzer(Generator::default())])?;
//! let outcome = runner.execute(&unit, &WalkOptions::default())?;
//! let artifact = outcome.results.get::<Generator>();
//! ```

#![deny(missing_docs)]

/// Analyzer trait, type-erased handles and the per-pass view.
pub mod analyzer;

/// Diagnostics reported by analyzers.
pub mod diagnostic;

/// Scheduler errors.
pub mod error;

/// Dependency graph construction, cycle validation and layering.
pub mod graph;

/// Bounded parallel walk over a validated graph.
pub mod runner;

pub use analyzer::{Analyzer, AnalyzerRef, ErasedAnalyzer, Pass, UnitResults, analyzer};
pub use diagnostic::{Diagnostic, Location, Severity};
pub use error::{GraphError, WalkError};
pub use graph::Graph;
pub use runner::{Runner, UnitOutcome, WalkOptions};
