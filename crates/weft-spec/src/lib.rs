// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Weft Spec - Service Model Extraction
//!
//! Reads Rust source files and builds the service model code generation works
//! from. A trait becomes a [`Service`] when its doc comment carries a tag rooted
//! at the marker (`weft` by default):
//!
//! ```ignore
//! /// Order fulfilment.
//! ///
//! /// weft:workflow task_queue=orders
//! pub trait Fulfilment {
//!     /// weft:workflow:execute
//!     fn execute(&self, ctx: &Context, req: Order) -> Result<Receipt, Error>;
//!
//!     /// weft:workflow:signal
//!     fn cancel(&self, ctx: &Context, req: CancelRequest);
//! }
//! ```
//!
//! Two analyzers run per source file:
//!
//! - [`DecoratorIndex`]: tags of every top-level declaration
//! - [`ServiceExtractor`]: the [`Package`] of tagged traits, with warnings for
//!   tagged declarations that cannot become services

#![deny(missing_docs)]

/// Error types for loading sources.
pub mod error;

/// Service extraction and classification.
pub mod extract;

/// Declaration tag index.
pub mod index;

/// The Package / Service / Operation model.
pub mod model;

/// `syn` based source front end.
pub mod syntax;

pub use error::LoadError;
pub use extract::{Classifier, DEFAULT_MARKER, ServiceExtractor};
pub use index::{DecoratorIndex, DecoratorMap};
pub use model::{Operation, OperationKind, Package, Param, Service, ServiceKind, TypeRef};
pub use syntax::{LoadConfig, SourceFile, load_units};
