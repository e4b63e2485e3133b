// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! How to render a [`PackageShape`].
//!
//! Code is built as `proc_macro2` token streams with `quote`, never by string
//! templating. Declared types are re-parsed with `syn` before being spliced in.

mod activity;
mod context;
mod package;
mod service;
mod workflow;

use proc_macro2::TokenStream;
use quote::quote;

pub use context::RenderContext;

use crate::error::GenerateError;
use crate::shape::{GenOptions, PackageShape, ServiceShape};

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by weft-gen. DO NOT EDIT.";

/// Render a package to the text of its generated file.
///
/// # Errors
///
/// Returns `GenerateError` if the runtime crate path, a declared type or a
/// derived name cannot be turned into tokens.
pub fn render_package(shape: &PackageShape, options: &GenOptions) -> Result<String, GenerateError> {
    let ctx = RenderContext::new(options)?;
    let tokens = emit_package(shape, &ctx)?;
    Ok(format!(
        "{}\n// source: {}\n\n{}\n",
        HEADER, shape.source_path, tokens
    ))
}

/// Emit every item of a package.
pub fn emit_package(shape: &PackageShape, ctx: &RenderContext) -> Result<TokenStream, GenerateError> {
    let constants = package::emit_constants(shape)?;
    let channels = package::emit_signal_channels(shape, ctx)?;

    let mut services = Vec::with_capacity(shape.services.len());
    for service in &shape.services {
        let tokens = match service {
            ServiceShape::Activity(activity) => activity::emit_activity(activity, ctx)?,
            ServiceShape::Workflow(workflow) => workflow::emit_workflow(workflow, ctx)?,
            ServiceShape::Service(http) => service::emit_service(http, ctx)?,
        };
        services.push(tokens);
    }

    let aggregates = package::emit_aggregates(&shape.aggregates, ctx)?;

    Ok(quote! {
        #constants
        #channels
        #(#services)*
        #aggregates
    })
}

pub(crate) fn unsupported(method: &str, interface: &str) -> GenerateError {
    GenerateError::Unsupported {
        method: method.to_string(),
        interface: interface.to_string(),
    }
}
