// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Package-level items: constants, signal channel providers and aggregates.

use proc_macro2::TokenStream;
use quote::quote;

use super::context::{RenderContext, ident};
use crate::error::GenerateError;
use crate::naming;
use crate::shape::{AggregateEntry, Aggregates, PackageShape};

/// Emit the symbolic name constants.
pub fn emit_constants(shape: &PackageShape) -> Result<TokenStream, GenerateError> {
    let mut constants = Vec::new();
    for constant in &shape.constants {
        let name = ident(&constant.name)?;
        let value = &constant.value;
        constants.push(quote! { pub const #name: &str = #value; });
    }
    Ok(quote! { #(#constants)* })
}

/// Emit one channel provider per workflow signal.
pub fn emit_signal_channels(
    shape: &PackageShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();
    let mut providers = Vec::new();
    for channel in &shape.signal_channels {
        let provider = ident(&channel.provider)?;
        let constant = ident(&channel.constant)?;
        let ty = ctx.ty(&channel.request, &channel.provider)?;
        providers.push(quote! {
            pub fn #provider(ctx: &#rt::workflow::Context) -> #rt::workflow::SignalChannel<#ty> {
                #rt::workflow::SignalChannel::new(ctx, #constant)
            }
        });
    }
    Ok(quote! { #(#providers)* })
}

/// Emit `WorkflowClients`, `WorkflowProxies`, `ActivityProxies` and
/// `WorkerController`, each only when it would not be empty.
pub fn emit_aggregates(
    aggregates: &Aggregates,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();

    let workflow_clients = emit_accessor_trait(
        "WorkflowClients",
        &aggregates.workflow_clients,
        Some(quote! { #rt::client::Client }),
    )?;
    let workflow_proxies =
        emit_accessor_trait("WorkflowProxies", &aggregates.workflow_proxies, None)?;
    let activity_proxies =
        emit_accessor_trait("ActivityProxies", &aggregates.activity_proxies, None)?;

    let worker_controller = if aggregates.controllers.is_empty() {
        TokenStream::new()
    } else {
        let mut fields = Vec::new();
        let mut registrations = Vec::new();
        for entry in &aggregates.controllers {
            let field = ident(&entry.field)?;
            let controller = ident(&entry.controller)?;
            fields.push(quote! { pub #field: #controller, });
            registrations.push(quote! { self.#field.register(worker); });
        }
        quote! {
            /// Every activity and workflow controller of this package.
            pub struct WorkerController {
                #(#fields)*
            }

            impl WorkerController {
                pub fn register(self, worker: &mut #rt::worker::Worker) {
                    #(#registrations)*
                }
            }
        }
    };

    Ok(quote! {
        #workflow_clients
        #workflow_proxies
        #activity_proxies
        #worker_controller
    })
}

/// A trait with one accessor per entry, a private implementation and a
/// `new_*` constructor. With `client`, the implementation holds a runtime
/// client and hands a clone to every entry constructor.
fn emit_accessor_trait(
    name: &str,
    entries: &[AggregateEntry],
    client: Option<TokenStream>,
) -> Result<TokenStream, GenerateError> {
    if entries.is_empty() {
        return Ok(TokenStream::new());
    }

    let trait_name = ident(name)?;
    let implementation = ident(&naming::implementation(name))?;
    let constructor = ident(&naming::constructor(name))?;

    let mut signatures = Vec::new();
    let mut methods = Vec::new();
    for entry in entries {
        let accessor = ident(&entry.accessor)?;
        let interface = ident(&entry.interface)?;
        let entry_constructor = ident(&entry.constructor)?;
        let args = client.as_ref().map(|_| quote! { self.client.clone() });
        signatures.push(quote! { fn #accessor(&self) -> Box<dyn #interface>; });
        methods.push(quote! {
            fn #accessor(&self) -> Box<dyn #interface> {
                #entry_constructor(#args)
            }
        });
    }

    let (definition, params, construct) = match &client {
        Some(ty) => (
            quote! { struct #implementation { client: #ty } },
            quote! { client: #ty },
            quote! { #implementation { client } },
        ),
        None => (
            quote! { struct #implementation; },
            TokenStream::new(),
            quote! { #implementation },
        ),
    };

    Ok(quote! {
        pub trait #trait_name: Send + Sync {
            #(#signatures)*
        }

        #definition

        impl #trait_name for #implementation {
            #(#methods)*
        }

        pub fn #constructor(#params) -> Box<dyn #trait_name> {
            Box::new(#construct)
        }
    })
}
