// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Activity proxy and controller emission.

use proc_macro2::TokenStream;
use quote::quote;

use super::context::{RenderContext, ident};
use super::unsupported;
use crate::error::GenerateError;
use crate::naming;
use crate::shape::{ActivityShape, MethodKind, MethodShape};

/// Start-to-close timeout applied when the caller passes no activity options.
const DEFAULT_START_TO_CLOSE_SECS: u64 = 30;

/// Emit the proxy trait, its implementation and the controller of an activity.
pub fn emit_activity(
    shape: &ActivityShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let proxy = emit_proxy(shape, ctx)?;
    let controller = emit_controller(shape, ctx)?;
    Ok(quote! {
        #proxy
        #controller
    })
}

fn emit_proxy(shape: &ActivityShape, ctx: &RenderContext) -> Result<TokenStream, GenerateError> {
    let proxy = ident(&shape.proxy.name)?;
    let proxy_impl = ident(&shape.proxy.implementation)?;
    let constructor = ident(&shape.proxy_constructor)?;

    let mut signatures = Vec::new();
    let mut methods = Vec::new();
    for method in &shape.proxy.methods {
        let signature = proxy_signature(method, ctx)?;
        let body = proxy_body(shape, method, ctx)?;
        signatures.push(quote! { #signature; });
        methods.push(quote! { #signature { #body } });
    }

    let doc = format!("Calls the `{}` activity from workflow code.", shape.service);
    Ok(quote! {
        #[doc = #doc]
        pub trait #proxy: Send + Sync {
            #(#signatures)*
        }

        struct #proxy_impl;

        impl #proxy for #proxy_impl {
            #(#methods)*
        }

        pub fn #constructor() -> Box<dyn #proxy> {
            Box::new(#proxy_impl)
        }
    })
}

fn proxy_signature(method: &MethodShape, ctx: &RenderContext) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();
    let name = ident(&method.name)?;
    let req = ctx.request_param(method.request.as_ref(), &method.name)?;
    let response = ctx.ty(&method.response, &method.name)?;

    let output = match method.kind {
        MethodKind::Call => quote! { #rt::Result<#response> },
        MethodKind::CallAsync => quote! { #rt::workflow::Future<#response> },
        _ => return Err(unsupported(&method.name, "activity proxy")),
    };
    Ok(quote! {
        fn #name(
            &self,
            ctx: &#rt::workflow::Context,
            #req
            options: Option<#rt::workflow::ActivityOptions>,
        ) -> #output
    })
}

fn proxy_body(
    shape: &ActivityShape,
    method: &MethodShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();
    let req_arg = if method.request.is_some() {
        quote! { req }
    } else {
        quote! { () }
    };

    match method.kind {
        MethodKind::Call => {
            let async_method = ident(&naming::async_method(&method.name))?;
            let forwarded = method.request.as_ref().map(|_| quote! { req, });
            Ok(quote! {
                self.#async_method(ctx, #forwarded options).get(ctx)
            })
        }
        MethodKind::CallAsync => {
            let task_queue = ident(&shape.task_queue_constant)?;
            let constant = method
                .constant
                .as_deref()
                .map(ident)
                .transpose()?
                .ok_or_else(|| unsupported(&method.name, "activity proxy"))?;
            Ok(quote! {
                let options = options.unwrap_or_else(|| {
                    #rt::workflow::ActivityOptions::new(#task_queue).with_start_to_close_timeout(
                        ::std::time::Duration::from_secs(#DEFAULT_START_TO_CLOSE_SECS),
                    )
                });
                #rt::workflow::execute_activity(ctx, options, #constant, #req_arg)
            })
        }
        _ => Err(unsupported(&method.name, "activity proxy")),
    }
}

fn emit_controller(
    shape: &ActivityShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();
    let service = ident(&shape.service)?;
    let controller = ident(&shape.controller)?;
    let inner = ident("inner")?;
    let fallback_ctx = quote! { &#rt::activity::Context };

    let mut registrations = Vec::new();
    for registration in &shape.registrations {
        let constant = ident(&registration.constant)?;
        let closure = ctx.user_closure(&inner, &registration.call, &fallback_ctx)?;
        registrations.push(quote! {
            {
                let #inner = ::std::sync::Arc::clone(&self.inner);
                worker.register_activity(#constant, #closure);
            }
        });
    }
    if registrations.is_empty() {
        registrations.push(quote! { let _ = worker; });
    }

    let doc = format!(
        "Registers every operation of a `{}` implementation as an activity.",
        shape.service
    );
    Ok(quote! {
        #[doc = #doc]
        pub struct #controller {
            inner: ::std::sync::Arc<dyn #service + Send + Sync>,
        }

        impl #controller {
            pub fn new(inner: ::std::sync::Arc<dyn #service + Send + Sync>) -> Self {
                Self { inner }
            }

            pub fn register(self, worker: &mut #rt::worker::Worker) {
                #(#registrations)*
            }
        }
    })
}
