// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Plain service controllers.

use proc_macro2::TokenStream;
use quote::quote;

use super::context::{RenderContext, ident};
use crate::error::GenerateError;
use crate::shape::HttpServiceShape;

/// Emit the controller of a plain service: one HTTP handler per route.
pub fn emit_service(
    shape: &HttpServiceShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let rt = ctx.rt();
    let service = ident(&shape.service)?;
    let controller = ident(&shape.controller)?;
    let inner = ident("inner")?;
    let fallback_ctx = quote! { &#rt::http::Context };

    let mut handlers = Vec::new();
    for route in &shape.routes {
        let constant = ident(&route.constant)?;
        let method = &route.method;
        let path = &route.path;
        let closure = ctx.user_closure(&inner, &route.call, &fallback_ctx)?;
        handlers.push(quote! {
            {
                let #inner = ::std::sync::Arc::clone(&self.inner);
                #rt::http::Handler::new(#method, #path, #constant, #closure)
            }
        });
    }

    let doc = format!("Serves a `{}` implementation over HTTP.", shape.service);
    Ok(quote! {
        #[doc = #doc]
        pub struct #controller {
            inner: ::std::sync::Arc<dyn #service + Send + Sync>,
        }

        impl #controller {
            pub fn new(inner: ::std::sync::Arc<dyn #service + Send + Sync>) -> Self {
                Self { inner }
            }

            pub fn handlers(&self) -> Vec<#rt::http::Handler> {
                vec![#(#handlers),*]
            }
        }
    })
}
