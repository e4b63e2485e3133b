// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared state and helpers for rendering.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use weft_spec::TypeRef;

use crate::error::GenerateError;
use crate::shape::{GenOptions, UserCall};

/// Rendering context shared by every emitter of a package.
pub struct RenderContext {
    rt: syn::Path,
}

impl RenderContext {
    /// Validates the runtime crate path of `options`.
    pub fn new(options: &GenOptions) -> Result<Self, GenerateError> {
        let rt = syn::parse_str::<syn::Path>(&options.runtime_crate)
            .map_err(|_| GenerateError::RuntimePath(options.runtime_crate.clone()))?;
        Ok(Self { rt })
    }

    /// Path of the runtime crate.
    pub fn rt(&self) -> &syn::Path {
        &self.rt
    }

    /// Re-parses a declared type.
    pub fn ty(&self, ty: &TypeRef, context: &str) -> Result<syn::Type, GenerateError> {
        syn::parse_str::<syn::Type>(ty.as_str()).map_err(|err| GenerateError::Type {
            text: ty.as_str().to_string(),
            context: context.to_string(),
            message: err.to_string(),
        })
    }

    /// `req: T,` when a request type is present, nothing otherwise.
    pub fn request_param(
        &self,
        request: Option<&TypeRef>,
        context: &str,
    ) -> Result<TokenStream, GenerateError> {
        match request {
            Some(ty) => {
                let ty = self.ty(ty, context)?;
                Ok(quote! { req: #ty, })
            }
            None => Ok(TokenStream::new()),
        }
    }

    /// Closure wrapping a user method, e.g. `move |ctx: &Context, req: R| inner.op(ctx, req)`.
    ///
    /// Missing context or request parameters still appear in the closure
    /// (typed `fallback_ctx` and `()`), so every registration has the same arity.
    pub fn user_closure(
        &self,
        target: &Ident,
        call: &UserCall,
        fallback_ctx: &TokenStream,
    ) -> Result<TokenStream, GenerateError> {
        let method = ident(&call.method)?;
        let mut params = Vec::new();
        let mut args = Vec::new();

        if call.with_context {
            match &call.context {
                Some(ty) => {
                    let ty = self.ty(ty, &call.method)?;
                    params.push(quote! { ctx: #ty });
                    args.push(quote! { ctx });
                }
                None => params.push(quote! { _ctx: #fallback_ctx }),
            }
        }
        match &call.request {
            Some(ty) => {
                let ty = self.ty(ty, &call.method)?;
                params.push(quote! { req: #ty });
                args.push(quote! { req });
            }
            None => params.push(quote! { _req: () }),
        }

        Ok(quote! { move |#(#params),*| #target.#method(#(#args),*) })
    }
}

/// Parses a generated or declared name as an identifier.
pub fn ident(name: &str) -> Result<Ident, GenerateError> {
    syn::parse_str::<Ident>(name).map_err(|_| GenerateError::Ident(name.to_string()))
}

/// Arguments for a direct call of `call` with `ctx` and `req` in scope.
pub fn call_args(call: &UserCall) -> Vec<TokenStream> {
    let mut args = Vec::new();
    if call.with_context && call.context.is_some() {
        args.push(quote! { ctx });
    }
    if call.request.is_some() {
        args.push(quote! { req });
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    fn call(with_context: bool, context: Option<&str>, request: Option<&str>) -> UserCall {
        UserCall {
            method: "charge".to_string(),
            with_context,
            context: context.map(TypeRef::new),
            request: request.map(TypeRef::new),
            fallible: true,
        }
    }

    #[test]
    fn test_user_closure_keeps_declared_types() {
        let ctx = RenderContext::new(&GenOptions::default()).unwrap();
        let target = ident("inner").unwrap();
        let closure = ctx
            .user_closure(
                &target,
                &call(true, Some("& Context"), Some("Charge")),
                &quote! { &weft_runtime::activity::Context },
            )
            .unwrap();
        assert_eq!(
            compact(&closure),
            "move|ctx:&Context,req:Charge|inner.charge(ctx,req)"
        );
    }

    #[test]
    fn test_user_closure_pads_missing_params() {
        let ctx = RenderContext::new(&GenOptions::default()).unwrap();
        let target = ident("inner").unwrap();
        let closure = ctx
            .user_closure(&target, &call(true, None, None), &quote! { &Ctx })
            .unwrap();
        assert_eq!(compact(&closure), "move|_ctx:&Ctx,_req:()|inner.charge()");
    }

    #[test]
    fn test_invalid_runtime_path() {
        let options = GenOptions {
            runtime_crate: "not a path".to_string(),
            ..GenOptions::default()
        };
        assert!(matches!(
            RenderContext::new(&options),
            Err(GenerateError::RuntimePath(_))
        ));
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(ident("match").is_err());
        assert!(ident("change_address").is_ok());
    }
}
