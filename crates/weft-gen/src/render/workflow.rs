// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Workflow emission.
//!
//! A workflow gets five cooperating handle traits (run, child run, external
//! run, client, child client), each with a private implementation, plus the
//! input struct, factory alias and controller used on the worker side.

use proc_macro2::{Ident, TokenStream};
use quote::quote;

use super::context::{RenderContext, call_args, ident};
use super::unsupported;
use crate::error::GenerateError;
use crate::naming;
use crate::shape::{InterfaceRole, InterfaceShape, MethodKind, MethodShape, WorkflowShape};

/// Emit everything generated for one workflow.
pub fn emit_workflow(
    shape: &WorkflowShape,
    ctx: &RenderContext,
) -> Result<TokenStream, GenerateError> {
    let emitter = WorkflowEmitter::new(shape, ctx)?;

    let run = emitter.interface(&shape.run)?;
    let child_run = emitter.interface(&shape.child_run)?;
    let external_run = emitter.interface(&shape.external_run)?;
    let client = emitter.interface(&shape.client)?;
    let child_client = emitter.interface(&shape.child_client)?;
    let constructors = emitter.constructors()?;
    let input = emitter.input()?;
    let factory = emitter.factory()?;
    let controller = emitter.controller()?;

    Ok(quote! {
        #run
        #child_run
        #external_run
        #client
        #child_client
        #constructors
        #input
        #factory
        #controller
    })
}

struct WorkflowEmitter<'a> {
    shape: &'a WorkflowShape,
    ctx: &'a RenderContext,
    rt: &'a syn::Path,
    name_constant: Ident,
    task_queue: Ident,
    request: syn::Type,
    response: syn::Type,
}

impl<'a> WorkflowEmitter<'a> {
    fn new(shape: &'a WorkflowShape, ctx: &'a RenderContext) -> Result<Self, GenerateError> {
        Ok(Self {
            shape,
            ctx,
            rt: ctx.rt(),
            name_constant: ident(&shape.name_constant)?,
            task_queue: ident(&shape.task_queue_constant)?,
            request: ctx.ty(&shape.request, &shape.service)?,
            response: ctx.ty(&shape.response, &shape.service)?,
        })
    }

    fn interface(&self, interface: &InterfaceShape) -> Result<TokenStream, GenerateError> {
        let name = ident(&interface.name)?;
        let implementation = ident(&interface.implementation)?;

        let mut signatures = Vec::new();
        let mut methods = Vec::new();
        for method in &interface.methods {
            let signature = self.signature(interface, method)?;
            let body = self.body(interface, method)?;
            signatures.push(quote! { #signature; });
            methods.push(quote! { #signature { #body } });
        }

        let fields = self.fields(interface.role);
        let doc = self.interface_doc(interface.role);
        Ok(quote! {
            #[doc = #doc]
            pub trait #name: Send + Sync {
                #(#signatures)*
            }

            struct #implementation #fields

            impl #name for #implementation {
                #(#methods)*
            }
        })
    }

    fn interface_doc(&self, role: InterfaceRole) -> String {
        let service = &self.shape.service;
        match role {
            InterfaceRole::Run => format!("Client-side handle to a running `{service}` workflow."),
            InterfaceRole::ChildRun => {
                format!("Handle to a `{service}` child workflow started from workflow code.")
            }
            InterfaceRole::ExternalRun => {
                format!("Handle to a `{service}` workflow that is not a child of the caller.")
            }
            InterfaceRole::Client => format!("Starts `{service}` workflows."),
            InterfaceRole::ChildClient => {
                format!("Starts `{service}` workflows as children of the calling workflow.")
            }
            InterfaceRole::ActivityProxy => format!("Proxy for `{service}`."),
        }
    }

    fn fields(&self, role: InterfaceRole) -> TokenStream {
        let rt = self.rt;
        match role {
            InterfaceRole::Run => quote! {
                {
                    client: #rt::client::Client,
                    run: #rt::client::WorkflowRun,
                }
            },
            InterfaceRole::ChildRun => quote! {
                {
                    future: #rt::workflow::ChildWorkflowFuture,
                }
            },
            InterfaceRole::ExternalRun => quote! {
                {
                    workflow_id: String,
                    run_id: String,
                }
            },
            InterfaceRole::Client => quote! {
                {
                    client: #rt::client::Client,
                }
            },
            InterfaceRole::ChildClient | InterfaceRole::ActivityProxy => quote! { ; },
        }
    }

    fn constant(&self, method: &MethodShape, interface: &InterfaceShape) -> Result<Ident, GenerateError> {
        method
            .constant
            .as_deref()
            .map(ident)
            .transpose()?
            .ok_or_else(|| unsupported(&method.name, &interface.name))
    }

    fn signature(
        &self,
        interface: &InterfaceShape,
        method: &MethodShape,
    ) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let name = ident(&method.name)?;
        let req = self
            .ctx
            .request_param(method.request.as_ref(), &method.name)?;
        let response = self.ctx.ty(&method.response, &method.name)?;
        let wctx = quote! { ctx: &#rt::workflow::Context };
        let request = &self.request;

        let run = ident(&self.shape.run.name)?;
        let child_run = ident(&self.shape.child_run.name)?;
        let external_run = ident(&self.shape.external_run.name)?;

        let signature = match (interface.role, &method.kind) {
            (_, MethodKind::WorkflowId) => quote! { fn #name(&self) -> &str },
            (_, MethodKind::RunId) => quote! { fn #name(&self) -> &str },

            (InterfaceRole::Run, MethodKind::Get) => {
                quote! { fn #name(&self) -> #rt::Result<#response> }
            }
            (InterfaceRole::Run, MethodKind::Query | MethodKind::Update) => {
                quote! { fn #name(&self, #req) -> #rt::Result<#response> }
            }
            (InterfaceRole::Run, MethodKind::UpdateAsync) => quote! {
                fn #name(&self, #req) -> #rt::Result<#rt::client::UpdateHandle<#response>>
            },
            (InterfaceRole::Run, MethodKind::Signal) => {
                quote! { fn #name(&self, #req) -> #rt::Result<()> }
            }

            (InterfaceRole::ChildRun, MethodKind::IsReady) => quote! { fn #name(&self) -> bool },
            (InterfaceRole::ChildRun, MethodKind::Underlying) => quote! {
                fn #name(&self) -> &#rt::workflow::ChildWorkflowFuture
            },
            (InterfaceRole::ChildRun, MethodKind::Get) => {
                quote! { fn #name(&self, #wctx) -> #rt::Result<#response> }
            }
            (InterfaceRole::ChildRun, MethodKind::WaitStart) => quote! {
                fn #name(&self, #wctx) -> #rt::Result<#rt::workflow::Execution>
            },
            (InterfaceRole::ChildRun, MethodKind::Select) => quote! {
                fn #name(
                    &self,
                    selector: &mut #rt::workflow::Selector,
                    f: Box<dyn FnOnce(#rt::Result<#response>) + Send>,
                )
            },
            (InterfaceRole::ChildRun, MethodKind::SelectStart) => quote! {
                fn #name(
                    &self,
                    selector: &mut #rt::workflow::Selector,
                    f: Box<dyn FnOnce(#rt::Result<#rt::workflow::Execution>) + Send>,
                )
            },
            (InterfaceRole::ChildRun | InterfaceRole::ExternalRun, MethodKind::Signal) => {
                quote! { fn #name(&self, #wctx, #req) -> #rt::Result<()> }
            }
            (InterfaceRole::ChildRun | InterfaceRole::ExternalRun, MethodKind::SignalAsync) => {
                quote! { fn #name(&self, #wctx, #req) -> #rt::workflow::Future<()> }
            }

            (InterfaceRole::ExternalRun, MethodKind::RequestCancellation) => {
                quote! { fn #name(&self, #wctx) -> #rt::Result<()> }
            }

            (InterfaceRole::Client, MethodKind::Execute) => quote! {
                fn #name(
                    &self,
                    req: #request,
                    options: Option<#rt::client::StartWorkflowOptions>,
                ) -> #rt::Result<Box<dyn #run>>
            },
            (InterfaceRole::Client, MethodKind::GetHandle) => quote! {
                fn #name(&self, options: #rt::client::GetHandleOptions) -> Box<dyn #run>
            },
            (InterfaceRole::Client, MethodKind::ExecuteWithSignal { signal }) => {
                let signal = self.ctx.ty(signal, &method.name)?;
                quote! {
                    fn #name(
                        &self,
                        req: #request,
                        signal: #signal,
                        options: Option<#rt::client::StartWorkflowOptions>,
                    ) -> #rt::Result<Box<dyn #run>>
                }
            }

            (InterfaceRole::ChildClient, MethodKind::Execute) => quote! {
                fn #name(
                    &self,
                    #wctx,
                    req: #request,
                    options: Option<#rt::workflow::ChildWorkflowOptions>,
                ) -> #rt::Result<#response>
            },
            (InterfaceRole::ChildClient, MethodKind::ExecuteAsync) => quote! {
                fn #name(
                    &self,
                    #wctx,
                    req: #request,
                    options: Option<#rt::workflow::ChildWorkflowOptions>,
                ) -> Box<dyn #child_run>
            },
            (InterfaceRole::ChildClient, MethodKind::External) => quote! {
                fn #name(&self, workflow_id: &str, run_id: &str) -> Box<dyn #external_run>
            },

            _ => return Err(unsupported(&method.name, &interface.name)),
        };
        Ok(signature)
    }

    fn body(
        &self,
        interface: &InterfaceShape,
        method: &MethodShape,
    ) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let name_constant = &self.name_constant;
        let task_queue = &self.task_queue;
        let has_request = method.request.is_some();
        let req_arg = if has_request {
            quote! { req }
        } else {
            quote! { () }
        };
        let forwarded = has_request.then(|| quote! { req });

        let run_impl = ident(&self.shape.run.implementation)?;
        let child_run_impl = ident(&self.shape.child_run.implementation)?;
        let external_run_impl = ident(&self.shape.external_run.implementation)?;

        let body = match (interface.role, &method.kind) {
            (InterfaceRole::Run, MethodKind::WorkflowId) => quote! { self.run.workflow_id() },
            (InterfaceRole::Run, MethodKind::RunId) => quote! { self.run.run_id() },
            (InterfaceRole::Run, MethodKind::Get) => quote! { self.run.get() },
            (InterfaceRole::Run, MethodKind::Query) => {
                let constant = self.constant(method, interface)?;
                quote! {
                    self.client.query_workflow(
                        self.run.workflow_id(),
                        self.run.run_id(),
                        #constant,
                        #req_arg,
                    )
                }
            }
            (InterfaceRole::Run, MethodKind::Signal) => {
                let constant = self.constant(method, interface)?;
                quote! {
                    self.client.signal_workflow(
                        self.run.workflow_id(),
                        self.run.run_id(),
                        #constant,
                        #req_arg,
                    )
                }
            }
            (InterfaceRole::Run, MethodKind::Update) => {
                let async_method = ident(&naming::async_method(&method.name))?;
                quote! { self.#async_method(#forwarded)?.get() }
            }
            (InterfaceRole::Run, MethodKind::UpdateAsync) => {
                let constant = self.constant(method, interface)?;
                quote! {
                    self.client.update_workflow(
                        self.run.workflow_id(),
                        self.run.run_id(),
                        #constant,
                        #req_arg,
                    )
                }
            }

            (InterfaceRole::ChildRun, MethodKind::WorkflowId) => {
                quote! { self.future.workflow_id() }
            }
            (InterfaceRole::ChildRun, MethodKind::IsReady) => quote! { self.future.is_ready() },
            (InterfaceRole::ChildRun, MethodKind::Underlying) => quote! { &self.future },
            (InterfaceRole::ChildRun, MethodKind::Get) => quote! { self.future.get(ctx) },
            (InterfaceRole::ChildRun, MethodKind::WaitStart) => {
                quote! { self.future.execution().get(ctx) }
            }
            (InterfaceRole::ChildRun, MethodKind::Select) => {
                quote! { selector.add_child(&self.future, f); }
            }
            (InterfaceRole::ChildRun, MethodKind::SelectStart) => {
                quote! { selector.add_future(self.future.execution(), f); }
            }
            (InterfaceRole::ChildRun, MethodKind::SignalAsync) => {
                let constant = self.constant(method, interface)?;
                quote! { self.future.signal(ctx, #constant, #req_arg) }
            }

            (InterfaceRole::ExternalRun, MethodKind::WorkflowId) => quote! { &self.workflow_id },
            (InterfaceRole::ExternalRun, MethodKind::RunId) => quote! { &self.run_id },
            (InterfaceRole::ExternalRun, MethodKind::RequestCancellation) => quote! {
                #rt::workflow::request_cancel_external_workflow(ctx, &self.workflow_id, &self.run_id)
                    .get(ctx)
            },
            (InterfaceRole::ExternalRun, MethodKind::SignalAsync) => {
                let constant = self.constant(method, interface)?;
                quote! {
                    #rt::workflow::signal_external_workflow(
                        ctx,
                        &self.workflow_id,
                        &self.run_id,
                        #constant,
                        #req_arg,
                    )
                }
            }

            (InterfaceRole::ChildRun | InterfaceRole::ExternalRun, MethodKind::Signal) => {
                let async_method = ident(&naming::async_method(&method.name))?;
                let args = std::iter::once(quote! { ctx }).chain(forwarded);
                quote! { self.#async_method(#(#args),*).get(ctx) }
            }

            (InterfaceRole::Client, MethodKind::Execute) => quote! {
                let options = options
                    .unwrap_or_else(|| #rt::client::StartWorkflowOptions::new(#task_queue));
                let run = self.client.execute_workflow(options, #name_constant, req)?;
                Ok(Box::new(#run_impl {
                    client: self.client.clone(),
                    run,
                }))
            },
            (InterfaceRole::Client, MethodKind::GetHandle) => quote! {
                let run = self.client.get_workflow(options);
                Box::new(#run_impl {
                    client: self.client.clone(),
                    run,
                })
            },
            (InterfaceRole::Client, MethodKind::ExecuteWithSignal { .. }) => {
                let constant = self.constant(method, interface)?;
                quote! {
                    let options = options
                        .unwrap_or_else(|| #rt::client::StartWorkflowOptions::new(#task_queue));
                    let run = self.client.signal_with_start_workflow(
                        options,
                        #constant,
                        signal,
                        #name_constant,
                        req,
                    )?;
                    Ok(Box::new(#run_impl {
                        client: self.client.clone(),
                        run,
                    }))
                }
            }

            (InterfaceRole::ChildClient, MethodKind::Execute) => quote! {
                self.execute_async(ctx, req, options).get(ctx)
            },
            (InterfaceRole::ChildClient, MethodKind::ExecuteAsync) => quote! {
                let options = options
                    .unwrap_or_else(|| #rt::workflow::ChildWorkflowOptions::new(#task_queue));
                let future = #rt::workflow::execute_child_workflow(ctx, options, #name_constant, req);
                Box::new(#child_run_impl { future })
            },
            (InterfaceRole::ChildClient, MethodKind::External) => quote! {
                Box::new(#external_run_impl {
                    workflow_id: workflow_id.to_string(),
                    run_id: run_id.to_string(),
                })
            },

            _ => return Err(unsupported(&method.name, &interface.name)),
        };
        Ok(body)
    }

    fn constructors(&self) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let client = ident(&self.shape.client.name)?;
        let client_impl = ident(&self.shape.client.implementation)?;
        let client_constructor = ident(&self.shape.client_constructor)?;
        let child_client = ident(&self.shape.child_client.name)?;
        let child_client_impl = ident(&self.shape.child_client.implementation)?;
        let child_client_constructor = ident(&self.shape.child_client_constructor)?;

        Ok(quote! {
            pub fn #client_constructor(client: #rt::client::Client) -> Box<dyn #client> {
                Box::new(#client_impl { client })
            }

            pub fn #child_client_constructor() -> Box<dyn #child_client> {
                Box::new(#child_client_impl)
            }
        })
    }

    fn input(&self) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let input = ident(&self.shape.input.name)?;
        let request = &self.request;

        let mut fields = Vec::new();
        let mut accessors = Vec::new();
        for channel in &self.shape.input.channels {
            let accessor = ident(&channel.accessor)?;
            let ty = self.ctx.ty(&channel.request, &channel.accessor)?;
            fields.push(quote! { #accessor: #rt::workflow::SignalChannel<#ty>, });
            accessors.push(quote! {
                pub fn #accessor(&self) -> &#rt::workflow::SignalChannel<#ty> {
                    &self.#accessor
                }
            });
        }

        let accessors_impl = (!accessors.is_empty()).then(|| {
            quote! {
                impl #input {
                    #(#accessors)*
                }
            }
        });

        let doc = format!(
            "Everything a `{}` implementation is constructed from.",
            self.shape.service
        );
        Ok(quote! {
            #[doc = #doc]
            pub struct #input {
                pub request: #request,
                #(#fields)*
            }

            #accessors_impl
        })
    }

    fn factory(&self) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let service = ident(&self.shape.service)?;
        let factory = ident(&self.shape.factory)?;
        let input = ident(&self.shape.input.name)?;
        Ok(quote! {
            pub type #factory = ::std::sync::Arc<
                dyn Fn(#input) -> #rt::Result<::std::sync::Arc<dyn #service + Send + Sync>>
                    + Send
                    + Sync,
            >;
        })
    }

    fn controller(&self) -> Result<TokenStream, GenerateError> {
        let rt = self.rt;
        let controller_shape = &self.shape.controller;
        let controller = ident(&controller_shape.name)?;
        let factory = ident(&self.shape.factory)?;
        let input = ident(&self.shape.input.name)?;
        let name_constant = &self.name_constant;
        let request = &self.request;
        let response = &self.response;
        let workflow = ident("workflow")?;
        let fallback_ctx = quote! { &#rt::workflow::Context };

        let mut channel_fields = Vec::new();
        for channel in &self.shape.input.channels {
            let accessor = ident(&channel.accessor)?;
            let provider = ident(&channel.provider)?;
            channel_fields.push(quote! { #accessor: #provider(ctx), });
        }

        let mut handlers = Vec::new();
        for query in &controller_shape.queries {
            let constant = ident(&query.constant)?;
            let closure = self.ctx.user_closure(&workflow, &query.call, &fallback_ctx)?;
            handlers.push(quote! {
                {
                    let #workflow = ::std::sync::Arc::clone(&#workflow);
                    #rt::workflow::set_query_handler(ctx, #constant, #closure)?;
                }
            });
        }
        for update in &controller_shape.updates {
            let constant = ident(&update.constant)?;
            let closure = self.ctx.user_closure(&workflow, &update.call, &fallback_ctx)?;
            handlers.push(quote! {
                {
                    let #workflow = ::std::sync::Arc::clone(&#workflow);
                    #rt::workflow::set_update_handler(ctx, #constant, #closure)?;
                }
            });
        }

        let delegate = match &controller_shape.execute {
            Some(call) => {
                let method = ident(&call.method)?;
                let args = call_args(call);
                if call.fallible {
                    quote! { Ok(#workflow.#method(#(#args),*)?) }
                } else {
                    quote! { Ok(#workflow.#method(#(#args),*)) }
                }
            }
            None => quote! {
                let _ = (#workflow, req);
                Ok(Default::default())
            },
        };

        let doc = format!(
            "Runs `{}` workflows on a worker, building one implementation per run.",
            self.shape.service
        );
        Ok(quote! {
            #[doc = #doc]
            pub struct #controller {
                factory: #factory,
            }

            impl #controller {
                pub fn new(factory: #factory) -> Self {
                    Self { factory }
                }

                pub fn execute(
                    &self,
                    ctx: &#rt::workflow::Context,
                    req: #request,
                ) -> #rt::Result<#response> {
                    let input = #input {
                        request: ::std::clone::Clone::clone(&req),
                        #(#channel_fields)*
                    };
                    let #workflow = (self.factory)(input)?;
                    #(#handlers)*
                    #delegate
                }

                pub fn register(self, worker: &mut #rt::worker::Worker) {
                    let controller = ::std::sync::Arc::new(self);
                    worker.register_workflow(
                        #name_constant,
                        move |ctx: &#rt::workflow::Context, req: #request| controller.execute(ctx, req),
                    );
                }
            }
        })
    }
}
