// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! What to emit for a package.
//!
//! [`PackageShape::build`] decides every generated item (names, constants,
//! method forms, routes) from the extracted [`Package`] without producing any
//! tokens. Rendering lives in [`crate::render`].

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use weft_analysis::Location;
use weft_spec::{
    Classifier, DEFAULT_MARKER, Operation, OperationKind, Package, Service, ServiceKind, TypeRef,
};

use crate::error::GenerateError;
use crate::naming::{self, TypeNames};

/// Runtime crate the generated code calls into by default.
pub const DEFAULT_RUNTIME_CRATE: &str = "weft_runtime";

/// HTTP method used for service routes without a `method=` option.
pub const DEFAULT_HTTP_METHOD: &str = "POST";

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOptions {
    /// Path of the runtime crate (`weft_runtime`, `crate::rt`, ...).
    pub runtime_crate: String,
    /// Reject packages that break a generation rule instead of guessing.
    pub strict: bool,
    /// Default HTTP method of service routes.
    pub http_method: String,
    /// Tag marker.
    pub marker: String,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
            strict: true,
            http_method: DEFAULT_HTTP_METHOD.to_string(),
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// A call from generated code into a method of the user's trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCall {
    /// Method name as declared.
    pub method: String,
    /// Whether the method takes a context first. Queries do not.
    pub with_context: bool,
    /// Declared context type, if the method has one.
    pub context: Option<TypeRef>,
    /// Declared request type, if the method has one.
    pub request: Option<TypeRef>,
    /// Whether the method returns a `Result`.
    pub fallible: bool,
}

impl UserCall {
    fn of(op: &Operation) -> Self {
        Self {
            method: op.name.clone(),
            with_context: op.kind != OperationKind::Query,
            context: op.context().map(|p| p.ty.clone()),
            request: op.request().map(|p| p.ty.clone()),
            fallible: op.is_fallible(),
        }
    }
}

/// A user method registered with the runtime under a symbolic name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Constant holding the symbolic name.
    pub constant: String,
    /// The wrapped method.
    pub call: UserCall,
}

/// Which generated trait an [`InterfaceShape`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceRole {
    /// `{S}Proxy` of an activity.
    ActivityProxy,
    /// `{S}Run`: client-side handle to a running workflow.
    Run,
    /// `{S}ChildRun`: handle to a child workflow started from a workflow.
    ChildRun,
    /// `{S}ExternalRun`: handle to another workflow seen from a workflow.
    ExternalRun,
    /// `{S}Client`: starts workflows from outside.
    Client,
    /// `{S}ChildClient`: starts child workflows.
    ChildClient,
}

/// Every generated method form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Blocking activity call.
    Call,
    /// Non-blocking activity call returning a future.
    CallAsync,
    /// Workflow id accessor.
    WorkflowId,
    /// Run id accessor.
    RunId,
    /// Waits for the workflow result.
    Get,
    /// Runs a query.
    Query,
    /// Sends a signal and waits for delivery.
    Signal,
    /// Sends a signal without waiting.
    SignalAsync,
    /// Runs an update and waits for its result.
    Update,
    /// Starts an update and returns its handle.
    UpdateAsync,
    /// Whether the child result is available.
    IsReady,
    /// The runtime future behind a child handle.
    Underlying,
    /// Waits until the child has started.
    WaitStart,
    /// Adds the child result to a selector.
    Select,
    /// Adds the child start to a selector.
    SelectStart,
    /// Asks another workflow to cancel.
    RequestCancellation,
    /// Starts the workflow (blocking for children).
    Execute,
    /// Starts a child workflow without waiting.
    ExecuteAsync,
    /// Handle to an existing run.
    GetHandle,
    /// Signal-with-start.
    ExecuteWithSignal {
        /// Signal payload type.
        signal: TypeRef,
    },
    /// Handle to an external workflow.
    External,
}

/// One generated method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodShape {
    /// Method name.
    pub name: String,
    /// Form of the method.
    pub kind: MethodKind,
    /// Symbolic name constant the method targets, if any.
    pub constant: Option<String>,
    /// Request type, if the method forwards one.
    pub request: Option<TypeRef>,
    /// Response type (`()` when none).
    pub response: TypeRef,
}

impl MethodShape {
    fn new(name: impl Into<String>, kind: MethodKind, response: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind,
            constant: None,
            request: None,
            response,
        }
    }

    fn plain(name: &str, kind: MethodKind) -> Self {
        Self::new(name, kind, TypeRef::unit())
    }

    fn targeting(mut self, constant: &str) -> Self {
        self.constant = Some(constant.to_string());
        self
    }

    fn with_request(mut self, request: Option<TypeRef>) -> Self {
        self.request = request;
        self
    }
}

/// A generated trait plus its private implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceShape {
    /// Trait name.
    pub name: String,
    /// Implementation struct name.
    pub implementation: String,
    /// Which trait this is.
    pub role: InterfaceRole,
    /// Methods in emission order.
    pub methods: Vec<MethodShape>,
}

impl InterfaceShape {
    fn new(name: String, role: InterfaceRole) -> Self {
        Self {
            implementation: naming::implementation(&name),
            name,
            role,
            methods: Vec::new(),
        }
    }

    /// Looks a method up by name.
    pub fn method(&self, name: &str) -> Option<&MethodShape> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Method names in emission order.
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.name.as_str()).collect()
    }
}

/// A `pub const NAME: &str = "value";`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantShape {
    /// Constant name.
    pub name: String,
    /// String value.
    pub value: String,
}

/// A function returning the runtime channel of one signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalChannelShape {
    /// Function name.
    pub provider: String,
    /// Constant of the signal.
    pub constant: String,
    /// Signal payload type.
    pub request: TypeRef,
}

/// Signal channel carried by a workflow input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelShape {
    /// Accessor (and field) name.
    pub accessor: String,
    /// Provider function that creates the channel.
    pub provider: String,
    /// Signal payload type.
    pub request: TypeRef,
}

/// The `{S}Input` struct handed to a workflow factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputShape {
    /// Struct name.
    pub name: String,
    /// Type of the public `request` field.
    pub request: TypeRef,
    /// Signal channels, in declaration order.
    pub channels: Vec<ChannelShape>,
}

/// The `{S}Controller` of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowControllerShape {
    /// Struct name.
    pub name: String,
    /// The execute operation, when there is one.
    pub execute: Option<UserCall>,
    /// Query handlers wired on every run.
    pub queries: Vec<Registration>,
    /// Update handlers wired on every run.
    pub updates: Vec<Registration>,
}

/// Everything generated for one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowShape {
    /// User trait name.
    pub service: String,
    /// `{S}_NAME`.
    pub name_constant: String,
    /// `{S}_TASK_QUEUE`.
    pub task_queue_constant: String,
    /// Execute request type.
    pub request: TypeRef,
    /// Execute response type.
    pub response: TypeRef,
    /// `{S}Run`.
    pub run: InterfaceShape,
    /// `{S}ChildRun`.
    pub child_run: InterfaceShape,
    /// `{S}ExternalRun`.
    pub external_run: InterfaceShape,
    /// `{S}Client`.
    pub client: InterfaceShape,
    /// `{S}ChildClient`.
    pub child_client: InterfaceShape,
    /// `new_{s}_client`.
    pub client_constructor: String,
    /// `new_{s}_child_client`.
    pub child_client_constructor: String,
    /// `{S}Input`.
    pub input: InputShape,
    /// `{S}Factory` alias name.
    pub factory: String,
    /// `{S}Controller`.
    pub controller: WorkflowControllerShape,
}

/// Everything generated for one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityShape {
    /// User trait name.
    pub service: String,
    /// `{S}_TASK_QUEUE`.
    pub task_queue_constant: String,
    /// `{S}Proxy`.
    pub proxy: InterfaceShape,
    /// `new_{s}_proxy`.
    pub proxy_constructor: String,
    /// `{S}Controller` name.
    pub controller: String,
    /// One registration per operation.
    pub registrations: Vec<Registration>,
}

/// One HTTP route of a plain service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteShape {
    /// HTTP method, upper case.
    pub method: String,
    /// Route path.
    pub path: String,
    /// Operation constant.
    pub constant: String,
    /// The wrapped method.
    pub call: UserCall,
}

/// Everything generated for one plain service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpServiceShape {
    /// User trait name.
    pub service: String,
    /// `{S}Controller` name.
    pub controller: String,
    /// Routes in declaration order, one per operation and method.
    pub routes: Vec<RouteShape>,
}

/// Per-service output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceShape {
    /// `weft:activity`.
    Activity(ActivityShape),
    /// `weft:workflow`.
    Workflow(WorkflowShape),
    /// `weft:service`.
    Service(HttpServiceShape),
}

/// An accessor on a package aggregate trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateEntry {
    /// Accessor name.
    pub accessor: String,
    /// Trait the accessor returns.
    pub interface: String,
    /// Constructor of that trait object.
    pub constructor: String,
}

/// A field of `WorkerController`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerEntry {
    /// Field name.
    pub field: String,
    /// Controller type.
    pub controller: String,
}

/// Package-wide aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    /// `WorkflowClients` accessors.
    pub workflow_clients: Vec<AggregateEntry>,
    /// `WorkflowProxies` accessors.
    pub workflow_proxies: Vec<AggregateEntry>,
    /// `ActivityProxies` accessors.
    pub activity_proxies: Vec<AggregateEntry>,
    /// `WorkerController` fields.
    pub controllers: Vec<ControllerEntry>,
}

/// An operation left out of generation, reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    /// Where it is declared.
    pub location: Location,
    /// Why it was left out.
    pub reason: String,
}

/// Everything generated for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageShape {
    /// Package name.
    pub package: String,
    /// Source path the package was read from.
    pub source_path: String,
    /// Constants in emission order.
    pub constants: Vec<ConstantShape>,
    /// Signal channel providers.
    pub signal_channels: Vec<SignalChannelShape>,
    /// Per-service output in declaration order.
    pub services: Vec<ServiceShape>,
    /// Package aggregates.
    pub aggregates: Aggregates,
    /// Operations left out of generation.
    pub skipped: Vec<Skipped>,
}

impl PackageShape {
    /// Decides what to generate for `package`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`GenerateError::Validation`] listing every
    /// problem when a workflow does not have exactly one execute operation,
    /// a declaration or operation asks for more than one kind, or an operation
    /// takes more parameters than the calling convention allows. In both
    /// modes, two items mapping to the same constant name are an error.
    pub fn build(package: &Package, options: &GenOptions) -> Result<Self, GenerateError> {
        let mut builder = Builder {
            package,
            options,
            classifier: Classifier::new(options.marker.clone()),
            problems: Vec::new(),
            shape: PackageShape {
                package: package.name.clone(),
                source_path: package.source_path.clone(),
                constants: vec![ConstantShape {
                    name: naming::PACKAGE_CONSTANT.to_string(),
                    value: package.name.clone(),
                }],
                signal_channels: Vec::new(),
                services: Vec::new(),
                aggregates: Aggregates::default(),
                skipped: Vec::new(),
            },
        };

        for service in &package.services {
            builder.service(service);
        }

        if !builder.problems.is_empty() {
            return Err(GenerateError::Validation {
                package: package.name.clone(),
                problems: builder.problems,
            });
        }

        debug!(
            package = %package.name,
            services = builder.shape.services.len(),
            constants = builder.shape.constants.len(),
            "Built package shape"
        );
        Ok(builder.shape)
    }

    /// The workflow shape of `service`.
    pub fn workflow(&self, service: &str) -> Option<&WorkflowShape> {
        self.services.iter().find_map(|s| match s {
            ServiceShape::Workflow(w) if w.service == service => Some(w),
            _ => None,
        })
    }

    /// The activity shape of `service`.
    pub fn activity(&self, service: &str) -> Option<&ActivityShape> {
        self.services.iter().find_map(|s| match s {
            ServiceShape::Activity(a) if a.service == service => Some(a),
            _ => None,
        })
    }

    /// The plain service shape of `service`.
    pub fn http_service(&self, service: &str) -> Option<&HttpServiceShape> {
        self.services.iter().find_map(|s| match s {
            ServiceShape::Service(h) if h.service == service => Some(h),
            _ => None,
        })
    }

    /// Value of the constant `name`.
    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }
}

struct Builder<'a> {
    package: &'a Package,
    options: &'a GenOptions,
    classifier: Classifier,
    problems: Vec<String>,
    shape: PackageShape,
}

impl Builder<'_> {
    fn constant(&mut self, name: String, value: String) -> String {
        if let Some(existing) = self.shape.constants.iter().find(|c| c.name == name) {
            self.problems.push(format!(
                "constant `{}` would be generated for both `{}` and `{}`",
                name, existing.value, value
            ));
            return name;
        }
        self.shape.constants.push(ConstantShape {
            name: name.clone(),
            value,
        });
        name
    }

    fn service(&mut self, service: &Service) {
        if self.options.strict && service.declared_kinds.len() > 1 {
            let kinds: Vec<&str> = service.declared_kinds.iter().map(|k| k.segment()).collect();
            self.problems.push(format!(
                "`{}` is tagged with more than one kind ({})",
                service.name,
                kinds.join(", ")
            ));
        }

        let operations = self.usable_operations(service);

        self.constant(
            naming::service_constant(&service.name),
            naming::service_symbol(&self.package.name, &service.name),
        );
        let shape = match service.kind {
            ServiceKind::Activity => ServiceShape::Activity(self.activity(service, &operations)),
            ServiceKind::Workflow => ServiceShape::Workflow(self.workflow(service, &operations)),
            ServiceKind::Service => ServiceShape::Service(self.http_service(service, &operations)),
        };
        self.shape.services.push(shape);
    }

    /// Operations that fit the calling convention. Others are problems in
    /// strict mode and skipped otherwise.
    fn usable_operations<'s>(&mut self, service: &'s Service) -> Vec<&'s Operation> {
        let mut usable = Vec::new();
        for op in &service.operations {
            if self.options.strict && op.declared_kinds.len() > 1 {
                let kinds: Vec<&str> = op
                    .declared_kinds
                    .iter()
                    .filter_map(|k| k.segment())
                    .collect();
                self.problems.push(format!(
                    "`{}::{}` is tagged with more than one operation kind ({})",
                    service.name,
                    op.name,
                    kinds.join(", ")
                ));
            }

            let limit = match op.kind {
                OperationKind::Query => 1,
                _ => 2,
            };
            if op.params.len() > limit {
                let reason = format!(
                    "`{}::{}` takes {} parameters; at most {} expected ({})",
                    service.name,
                    op.name,
                    op.params.len(),
                    limit,
                    if limit == 1 {
                        "request"
                    } else {
                        "context, request"
                    }
                );
                if self.options.strict {
                    self.problems.push(reason);
                } else {
                    self.shape.skipped.push(Skipped {
                        location: op.location.clone(),
                        reason,
                    });
                }
                continue;
            }
            usable.push(op);
        }
        usable
    }

    fn task_queue(&mut self, service: &Service) -> String {
        let queue = self
            .classifier
            .top_tag(service)
            .and_then(|tag| tag.options.get("task_queue"))
            .unwrap_or(self.package.name.as_str())
            .to_string();
        self.constant(naming::task_queue_constant(&service.name), queue)
    }

    fn operation_constant(&mut self, service: &Service, op: &Operation) -> String {
        self.constant(
            naming::operation_constant(&service.name, &op.name),
            naming::operation_symbol(&self.package.name, &service.name, &op.name),
        )
    }

    fn activity(&mut self, service: &Service, operations: &[&Operation]) -> ActivityShape {
        let names = TypeNames::new(&service.name);
        let task_queue_constant = self.task_queue(service);
        let mut proxy = InterfaceShape::new(names.proxy(), InterfaceRole::ActivityProxy);
        let mut registrations = Vec::new();

        for op in operations {
            let constant = self.operation_constant(service, op);
            let request = op.request().map(|p| p.ty.clone());
            let response = op.response_type();
            proxy.methods.push(
                MethodShape::new(naming::method(&op.name), MethodKind::Call, response.clone())
                    .targeting(&constant)
                    .with_request(request.clone()),
            );
            proxy.methods.push(
                MethodShape::new(naming::async_method(&op.name), MethodKind::CallAsync, response)
                    .targeting(&constant)
                    .with_request(request),
            );
            registrations.push(Registration {
                constant,
                call: UserCall::of(op),
            });
        }

        let proxy_constructor = naming::constructor(&proxy.name);
        self.shape.aggregates.activity_proxies.push(AggregateEntry {
            accessor: naming::service_field(&service.name),
            interface: proxy.name.clone(),
            constructor: proxy_constructor.clone(),
        });
        self.shape.aggregates.controllers.push(ControllerEntry {
            field: naming::service_field(&service.name),
            controller: names.controller(),
        });

        ActivityShape {
            service: service.name.clone(),
            task_queue_constant,
            proxy,
            proxy_constructor,
            controller: names.controller(),
            registrations,
        }
    }

    fn workflow(&mut self, service: &Service, operations: &[&Operation]) -> WorkflowShape {
        let names = TypeNames::new(&service.name);
        let name_constant = naming::service_constant(&service.name);
        let task_queue_constant = self.task_queue(service);

        let executes: Vec<&Operation> = operations
            .iter()
            .copied()
            .filter(|op| op.kind == OperationKind::Execute)
            .collect();
        if self.options.strict && executes.len() != 1 {
            if executes.is_empty() {
                self.problems.push(format!(
                    "workflow `{}` has no `{}:workflow:execute` operation",
                    service.name,
                    self.classifier.marker()
                ));
            } else {
                let found: Vec<&str> = executes.iter().map(|op| op.name.as_str()).collect();
                self.problems.push(format!(
                    "workflow `{}` has {} execute operations ({}); exactly one is allowed",
                    service.name,
                    executes.len(),
                    found.join(", ")
                ));
            }
        }
        let execute = executes.first().copied();
        let request = execute.map_or_else(TypeRef::unit, |op| op.request_type());
        let response = execute.map_or_else(TypeRef::unit, |op| op.response_type());

        let mut run = InterfaceShape::new(names.run(), InterfaceRole::Run);
        let mut child_run = InterfaceShape::new(names.child_run(), InterfaceRole::ChildRun);
        let mut external_run =
            InterfaceShape::new(names.external_run(), InterfaceRole::ExternalRun);
        let mut client = InterfaceShape::new(names.client(), InterfaceRole::Client);
        let mut child_client = InterfaceShape::new(names.child_client(), InterfaceRole::ChildClient);

        run.methods.extend([
            MethodShape::plain("workflow_id", MethodKind::WorkflowId),
            MethodShape::plain("run_id", MethodKind::RunId),
            MethodShape::new("get", MethodKind::Get, response.clone()),
        ]);
        child_run.methods.extend([
            MethodShape::plain("workflow_id", MethodKind::WorkflowId),
            MethodShape::plain("is_ready", MethodKind::IsReady),
            MethodShape::plain("underlying", MethodKind::Underlying),
            MethodShape::new("get", MethodKind::Get, response.clone()),
            MethodShape::plain("wait_start", MethodKind::WaitStart),
            MethodShape::new("select", MethodKind::Select, response.clone()),
            MethodShape::plain("select_start", MethodKind::SelectStart),
        ]);
        external_run.methods.extend([
            MethodShape::plain("workflow_id", MethodKind::WorkflowId),
            MethodShape::plain("run_id", MethodKind::RunId),
            MethodShape::plain("request_cancellation", MethodKind::RequestCancellation),
        ]);
        client.methods.extend([
            MethodShape::new("execute", MethodKind::Execute, response.clone())
                .targeting(&name_constant)
                .with_request(Some(request.clone())),
            MethodShape::new("get_handle", MethodKind::GetHandle, response.clone()),
        ]);
        child_client.methods.extend([
            MethodShape::new("execute", MethodKind::Execute, response.clone())
                .targeting(&name_constant)
                .with_request(Some(request.clone())),
            MethodShape::new("execute_async", MethodKind::ExecuteAsync, response.clone())
                .targeting(&name_constant)
                .with_request(Some(request.clone())),
            MethodShape::plain("external", MethodKind::External),
        ]);

        let mut channels = Vec::new();
        let mut queries = Vec::new();
        let mut updates = Vec::new();

        for op in operations {
            let op_request = op.request().map(|p| p.ty.clone());
            match op.kind {
                OperationKind::Query => {
                    let constant = self.operation_constant(service, op);
                    run.methods.push(
                        MethodShape::new(
                            naming::method(&op.name),
                            MethodKind::Query,
                            op.response_type(),
                        )
                        .targeting(&constant)
                        .with_request(op_request),
                    );
                    queries.push(Registration {
                        constant,
                        call: UserCall::of(op),
                    });
                }
                OperationKind::Update => {
                    let constant = self.operation_constant(service, op);
                    run.methods.extend([
                        MethodShape::new(
                            naming::method(&op.name),
                            MethodKind::Update,
                            op.response_type(),
                        )
                        .targeting(&constant)
                        .with_request(op_request.clone()),
                        MethodShape::new(
                            naming::async_method(&op.name),
                            MethodKind::UpdateAsync,
                            op.response_type(),
                        )
                        .targeting(&constant)
                        .with_request(op_request),
                    ]);
                    updates.push(Registration {
                        constant,
                        call: UserCall::of(op),
                    });
                }
                OperationKind::Signal => {
                    let constant = self.operation_constant(service, op);
                    let signal_type = op.request_type();
                    let method = naming::method(&op.name);
                    let async_method = naming::async_method(&op.name);

                    let signal = MethodShape::plain(&method, MethodKind::Signal)
                        .targeting(&constant)
                        .with_request(op_request.clone());
                    let signal_async = MethodShape::plain(&async_method, MethodKind::SignalAsync)
                        .targeting(&constant)
                        .with_request(op_request);
                    run.methods.push(signal.clone());
                    child_run
                        .methods
                        .extend([signal.clone(), signal_async.clone()]);
                    external_run.methods.extend([signal, signal_async]);
                    client.methods.push(
                        MethodShape::new(
                            naming::execute_with(&op.name),
                            MethodKind::ExecuteWithSignal {
                                signal: signal_type.clone(),
                            },
                            response.clone(),
                        )
                        .targeting(&constant)
                        .with_request(Some(request.clone())),
                    );

                    let provider = naming::signal_channel_provider(&service.name, &op.name);
                    self.shape.signal_channels.push(SignalChannelShape {
                        provider: provider.clone(),
                        constant,
                        request: signal_type.clone(),
                    });
                    channels.push(ChannelShape {
                        accessor: naming::channel_method(&op.name),
                        provider,
                        request: signal_type,
                    });
                }
                OperationKind::Execute => {
                    self.operation_constant(service, op);
                }
                OperationKind::Method => {
                    self.shape.skipped.push(Skipped {
                        location: op.location.clone(),
                        reason: format!(
                            "`{}::{}` has no `{}:workflow:<kind>` tag",
                            service.name,
                            op.name,
                            self.classifier.marker()
                        ),
                    });
                }
            }
        }

        let client_constructor = naming::constructor(&client.name);
        let child_client_constructor = naming::constructor(&child_client.name);
        let field = naming::service_field(&service.name);
        self.shape.aggregates.workflow_clients.push(AggregateEntry {
            accessor: field.clone(),
            interface: client.name.clone(),
            constructor: client_constructor.clone(),
        });
        self.shape.aggregates.workflow_proxies.push(AggregateEntry {
            accessor: field.clone(),
            interface: child_client.name.clone(),
            constructor: child_client_constructor.clone(),
        });
        self.shape.aggregates.controllers.push(ControllerEntry {
            field,
            controller: names.controller(),
        });

        WorkflowShape {
            service: service.name.clone(),
            name_constant,
            task_queue_constant,
            request: request.clone(),
            response,
            run,
            child_run,
            external_run,
            client,
            child_client,
            client_constructor,
            child_client_constructor,
            input: InputShape {
                name: names.input(),
                request,
                channels,
            },
            factory: names.factory(),
            controller: WorkflowControllerShape {
                name: names.controller(),
                execute: execute.map(UserCall::of),
                queries,
                updates,
            },
        }
    }

    fn http_service(&mut self, service: &Service, operations: &[&Operation]) -> HttpServiceShape {
        let names = TypeNames::new(&service.name);
        let route_tag = self.classifier.route();
        let mut routes = Vec::new();

        for op in operations {
            let constant = self.operation_constant(service, op);
            let tag = op.tags.find(&route_tag);

            let path = tag
                .and_then(|t| t.options.get("path"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("/{}/{}", self.package.name, op.name));

            let mut methods: Vec<String> = tag
                .map(|t| t.options.get_all("method"))
                .unwrap_or_default()
                .iter()
                .map(|m| m.to_ascii_uppercase())
                .collect();
            if methods.is_empty() {
                methods.push(self.options.http_method.to_ascii_uppercase());
            }
            let mut seen = HashSet::new();
            methods.retain(|m| seen.insert(m.clone()));

            for method in methods {
                routes.push(RouteShape {
                    method,
                    path: path.clone(),
                    constant: constant.clone(),
                    call: UserCall::of(op),
                });
            }
        }

        HttpServiceShape {
            service: service.name.clone(),
            controller: names.controller(),
            routes,
        }
    }
}
