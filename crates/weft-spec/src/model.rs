// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The normalized service model.
//!
//! One [`Package`] is built per source file. It is immutable once the extractor
//! returns it and is shared read-only with code generation.

use serde::Serialize;
use std::fmt;

use weft_analysis::Location;
use weft_decor::TagList;

/// A type as written in the source, kept as token text.
///
/// The text is forwarded to generated code verbatim and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    /// Wraps token text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The unit type `()`.
    pub fn unit() -> Self {
        Self("()".to_string())
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parameter or result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Binding name, when the source gave a plain identifier.
    pub name: Option<String>,
    /// Declared type.
    pub ty: TypeRef,
}

impl Param {
    /// A named parameter.
    pub fn named(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    /// An unnamed parameter or result.
    pub fn unnamed(ty: TypeRef) -> Self {
        Self { name: None, ty }
    }
}

/// Top-level classification of a service declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Plain request/response service exposed over HTTP.
    Service,
    /// Durable, externally retried call unit.
    Activity,
    /// Long-running stateful process.
    Workflow,
}

impl ServiceKind {
    /// The tag segment selecting this kind (`weft:<segment>`).
    pub fn segment(self) -> &'static str {
        match self {
            ServiceKind::Service => "service",
            ServiceKind::Activity => "activity",
            ServiceKind::Workflow => "workflow",
        }
    }

    /// Every kind, in the order they are checked.
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::Service,
        ServiceKind::Activity,
        ServiceKind::Workflow,
    ];
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Classification of a single operation.
///
/// Operations of activities and plain services are always [`OperationKind::Method`].
/// Workflow operations take the kind of their `weft:workflow:<kind>` tag, or
/// `Method` when they carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Ordinary method.
    Method,
    /// The workflow entry point.
    Execute,
    /// Request/response mutation of a running workflow.
    Update,
    /// Side-effect free read of a running workflow.
    Query,
    /// Fire-and-forget event sent to a workflow.
    Signal,
}

impl OperationKind {
    /// The tag segment selecting this kind (`weft:workflow:<segment>`).
    pub fn segment(self) -> Option<&'static str> {
        match self {
            OperationKind::Method => None,
            OperationKind::Execute => Some("execute"),
            OperationKind::Update => Some("update"),
            OperationKind::Query => Some("query"),
            OperationKind::Signal => Some("signal"),
        }
    }

    /// Workflow operation kinds, in the order they are checked.
    pub const WORKFLOW: [OperationKind; 4] = [
        OperationKind::Execute,
        OperationKind::Update,
        OperationKind::Query,
        OperationKind::Signal,
    ];
}

/// One method of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    /// Method name as declared.
    pub name: String,
    /// Doc comment text.
    pub docs: String,
    /// Parameters after the receiver.
    pub params: Vec<Param>,
    /// Results. A `Result<T, E>` return is two results.
    pub results: Vec<Param>,
    /// Tags on the method.
    pub tags: TagList,
    /// Resolved kind (first matching tag).
    pub kind: OperationKind,
    /// Every workflow kind the tags asked for, in tag order.
    pub declared_kinds: Vec<OperationKind>,
    /// Where the method is declared.
    pub location: Location,
}

impl Operation {
    /// The execution context parameter. Queries have none.
    pub fn context(&self) -> Option<&Param> {
        match self.kind {
            OperationKind::Query => None,
            _ => self.params.first(),
        }
    }

    /// The request parameter.
    pub fn request(&self) -> Option<&Param> {
        match self.kind {
            OperationKind::Query => self.params.first(),
            _ => self.params.get(1),
        }
    }

    /// The success result.
    pub fn response(&self) -> Option<&Param> {
        self.results.first()
    }

    /// Request type, or `()` when the operation takes none.
    pub fn request_type(&self) -> TypeRef {
        self.request()
            .map(|p| p.ty.clone())
            .unwrap_or_else(TypeRef::unit)
    }

    /// Response type, or `()` when the operation returns nothing.
    pub fn response_type(&self) -> TypeRef {
        self.response()
            .map(|p| p.ty.clone())
            .unwrap_or_else(TypeRef::unit)
    }

    /// Whether the operation returns a `Result`.
    pub fn is_fallible(&self) -> bool {
        self.results.len() == 2
    }
}

/// A tagged trait declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    /// Trait name.
    pub name: String,
    /// Doc comment text.
    pub docs: String,
    /// Tags on the trait.
    pub tags: TagList,
    /// Resolved kind (first matching tag).
    pub kind: ServiceKind,
    /// Every top kind the tags asked for, in tag order.
    pub declared_kinds: Vec<ServiceKind>,
    /// Methods in declaration order.
    pub operations: Vec<Operation>,
    /// Where the trait is declared.
    pub location: Location,
}

impl Service {
    /// Operations of the given kind, in declaration order.
    pub fn operations_of(&self, kind: OperationKind) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }

    /// Operations of any of the given kinds, in declaration order.
    pub fn operations_in<'a>(
        &'a self,
        kinds: &'a [OperationKind],
    ) -> impl Iterator<Item = &'a Operation> {
        self.operations
            .iter()
            .filter(move |op| kinds.contains(&op.kind))
    }

    /// The first `Execute` operation.
    pub fn execute(&self) -> Option<&Operation> {
        self.operations_of(OperationKind::Execute).next()
    }

    /// Signal operations.
    pub fn signals(&self) -> impl Iterator<Item = &Operation> {
        self.operations_of(OperationKind::Signal)
    }

    /// Query operations.
    pub fn queries(&self) -> impl Iterator<Item = &Operation> {
        self.operations_of(OperationKind::Query)
    }

    /// Update operations.
    pub fn updates(&self) -> impl Iterator<Item = &Operation> {
        self.operations_of(OperationKind::Update)
    }
}

/// All services declared in one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Package name, the first segment of every symbolic name.
    pub name: String,
    /// Source file path relative to the working directory.
    pub source_path: String,
    /// Services in declaration order.
    pub services: Vec<Service>,
}

impl Package {
    /// Services of the given kind, in declaration order.
    pub fn services_of(&self, kind: ServiceKind) -> impl Iterator<Item = &Service> {
        self.services.iter().filter(move |svc| svc.kind == kind)
    }

    /// Whether the package declares no services.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(kind: OperationKind, params: &[&str], results: &[&str]) -> Operation {
        Operation {
            name: "Op".to_string(),
            docs: String::new(),
            params: params.iter().map(|t| Param::unnamed(TypeRef::new(*t))).collect(),
            results: results.iter().map(|t| Param::unnamed(TypeRef::new(*t))).collect(),
            tags: TagList::default(),
            kind,
            declared_kinds: Vec::new(),
            location: Location::new("lib.rs", 1, 0),
        }
    }

    #[test]
    fn test_positional_convention() {
        let update = op(OperationKind::Update, &["& Context", "Req"], &["Res", "Error"]);
        assert_eq!(update.context().unwrap().ty.as_str(), "& Context");
        assert_eq!(update.request_type().as_str(), "Req");
        assert_eq!(update.response_type().as_str(), "Res");
        assert!(update.is_fallible());

        let query = op(OperationKind::Query, &["Req"], &["Res"]);
        assert!(query.context().is_none());
        assert_eq!(query.request_type().as_str(), "Req");
        assert!(!query.is_fallible());
    }

    #[test]
    fn test_missing_request_and_response_default_to_unit() {
        let signal = op(OperationKind::Signal, &["& Context"], &[]);
        assert_eq!(signal.request_type(), TypeRef::unit());
        assert_eq!(signal.response_type(), TypeRef::unit());
    }
}
