// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::diagnostic::{Diagnostic, Location, Severity};

/// A stored analyzer result.
pub(crate) type Slot = Arc<dyn Any + Send + Sync>;

/// A pass over one compilation unit of type `U`.
///
/// Implementations are plain immutable values. Configuration lives in their
/// fields; the type itself identifies the analyzer and keys its result.
/// When two instances of the same type are reachable, the first one discovered
/// wins.
pub trait Analyzer<U>: Send + Sync + 'static {
    /// Result type recorded for each unit.
    type Output: Send + Sync + 'static;

    /// Short stable name used in logs, diagnostics and errors.
    fn name(&self) -> &'static str;

    /// Analyzers whose results this one reads.
    fn requires(&self) -> Vec<AnalyzerRef<U>> {
        Vec::new()
    }

    /// Computes the result for the unit in `pass`.
    fn run(&self, pass: &Pass<'_, U>) -> anyhow::Result<Self::Output>;
}

/// Object-safe view of an [`Analyzer`], implemented for every analyzer.
pub trait ErasedAnalyzer<U>: Send + Sync {
    /// `TypeId` of the concrete analyzer type.
    fn analyzer_id(&self) -> TypeId;

    /// See [`Analyzer::name`].
    fn analyzer_name(&self) -> &'static str;

    /// See [`Analyzer::requires`].
    fn dependencies(&self) -> Vec<AnalyzerRef<U>>;

    /// Runs the analyzer and boxes its result.
    fn run_erased(&self, pass: &Pass<'_, U>) -> anyhow::Result<Arc<dyn Any + Send + Sync>>;
}

impl<U, A: Analyzer<U>> ErasedAnalyzer<U> for A {
    fn analyzer_id(&self) -> TypeId {
        TypeId::of::<A>()
    }

    fn analyzer_name(&self) -> &'static str {
        self.name()
    }

    fn dependencies(&self) -> Vec<AnalyzerRef<U>> {
        self.requires()
    }

    fn run_erased(&self, pass: &Pass<'_, U>) -> anyhow::Result<Arc<dyn Any + Send + Sync>> {
        let output = self.run(pass)?;
        Ok(Arc::new(output))
    }
}

/// Shared handle to a type-erased analyzer.
pub type AnalyzerRef<U> = Arc<dyn ErasedAnalyzer<U>>;

/// Wraps an analyzer value into an [`AnalyzerRef`].
pub fn analyzer<U, A: Analyzer<U>>(analyzer: A) -> AnalyzerRef<U> {
    Arc::new(analyzer)
}

/// What an analyzer sees while it runs.
///
/// Holds the unit, the results of the analyzer's declared dependencies and a
/// local diagnostic sink. Results of analyzers that were not declared in
/// [`Analyzer::requires`] are never visible.
pub struct Pass<'a, U> {
    unit: &'a U,
    analyzer: &'static str,
    dependencies: HashMap<TypeId, Slot>,
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl<'a, U> Pass<'a, U> {
    pub(crate) fn new(
        unit: &'a U,
        analyzer: &'static str,
        dependencies: HashMap<TypeId, Slot>,
    ) -> Self {
        Self {
            unit,
            analyzer,
            dependencies,
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// The compilation unit being analyzed.
    pub fn unit(&self) -> &'a U {
        self.unit
    }

    /// Name of the running analyzer.
    pub fn analyzer(&self) -> &'static str {
        self.analyzer
    }

    /// Result of dependency `A`, or `None` when `A` failed in continue-on-error
    /// mode or is not a declared dependency.
    pub fn result_of<A: Analyzer<U>>(&self) -> Option<&A::Output> {
        self.dependencies
            .get(&TypeId::of::<A>())
            .and_then(|slot| slot.downcast_ref::<A::Output>())
    }

    /// Like [`Pass::result_of`] but turns an absent result into an error.
    pub fn require<A: Analyzer<U>>(&self) -> anyhow::Result<&A::Output> {
        self.result_of::<A>().ok_or_else(|| {
            anyhow::anyhow!(
                "analyzer `{}` has no result from `{}`",
                self.analyzer,
                short_type_name::<A>()
            )
        })
    }

    /// Records a diagnostic.
    pub fn report(
        &self,
        severity: Severity,
        location: Option<Location>,
        message: impl Into<String>,
    ) {
        self.diagnostics.borrow_mut().push(Diagnostic {
            severity,
            location,
            message: message.into(),
            analyzer: self.analyzer,
        });
    }

    /// Records a warning at `location`.
    pub fn warn(&self, location: Location, message: impl Into<String>) {
        self.report(Severity::Warning, Some(location), message);
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

/// Results of one unit's walk, readable without locking.
pub struct UnitResults<U> {
    slots: HashMap<TypeId, Slot>,
    unit: PhantomData<fn(&U)>,
}

impl<U> UnitResults<U> {
    pub(crate) fn new(slots: HashMap<TypeId, Slot>) -> Self {
        Self {
            slots,
            unit: PhantomData,
        }
    }

    /// Result recorded by analyzer `A` for this unit.
    pub fn get<A: Analyzer<U>>(&self) -> Option<&A::Output> {
        self.slots
            .get(&TypeId::of::<A>())
            .and_then(|slot| slot.downcast_ref::<A::Output>())
    }

    /// Number of analyzers that recorded a result.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no analyzer recorded a result.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<U> std::fmt::Debug for UnitResults<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitResults")
            .field("len", &self.slots.len())
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
