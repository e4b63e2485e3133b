// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::any::TypeId;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, debug_span, warn};

use crate::analyzer::{AnalyzerRef, Pass, Slot, UnitResults};
use crate::diagnostic::{Diagnostic, Severity};
use crate::error::{GraphError, WalkError};
use crate::graph::{Graph, Node};

/// Options controlling one walk.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum number of analyzers running at the same time. `0` is treated as `1`.
    pub parallelism: usize,
    /// Record analyzer failures as diagnostics and keep walking instead of
    /// aborting the unit.
    pub continue_on_error: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            parallelism: thread::available_parallelism().map_or(1, |n| n.get()),
            continue_on_error: false,
        }
    }
}

/// Everything one walk produced.
#[derive(Debug)]
pub struct UnitOutcome<U> {
    /// Results of every analyzer that succeeded.
    pub results: UnitResults<U>,
    /// Diagnostics in walk order.
    pub diagnostics: Vec<Diagnostic>,
    /// Analyzers that failed (continue-on-error mode only).
    pub failed: Vec<&'static str>,
}

impl<U> UnitOutcome<U> {
    /// Whether any analyzer failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Executes a validated analyzer graph once per unit.
pub struct Runner<U> {
    graph: Graph<U>,
}

struct Finished {
    node: usize,
    diagnostics: Vec<Diagnostic>,
    error: Option<WalkError>,
}

impl<U: Sync> Runner<U> {
    /// Builds and validates the graph for `roots`.
    pub fn new(roots: Vec<AnalyzerRef<U>>) -> Result<Self, GraphError> {
        Ok(Self {
            graph: Graph::build(&roots)?,
        })
    }

    /// The validated graph.
    pub fn graph(&self) -> &Graph<U> {
        &self.graph
    }

    /// Runs every analyzer exactly once for `unit`, each after all of its
    /// dependencies finished.
    ///
    /// Analyzers of the same level run on scoped threads, at most
    /// `options.parallelism` at a time. Without `continue_on_error` the first
    /// failure stops the walk once the running batch has finished.
    pub fn execute(&self, unit: &U, options: &WalkOptions) -> Result<UnitOutcome<U>, WalkError> {
        let span = debug_span!("walk", analyzers = self.graph.len());
        let _enter = span.enter();

        let store: Mutex<HashMap<TypeId, Slot>> = Mutex::new(HashMap::new());
        let nodes = self.graph.nodes();
        let batch_size = options.parallelism.max(1);

        let mut diagnostics = Vec::new();
        let mut failed = Vec::new();

        for level in self.graph.level_indices() {
            for batch in level.chunks(batch_size) {
                let finished = if batch.len() == 1 {
                    let node = batch[0];
                    let done = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_node(nodes, node, unit, &store)
                    }));
                    vec![done.unwrap_or_else(|payload| panicked(nodes, node, payload.as_ref()))]
                } else {
                    run_batch(nodes, batch, unit, &store)
                };

                let mut first_error = None;
                for done in finished {
                    diagnostics.extend(done.diagnostics);
                    let Some(err) = done.error else {
                        continue;
                    };
                    let name = nodes[done.node].name;
                    if options.continue_on_error {
                        let message = error_chain(&err);
                        warn!(analyzer = name, error = %message, "Analyzer failed, continuing");
                        diagnostics.push(Diagnostic {
                            severity: Severity::Error,
                            location: None,
                            message,
                            analyzer: name,
                        });
                        failed.push(name);
                    } else if first_error.is_none() {
                        first_error = Some(err);
                    }
                }

                if let Some(err) = first_error {
                    return Err(err);
                }
            }
        }

        Ok(UnitOutcome {
            results: UnitResults::new(store.into_inner()),
            diagnostics,
            failed,
        })
    }
}

fn run_batch<U: Sync>(
    nodes: &[Node<U>],
    batch: &[usize],
    unit: &U,
    store: &Mutex<HashMap<TypeId, Slot>>,
) -> Vec<Finished> {
    thread::scope(|scope| {
        let handles: Vec<_> = batch
            .iter()
            .map(|&node| (node, scope.spawn(move || run_node(nodes, node, unit, store))))
            .collect();

        handles
            .into_iter()
            .map(|(node, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|payload| panicked(nodes, node, payload.as_ref()))
            })
            .collect()
    })
}

fn run_node<U>(
    nodes: &[Node<U>],
    node: usize,
    unit: &U,
    store: &Mutex<HashMap<TypeId, Slot>>,
) -> Finished {
    let current = &nodes[node];

    // Dependencies finished in earlier levels, so nothing writes their slots now.
    let dependencies: HashMap<TypeId, Slot> = {
        let results = store.lock();
        current
            .deps
            .iter()
            .filter_map(|&dep| {
                let id = nodes[dep].id;
                results.get(&id).map(|slot| (id, slot.clone()))
            })
            .collect()
    };

    debug!(analyzer = current.name, "Running analyzer");
    let started = Instant::now();
    let pass = Pass::new(unit, current.name, dependencies);
    let result = current.analyzer.run_erased(&pass);
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let diagnostics = pass.into_diagnostics();

    let error = match result {
        Ok(slot) => {
            store.lock().insert(current.id, slot);
            debug!(analyzer = current.name, elapsed_ms, "Analyzer finished");
            None
        }
        Err(source) => {
            debug!(analyzer = current.name, elapsed_ms, "Analyzer failed");
            Some(WalkError::Analyzer {
                analyzer: current.name,
                source,
            })
        }
    };

    Finished {
        node,
        diagnostics,
        error,
    }
}

fn panicked<U>(nodes: &[Node<U>], node: usize, payload: &(dyn std::any::Any + Send)) -> Finished {
    Finished {
        node,
        diagnostics: Vec::new(),
        error: Some(WalkError::Panicked {
            analyzer: nodes[node].name,
            message: panic_message(payload),
        }),
    }
}

/// Renders a walk error with its source chain.
fn error_chain(err: &WalkError) -> String {
    match err {
        WalkError::Analyzer { source, .. } => format!("{:#}", source),
        WalkError::Panicked { message, .. } => format!("panicked: {}", message),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{Analyzer, analyzer};

    struct Count;
    struct Double;

    impl Analyzer<Vec<i32>> for Count {
        type Output = usize;
        fn name(&self) -> &'static str {
            "count"
        }
        fn run(&self, pass: &Pass<'_, Vec<i32>>) -> anyhow::Result<usize> {
            Ok(pass.unit().len())
        }
    }

    impl Analyzer<Vec<i32>> for Double {
        type Output = usize;
        fn name(&self) -> &'static str {
            "double"
        }
        fn requires(&self) -> Vec<AnalyzerRef<Vec<i32>>> {
            vec![analyzer(Count)]
        }
        fn run(&self, pass: &Pass<'_, Vec<i32>>) -> anyhow::Result<usize> {
            Ok(pass.require::<Count>()? * 2)
        }
    }

    #[test]
    fn test_typed_results() {
        let runner = Runner::new(vec![analyzer(Double)]).unwrap();
        let outcome = runner
            .execute(&vec![1, 2, 3], &WalkOptions::default())
            .unwrap();
        assert_eq!(outcome.results.get::<Count>(), Some(&3));
        assert_eq!(outcome.results.get::<Double>(), Some(&6));
        assert!(!outcome.has_failures());
    }

    #[test]
    fn test_zero_parallelism_runs_sequentially() {
        let runner = Runner::new(vec![analyzer(Double)]).unwrap();
        let options = WalkOptions {
            parallelism: 0,
            continue_on_error: false,
        };
        let outcome = runner.execute(&vec![7], &options).unwrap();
        assert_eq!(outcome.results.get::<Double>(), Some(&2));
    }
}
