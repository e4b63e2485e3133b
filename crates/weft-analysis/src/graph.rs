// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::analyzer::AnalyzerRef;
use crate::error::GraphError;

/// A validated, acyclic analyzer graph.
///
/// Nodes are stored in first-discovery order (depth-first from the roots, in
/// the order requirements are listed). Edges point from a node to the nodes it
/// requires.
pub struct Graph<U> {
    nodes: Vec<Node<U>>,
    levels: Vec<Vec<usize>>,
}

pub(crate) struct Node<U> {
    pub(crate) analyzer: AnalyzerRef<U>,
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) deps: Vec<usize>,
}

impl<U> Graph<U> {
    /// Collects the transitive closure of `roots` and validates it is acyclic.
    pub fn build(roots: &[AnalyzerRef<U>]) -> Result<Self, GraphError> {
        if roots.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index: HashMap<TypeId, usize> = HashMap::new();
        let mut nodes: Vec<Node<U>> = Vec::new();
        let mut pending: Vec<(usize, Vec<AnalyzerRef<U>>)> = Vec::new();

        for root in roots {
            discover(root, &mut index, &mut nodes, &mut pending);
        }

        // Resolve edges. Discovering a dependency may queue more work.
        while let Some((node, requires)) = pending.pop() {
            let mut deps = Vec::with_capacity(requires.len());
            for dep in &requires {
                let dep_index = discover(dep, &mut index, &mut nodes, &mut pending);
                if !deps.contains(&dep_index) {
                    deps.push(dep_index);
                }
            }
            nodes[node].deps = deps;
        }

        let graph = Self {
            nodes,
            levels: Vec::new(),
        };
        graph.detect_cycles()?;

        let levels = graph.layer();
        debug!(
            analyzers = graph.nodes.len(),
            levels = levels.len(),
            "Built analyzer graph"
        );
        Ok(Self { levels, ..graph })
    }

    /// Analyzer names in discovery order.
    pub fn names(&self) -> Vec<&'static str> {
        self.nodes.iter().map(|n| n.name).collect()
    }

    /// Names of the analyzers `name` requires directly.
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&'static str>> {
        self.nodes
            .iter()
            .find(|n| n.name == name)
            .map(|n| n.deps.iter().map(|&d| self.nodes[d].name).collect())
    }

    /// Topological layers. Every node appears after all its dependencies;
    /// nodes within a layer are independent of each other.
    pub fn levels(&self) -> Vec<Vec<&'static str>> {
        self.levels
            .iter()
            .map(|level| level.iter().map(|&i| self.nodes[i].name).collect())
            .collect()
    }

    /// Number of analyzers in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no analyzers. Never true for a built graph.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn nodes(&self) -> &[Node<U>] {
        &self.nodes
    }

    pub(crate) fn level_indices(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Depth-first search from every node, keeping the current path to report
    /// the cycle it closes.
    fn detect_cycles(&self) -> Result<(), GraphError> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        for start in 0..self.nodes.len() {
            self.dfs(start, &mut visited, &mut path)
                .map_err(|cycle| GraphError::Cycle {
                    path: cycle.iter().map(|&i| self.nodes[i].name).collect(),
                })?;
        }
        Ok(())
    }

    fn dfs(
        &self,
        node: usize,
        visited: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Result<(), Vec<usize>> {
        if let Some(pos) = path.iter().position(|&n| n == node) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(node);
            return Err(cycle);
        }

        if visited.contains(&node) {
            return Ok(());
        }

        path.push(node);
        for &dep in &self.nodes[node].deps {
            self.dfs(dep, visited, path)?;
        }
        path.pop();
        visited.insert(node);

        Ok(())
    }

    /// Kahn layering. Within a layer nodes keep discovery order, which makes
    /// the walk deterministic.
    fn layer(&self) -> Vec<Vec<usize>> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.deps.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for &dep in &node.deps {
                dependents[dep].push(i);
            }
        }

        let mut levels = Vec::new();
        let mut current: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| remaining[i] == 0)
            .collect();

        while !current.is_empty() {
            let mut next = Vec::new();
            for &i in &current {
                for &dependent in &dependents[i] {
                    remaining[dependent] -= 1;
                    if remaining[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            next.sort_unstable();
            levels.push(current);
            current = next;
        }

        levels
    }
}

fn discover<U>(
    analyzer: &AnalyzerRef<U>,
    index: &mut HashMap<TypeId, usize>,
    nodes: &mut Vec<Node<U>>,
    pending: &mut Vec<(usize, Vec<AnalyzerRef<U>>)>,
) -> usize {
    let id = analyzer.analyzer_id();
    if let Some(&existing) = index.get(&id) {
        return existing;
    }

    let position = nodes.len();
    index.insert(id, position);
    nodes.push(Node {
        analyzer: analyzer.clone(),
        id,
        name: analyzer.analyzer_name(),
        deps: Vec::new(),
    });
    pending.push((position, analyzer.dependencies()));
    position
}
