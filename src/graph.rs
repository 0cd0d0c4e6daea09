//! Workload graph contract and a reference dependency graph.
//!
//! Policies never build or mutate topology; they only read two node
//! attributes through [`WorkloadGraph`]:
//!
//! - `size`: positive real cost of the artifact (the unit of hit/miss accounting)
//! - `in_degree`: number of dependents (incoming edges)
//!
//! ## Architecture
//!
//! ```text
//!   DependencyGraph<N>
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ order: Vec<N>             canonical (insertion) node order   │
//!   │ index: FxHashMap<N, usize> node → position in `attrs`        │
//!   │ attrs: Vec<NodeAttrs>     { size, in_degree }                │
//!   │ edges: FxHashSet<(usize, usize)>  simple digraph, no dupes   │
//!   └──────────────────────────────────────────────────────────────┘
//!
//!   add_edge(a, b):  a ──► b   ⇒  attrs[b].in_degree += 1
//! ```
//!
//! The graph is shared read-only between policies as `Arc<G>`.
//!
//! ## Example Usage
//!
//! ```
//! use depcache::graph::{DependencyGraph, WorkloadGraph};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("app", 10.0).unwrap();
//! graph.add_node("util", 50.0).unwrap();
//! graph.add_edge("app", "util").unwrap();
//!
//! assert_eq!(graph.in_degree(&"util"), Some(1));
//! assert_eq!(graph.size(&"app"), Some(10.0));
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::GraphError;

/// Read-only view of a directed workload graph.
///
/// Every node carries a positive `size`; in-degree is derived from the edge
/// set. Iteration order of [`nodes`](Self::nodes) is the graph's canonical
/// order and is the tie-break for static rankings.
pub trait WorkloadGraph {
    /// Node identifier type.
    type Node: Clone + Eq + Hash + Ord + Debug;

    /// Iterates node identifiers in canonical order.
    fn nodes(&self) -> Box<dyn Iterator<Item = &Self::Node> + '_>;

    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Returns `true` if `node` belongs to the graph.
    fn contains_node(&self, node: &Self::Node) -> bool;

    /// The `size` attribute of `node`, or `None` if it is not in the graph.
    fn size(&self, node: &Self::Node) -> Option<f64>;

    /// Number of incoming edges of `node`, or `None` if it is not in the graph.
    fn in_degree(&self, node: &Self::Node) -> Option<usize>;

    /// `size × in_degree`; the weighted importance of a node.
    fn weighted_in_degree(&self, node: &Self::Node) -> Option<f64> {
        Some(self.size(node)? * self.in_degree(node)? as f64)
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeAttrs {
    size: f64,
    in_degree: usize,
}

/// Directed simple graph with a mandatory `size` attribute per node.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    order: Vec<N>,
    index: FxHashMap<N, usize>,
    attrs: Vec<NodeAttrs>,
    edges: FxHashSet<(usize, usize)>,
}

impl<N> DependencyGraph<N>
where
    N: Clone + Eq + Hash + Ord + Debug,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            index: FxHashMap::default(),
            attrs: Vec::new(),
            edges: FxHashSet::default(),
        }
    }

    /// Builds a graph from `(node, size)` pairs and `(from, to)` edges.
    ///
    /// ```
    /// use depcache::graph::{DependencyGraph, WorkloadGraph};
    ///
    /// let graph = DependencyGraph::from_parts(
    ///     [(1u32, 4.0), (2, 8.0), (3, 2.0)],
    ///     [(1, 2), (3, 2)],
    /// )
    /// .unwrap();
    /// assert_eq!(graph.in_degree(&2), Some(2));
    /// assert_eq!(graph.edge_count(), 2);
    /// ```
    pub fn from_parts(
        nodes: impl IntoIterator<Item = (N, f64)>,
        edges: impl IntoIterator<Item = (N, N)>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for (node, size) in nodes {
            graph.add_node(node, size)?;
        }
        for (from, to) in edges {
            graph.add_edge(from, to)?;
        }
        Ok(graph)
    }

    /// Adds `node` with the given size; re-adding an existing node updates its size.
    pub fn add_node(&mut self, node: N, size: f64) -> Result<(), GraphError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(GraphError::InvalidSize {
                node: format!("{node:?}"),
                size,
            });
        }
        if let Some(&idx) = self.index.get(&node) {
            self.attrs[idx].size = size;
            return Ok(());
        }
        self.index.insert(node.clone(), self.order.len());
        self.order.push(node);
        self.attrs.push(NodeAttrs { size, in_degree: 0 });
        Ok(())
    }

    /// Adds the edge `from → to`. Duplicate edges are ignored.
    ///
    /// Returns `true` if the edge was new.
    pub fn add_edge(&mut self, from: N, to: N) -> Result<bool, GraphError> {
        let src = self.position(&from)?;
        let dst = self.position(&to)?;
        if !self.edges.insert((src, dst)) {
            return Ok(false);
        }
        self.attrs[dst].in_degree += 1;
        Ok(true)
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn position(&self, node: &N) -> Result<usize, GraphError> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(format!("{node:?}")))
    }

    fn attrs(&self, node: &N) -> Option<&NodeAttrs> {
        self.index.get(node).map(|&idx| &self.attrs[idx])
    }
}

impl<N> Default for DependencyGraph<N>
where
    N: Clone + Eq + Hash + Ord + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N> WorkloadGraph for DependencyGraph<N>
where
    N: Clone + Eq + Hash + Ord + Debug,
{
    type Node = N;

    fn nodes(&self) -> Box<dyn Iterator<Item = &N> + '_> {
        Box::new(self.order.iter())
    }

    fn node_count(&self) -> usize {
        self.order.len()
    }

    fn contains_node(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    fn size(&self, node: &N) -> Option<f64> {
        self.attrs(node).map(|a| a.size)
    }

    fn in_degree(&self, node: &N) -> Option<usize> {
        self.attrs(node).map(|a| a.in_degree)
    }
}

/// Nodes of `graph` sorted by identifier.
///
/// Sampling draws from this order so a seeded random source selects the
/// same members regardless of how the graph was populated.
pub(crate) fn sorted_nodes<G: WorkloadGraph>(graph: &G) -> Vec<G::Node> {
    let mut nodes: Vec<G::Node> = graph.nodes().cloned().collect();
    nodes.sort();
    nodes
}
