//! Workload driver.
//!
//! Produces deterministic node streams over a graph and replays them through
//! one or more policies, collecting a [`SimulationReport`] per policy.
//!
//! ```text
//!   WorkloadGenerator ──► [n0, n1, n2, …] ──► run(policy) ──► SimulationReport
//!                                        └──► compare(kinds) ──► Vec<SimulationReport>
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use depcache::builder::{PolicyBuilder, PolicyKind};
//! use depcache::graph::DependencyGraph;
//! use depcache::sim::{compare, Workload, WorkloadGenerator};
//!
//! let graph = Arc::new(
//!     DependencyGraph::from_parts((0..20u32).map(|i| (i, 1.0)), (1..20u32).map(|i| (i, 0)))
//!         .unwrap(),
//! );
//! let stream: Vec<u32> = WorkloadGenerator::new(graph.as_ref(), Workload::InDegreeWeighted, 1)
//!     .unwrap()
//!     .take(500)
//!     .collect();
//!
//! let reports = compare(&PolicyKind::all(), &PolicyBuilder::new(4).seed(1), graph, &stream);
//! assert_eq!(reports.len(), 7);
//! assert!(reports.iter().all(|r| r.error.is_none()));
//! ```

use std::sync::Arc;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::builder::{PolicyBuilder, PolicyKind};
use crate::error::ConfigError;
use crate::graph::{sorted_nodes, WorkloadGraph};
use crate::traits::CachePolicy;

/// Access distribution over the nodes of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Workload {
    /// Every node equally likely.
    Uniform,
    /// Probability proportional to `in_degree + 1`; shared dependencies are hot.
    InDegreeWeighted,
    /// Probability proportional to `size`.
    SizeWeighted,
    /// Cycles through every node in identifier order.
    Scan,
}

/// Infinite, seeded stream of nodes drawn from a graph.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator<N> {
    nodes: Vec<N>,
    workload: Workload,
    weights: Option<WeightedIndex<f64>>,
    rng: SmallRng,
    scan_pos: usize,
}

impl<N: Clone> WorkloadGenerator<N> {
    /// Fails if the graph has no nodes.
    pub fn new<G>(graph: &G, workload: Workload, seed: u64) -> Result<Self, ConfigError>
    where
        G: WorkloadGraph<Node = N>,
    {
        let nodes = sorted_nodes(graph);
        if nodes.is_empty() {
            return Err(ConfigError::new("workload graph has no nodes"));
        }
        let weights = match workload {
            Workload::Uniform | Workload::Scan => None,
            Workload::InDegreeWeighted => Some(
                nodes
                    .iter()
                    .map(|n| graph.in_degree(n).unwrap_or(0) as f64 + 1.0)
                    .collect::<Vec<_>>(),
            ),
            Workload::SizeWeighted => Some(
                nodes
                    .iter()
                    .map(|n| graph.size(n).unwrap_or(0.0))
                    .collect::<Vec<_>>(),
            ),
        };
        let weights = weights
            .map(|w| WeightedIndex::new(&w))
            .transpose()
            .map_err(|e| ConfigError::new(format!("invalid workload weights: {e}")))?;
        Ok(Self {
            nodes,
            workload,
            weights,
            rng: SmallRng::seed_from_u64(seed),
            scan_pos: 0,
        })
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }

    pub fn next_node(&mut self) -> N {
        let idx = match (&self.workload, &self.weights) {
            (Workload::Scan, _) => {
                let idx = self.scan_pos;
                self.scan_pos = (self.scan_pos + 1) % self.nodes.len();
                idx
            },
            (_, Some(dist)) => dist.sample(&mut self.rng),
            (_, None) => self.rng.random_range(0..self.nodes.len()),
        };
        self.nodes[idx].clone()
    }
}

impl<N: Clone> Iterator for WorkloadGenerator<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        Some(self.next_node())
    }
}

/// Outcome of replaying one stream through one policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationReport {
    pub policy: String,
    pub capacity: usize,
    /// Queries answered before the run ended.
    pub queries: usize,
    pub hits: f64,
    pub misses: f64,
    pub hit_rate: f64,
    /// First query error, after which the run stopped.
    pub error: Option<String>,
}

/// Binds `policy` to `graph` and replays `queries`.
///
/// Stops at the first failing query and records its error in the report.
pub fn run<G, P>(
    policy: &mut P,
    graph: Arc<G>,
    queries: impl IntoIterator<Item = G::Node>,
) -> SimulationReport
where
    G: WorkloadGraph,
    P: CachePolicy<G> + ?Sized,
{
    policy.initialize(graph);
    let mut answered = 0;
    let mut error = None;
    for node in queries {
        match policy.query(&node) {
            Ok(_) => answered += 1,
            Err(err) => {
                warn!(policy = policy.name(), node = ?node, error = %err, "query failed");
                error = Some(err.to_string());
                break;
            },
        }
    }
    let report = SimulationReport {
        policy: policy.name().to_string(),
        capacity: policy.capacity(),
        queries: answered,
        hits: policy.hits(),
        misses: policy.misses(),
        hit_rate: policy.hit_rate(),
        error,
    };
    debug!(
        policy = %report.policy,
        queries = report.queries,
        hit_rate = report.hit_rate,
        "simulation finished"
    );
    report
}

/// Runs every kind in `kinds` over the same `queries`.
pub fn compare<G>(
    kinds: &[PolicyKind],
    builder: &PolicyBuilder,
    graph: Arc<G>,
    queries: &[G::Node],
) -> Vec<SimulationReport>
where
    G: WorkloadGraph + 'static,
{
    kinds
        .iter()
        .map(|&kind| {
            let mut policy = builder.build::<G>(kind);
            run(policy.as_mut(), Arc::clone(&graph), queries.iter().cloned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::policy::lru::LruPolicy;
    use rustc_hash::FxHashMap;

    type Graph = DependencyGraph<u32>;

    fn chain(n: u32) -> Arc<Graph> {
        let nodes = (0..n).map(|i| (i, f64::from(i + 1)));
        let edges = (1..n).map(|i| (i, i - 1));
        Arc::new(DependencyGraph::from_parts(nodes, edges).unwrap())
    }

    #[test]
    fn scan_cycles_in_identifier_order() {
        let graph = DependencyGraph::from_parts([(2u32, 1.0), (0, 1.0), (1, 1.0)], []).unwrap();
        let stream: Vec<u32> = WorkloadGenerator::new(&graph, Workload::Scan, 0)
            .unwrap()
            .take(7)
            .collect();
        assert_eq!(stream, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn same_seed_same_stream() {
        let graph = chain(50);
        for workload in [
            Workload::Uniform,
            Workload::InDegreeWeighted,
            Workload::SizeWeighted,
        ] {
            let a: Vec<u32> = WorkloadGenerator::new(graph.as_ref(), workload, 11)
                .unwrap()
                .take(100)
                .collect();
            let b: Vec<u32> = WorkloadGenerator::new(graph.as_ref(), workload, 11)
                .unwrap()
                .take(100)
                .collect();
            assert_eq!(a, b);
            assert!(a.iter().all(|n| graph.contains_node(n)));
        }
    }

    #[test]
    fn size_weighted_prefers_large_nodes() {
        let graph = DependencyGraph::from_parts([(0u32, 1.0), (1, 99.0)], []).unwrap();
        let mut counts: FxHashMap<u32, usize> = FxHashMap::default();
        for node in WorkloadGenerator::new(&graph, Workload::SizeWeighted, 3)
            .unwrap()
            .take(2_000)
        {
            *counts.entry(node).or_default() += 1;
        }
        assert!(counts[&1] > counts.get(&0).copied().unwrap_or(0) * 10);
    }

    #[test]
    fn empty_graph_is_rejected() {
        let graph: Graph = DependencyGraph::new();
        assert!(WorkloadGenerator::new(&graph, Workload::Uniform, 0).is_err());
    }

    #[test]
    fn run_reports_policy_counters() {
        let graph = chain(4);
        let mut lru = LruPolicy::with_seed(4, 0);
        let report = run(&mut lru, Arc::clone(&graph), [0, 1, 2, 3, 0]);
        assert_eq!(report.policy, "lru");
        assert_eq!(report.queries, 5);
        assert_eq!(report.error, None);
        // Capacity equals node count: every node was sampled in.
        assert_eq!(report.hits, 1.0 + 2.0 + 3.0 + 4.0 + 1.0);
        assert_eq!(report.misses, 0.0);
        assert_eq!(report.hit_rate, 1.0);
    }

    #[test]
    fn run_stops_on_first_error() {
        let graph = chain(4);
        let mut lru = LruPolicy::with_seed(2, 0);
        let report = run(&mut lru, graph, [0, 1, 99, 2]);
        assert_eq!(report.queries, 2);
        assert!(report.error.is_some());
    }

    #[test]
    fn compare_runs_each_kind_over_the_same_stream() {
        let graph = chain(30);
        let stream: Vec<u32> = WorkloadGenerator::new(graph.as_ref(), Workload::Uniform, 5)
            .unwrap()
            .take(300)
            .collect();
        let kinds = [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::TopKSize];
        let reports = compare(&kinds, &PolicyBuilder::new(5).seed(2), graph, &stream);
        let names: Vec<_> = reports.iter().map(|r| r.policy.as_str()).collect();
        assert_eq!(names, vec!["lru", "lfu", "top-k-size"]);
        for report in &reports {
            assert_eq!(report.queries, 300);
            let total: f64 = stream.iter().map(|&n| f64::from(n + 1)).sum();
            assert!((report.hits + report.misses - total).abs() < 1e-9);
        }
    }
}
