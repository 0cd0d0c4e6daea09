//! Static Top-K policies.
//!
//! Membership is computed once in `initialize` by ranking every graph node
//! descending by a key and keeping the first `capacity`. Queries never insert
//! or evict: a non-member access is a *terminal miss*. These model an offline
//! caching oracle baseline.
//!
//! | Alias                    | Ranking key          |
//! |--------------------------|----------------------|
//! | [`TopKInDegree`]         | `in_degree`          |
//! | [`TopKWeightedInDegree`] | `in_degree × size`   |
//! | [`TopKSize`]             | `size`               |
//!
//! Equal keys keep the graph's canonical node order (stable sort).
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use depcache::graph::DependencyGraph;
//! use depcache::policy::static_topk::TopKSize;
//! use depcache::traits::CachePolicy;
//!
//! let graph = Arc::new(
//!     DependencyGraph::from_parts([("A", 10.0), ("B", 50.0), ("C", 5.0)], []).unwrap(),
//! );
//! let mut top = TopKSize::new(2);
//! top.initialize(graph);
//! assert_eq!(top.members(), &["B", "A"]);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::error::PolicyError;
use crate::graph::WorkloadGraph;
use crate::metrics::SizeCounters;
use crate::traits::{bound_size, Access, CachePolicy};

/// Ranking key for a static Top-K policy.
pub trait RankKey {
    /// Policy name reported by [`CachePolicy::name`].
    const NAME: &'static str;

    /// Rank of `node`; higher is kept first.
    fn rank<G: WorkloadGraph>(graph: &G, node: &G::Node) -> f64;
}

/// Rank by number of dependents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByInDegree;

impl RankKey for ByInDegree {
    const NAME: &'static str = "top-k-in-degree";

    fn rank<G: WorkloadGraph>(graph: &G, node: &G::Node) -> f64 {
        graph.in_degree(node).unwrap_or(0) as f64
    }
}

/// Rank by `in_degree × size`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByWeightedInDegree;

impl RankKey for ByWeightedInDegree {
    const NAME: &'static str = "top-k-weighted-in-degree";

    fn rank<G: WorkloadGraph>(graph: &G, node: &G::Node) -> f64 {
        graph.weighted_in_degree(node).unwrap_or(0.0)
    }
}

/// Rank by artifact size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BySize;

impl RankKey for BySize {
    const NAME: &'static str = "top-k-size";

    fn rank<G: WorkloadGraph>(graph: &G, node: &G::Node) -> f64 {
        graph.size(node).unwrap_or(0.0)
    }
}

pub type TopKInDegree<G> = StaticTopKPolicy<G, ByInDegree>;
pub type TopKWeightedInDegree<G> = StaticTopKPolicy<G, ByWeightedInDegree>;
pub type TopKSize<G> = StaticTopKPolicy<G, BySize>;

/// Fixed membership chosen by ranking the whole graph once.
pub struct StaticTopKPolicy<G: WorkloadGraph, K> {
    capacity: usize,
    graph: Option<Arc<G>>,
    ranked: Vec<G::Node>,
    members: FxHashSet<G::Node>,
    counters: SizeCounters,
    _key: PhantomData<K>,
}

impl<G: WorkloadGraph, K: RankKey> StaticTopKPolicy<G, K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            graph: None,
            ranked: Vec::new(),
            members: FxHashSet::default(),
            counters: SizeCounters::new(),
            _key: PhantomData,
        }
    }

    /// Members in rank order, highest first.
    pub fn members(&self) -> &[G::Node] {
        &self.ranked
    }
}

impl<G: WorkloadGraph, K: RankKey> CachePolicy<G> for StaticTopKPolicy<G, K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn initialize(&mut self, graph: Arc<G>) {
        self.clear();
        let mut scored: Vec<(f64, &G::Node)> = graph
            .nodes()
            .map(|node| (K::rank(graph.as_ref(), node), node))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        self.ranked = scored
            .into_iter()
            .take(self.capacity)
            .map(|(_, node)| node.clone())
            .collect();
        self.members = self.ranked.iter().cloned().collect();
        debug!(
            policy = K::NAME,
            capacity = self.capacity,
            population = self.members.len(),
            "initialized"
        );
        self.graph = Some(graph);
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        let size = bound_size(self.graph.as_ref(), node)?;
        if self.members.contains(node) {
            self.counters.record_hit(size);
            trace!(policy = K::NAME, node = ?node, size, "static hit");
            Ok(Access::Hit)
        } else {
            self.counters.record_miss(size);
            trace!(policy = K::NAME, node = ?node, size, "static terminal miss");
            Ok(Access::Miss)
        }
    }

    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError> {
        if self.graph.is_none() {
            return Err(PolicyError::Unbound);
        }
        Ok(self.members.contains(node))
    }

    fn clear(&mut self) {
        self.ranked.clear();
        self.members.clear();
    }

    fn reset(&mut self) {
        self.clear();
        self.counters.reset();
    }

    fn hits(&self) -> f64 {
        self.counters.hits()
    }

    fn misses(&self) -> f64 {
        self.counters.misses()
    }
}

impl<G: WorkloadGraph, K: RankKey> fmt::Debug for StaticTopKPolicy<G, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTopKPolicy")
            .field("key", &K::NAME)
            .field("capacity", &self.capacity)
            .field("members", &self.ranked)
            .field("counters", &self.counters)
            .finish()
    }
}
