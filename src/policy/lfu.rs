//! Least Frequently Used (LFU) policy.
//!
//! Each member carries a hit counter. Hits add exactly `1` regardless of node
//! size; a miss evicts the global minimum and inserts the new node at `1`.
//! Nodes placed by the random initial population start at `0`, so they are
//! the first to go until they earn a hit.
//!
//! ## Architecture
//!
//! ```text
//!   ScoredMembers<N, S>
//!   ┌─────────────────────────────────────────────┐
//!   │ heap: LazyMinHeap<N, S>                     │
//!   │   scores: N → (S, seq)   ← membership       │
//!   │   heap:   (S, seq, N)    ← eviction order   │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! ## Eviction Tie-Break
//!
//! Among members with the minimum score, the one whose score was assigned
//! longest ago is evicted (lowest assignment sequence number). A hit counts
//! as an assignment, so a recently hit member loses ties only to members
//! that were not touched since.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use depcache::graph::DependencyGraph;
//! use depcache::policy::lfu::LfuPolicy;
//! use depcache::traits::CachePolicy;
//!
//! let graph = Arc::new(
//!     DependencyGraph::from_parts([("a", 1.0), ("b", 1.0), ("c", 1.0)], []).unwrap(),
//! );
//! let mut lfu = LfuPolicy::with_seed(2, 0);
//! lfu.initialize(graph);
//! lfu.clear();
//!
//! lfu.query(&"a").unwrap();
//! lfu.query(&"a").unwrap(); // a: 2
//! lfu.query(&"b").unwrap(); // b: 1
//! lfu.query(&"c").unwrap(); // evicts b
//! assert!(lfu.contains(&"a").unwrap());
//! assert!(!lfu.contains(&"b").unwrap());
//! assert_eq!(lfu.frequency(&"a"), Some(2));
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::ds::lazy_heap::LazyMinHeap;
use crate::error::PolicyError;
use crate::graph::WorkloadGraph;
use crate::metrics::SizeCounters;
use crate::policy::sample_population;
use crate::traits::{bound_size, Access, CachePolicy};

/// Heap rows allowed per live member before the eviction heap is rebuilt.
const REBUILD_FACTOR: usize = 4;

/// Membership with a per-member score and min-score eviction.
#[derive(Debug)]
pub(crate) struct ScoredMembers<N, S> {
    heap: LazyMinHeap<N, S>,
}

impl<N, S> ScoredMembers<N, S>
where
    N: Eq + Hash + Clone,
    S: Ord + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            heap: LazyMinHeap::new(),
        }
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.heap.reserve(additional);
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn contains(&self, node: &N) -> bool {
        self.heap.contains(node)
    }

    pub(crate) fn score(&self, node: &N) -> Option<&S> {
        self.heap.score_of(node)
    }

    pub(crate) fn set(&mut self, node: N, score: S) {
        self.heap.update(node, score);
        self.heap.maybe_rebuild(REBUILD_FACTOR);
    }

    pub(crate) fn evict_min(&mut self) -> Option<(N, S)> {
        self.heap.pop_best()
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    #[cfg(test)]
    pub(crate) fn debug_validate_invariants(&self) {
        self.heap.debug_validate_invariants();
    }
}

/// Frequency-counting policy that inserts every missed node.
pub struct LfuPolicy<G: WorkloadGraph, R = SmallRng> {
    capacity: usize,
    graph: Option<Arc<G>>,
    members: ScoredMembers<G::Node, u64>,
    counters: SizeCounters,
    rng: R,
}

impl<G: WorkloadGraph> LfuPolicy<G, SmallRng> {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, SmallRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, SmallRng::seed_from_u64(seed))
    }
}

impl<G: WorkloadGraph, R: Rng> LfuPolicy<G, R> {
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            graph: None,
            members: ScoredMembers::new(),
            counters: SizeCounters::new(),
            rng,
        }
    }

    /// Current hit count of `node`, if it is a member.
    pub fn frequency(&self, node: &G::Node) -> Option<u64> {
        self.members.score(node).copied()
    }
}

impl<G: WorkloadGraph, R: Rng> CachePolicy<G> for LfuPolicy<G, R> {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn initialize(&mut self, graph: Arc<G>) {
        self.clear();
        self.members.reserve(self.capacity.min(graph.node_count()));
        for node in sample_population(graph.as_ref(), self.capacity, &mut self.rng) {
            self.members.set(node, 0);
        }
        debug!(
            policy = "lfu",
            capacity = self.capacity,
            population = self.members.len(),
            "initialized"
        );
        self.graph = Some(graph);
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        let size = bound_size(self.graph.as_ref(), node)?;

        if let Some(&freq) = self.members.score(node) {
            self.counters.record_hit(size);
            self.members.set(node.clone(), freq + 1);
            trace!(node = ?node, size, freq = freq + 1, "lfu hit");
            return Ok(Access::Hit);
        }

        self.counters.record_miss(size);
        trace!(node = ?node, size, "lfu miss");
        if self.capacity == 0 {
            return Ok(Access::Miss);
        }
        if self.members.len() >= self.capacity {
            if let Some((victim, freq)) = self.members.evict_min() {
                trace!(node = ?victim, freq, "lfu evict");
            }
        }
        self.members.set(node.clone(), 1);
        Ok(Access::Miss)
    }

    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError> {
        if self.graph.is_none() {
            return Err(PolicyError::Unbound);
        }
        Ok(self.members.contains(node))
    }

    fn clear(&mut self) {
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

impl<G: WorkloadGraph, R> fmt::Debug for LfuPolicy<G, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuPolicy")
            .field("capacity", &self.capacity)
            .field("len", &self.members.len())
            .field("bound", &self.graph.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}
