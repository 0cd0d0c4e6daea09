//! Least Recently Used (LRU) policy.
//!
//! Membership is an [`IntrusiveList`] ordered by recency plus an
//! `FxHashMap<N, SlotId>` index, so hit promotion and LRU eviction are O(1).
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<N, SlotId>          order: IntrusiveList<N>
//!   ┌──────┬────────┐
//!   │  B   │ id_2   │───┐        head (MRU)                    tail (LRU)
//!   │  A   │ id_1   │───┼──►        [C] ◄──► [B] ◄──► [A]
//!   │  C   │ id_3   │───┘
//!   └──────┴────────┘
//! ```
//!
//! ## Query Flow
//!
//! ```text
//!   query(n):
//!     hit  → hits += size(n); move n to MRU
//!     miss → misses += size(n)
//!            if len == capacity: pop LRU
//!            insert n as MRU          (prefetch on miss: an immediate repeat hits)
//! ```
//!
//! `initialize` samples `min(capacity, |V|)` distinct nodes uniformly without
//! replacement from the injected random source.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use depcache::graph::DependencyGraph;
//! use depcache::policy::lru::LruPolicy;
//! use depcache::traits::{Access, CachePolicy};
//!
//! let graph = Arc::new(DependencyGraph::from_parts([("x", 10.0), ("y", 20.0)], []).unwrap());
//!
//! let mut lru = LruPolicy::with_seed(1, 7);
//! lru.initialize(graph);
//! lru.clear();
//!
//! assert_eq!(lru.query(&"x").unwrap(), Access::Miss);
//! assert_eq!(lru.query(&"x").unwrap(), Access::Hit);
//! assert_eq!(lru.query(&"y").unwrap(), Access::Miss); // evicts "x"
//! assert!(!lru.contains(&"x").unwrap());
//! assert_eq!(lru.hits(), 10.0);
//! ```

use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::PolicyError;
use crate::graph::WorkloadGraph;
use crate::metrics::SizeCounters;
use crate::policy::sample_population;
use crate::traits::{bound_size, Access, CachePolicy};

/// Recency-ordered policy that inserts every missed node.
pub struct LruPolicy<G: WorkloadGraph, R = SmallRng> {
    capacity: usize,
    graph: Option<Arc<G>>,
    index: FxHashMap<G::Node, SlotId>,
    order: IntrusiveList<G::Node>,
    counters: SizeCounters,
    rng: R,
}

impl<G: WorkloadGraph> LruPolicy<G, SmallRng> {
    /// Creates an LRU policy seeded from the operating system.
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, SmallRng::from_os_rng())
    }

    /// Creates an LRU policy with a deterministic sampling seed.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, SmallRng::seed_from_u64(seed))
    }
}

impl<G: WorkloadGraph, R: Rng> LruPolicy<G, R> {
    /// Creates an LRU policy drawing its initial population from `rng`.
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            graph: None,
            index: FxHashMap::default(),
            order: IntrusiveList::new(),
            counters: SizeCounters::new(),
            rng,
        }
    }

    /// Members from most to least recently used.
    pub fn recency_order(&self) -> Vec<G::Node> {
        self.order.iter().cloned().collect()
    }

    /// The member that the next eviction would remove.
    pub fn peek_lru(&self) -> Option<&G::Node> {
        self.order.back()
    }

    fn insert_mru(&mut self, node: G::Node) {
        let id = self.order.push_front(node.clone());
        self.index.insert(node, id);
    }

    fn evict_lru(&mut self) {
        if let Some(victim) = self.order.pop_back() {
            trace!(node = ?victim, "lru evict");
            self.index.remove(&victim);
        }
    }
}

impl<G: WorkloadGraph, R: Rng> CachePolicy<G> for LruPolicy<G, R> {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn initialize(&mut self, graph: Arc<G>) {
        self.clear();
        let population = self.capacity.min(graph.node_count());
        self.index.reserve(population);
        self.order.reserve(population);
        for node in sample_population(graph.as_ref(), self.capacity, &mut self.rng) {
            self.insert_mru(node);
        }
        debug!(
            policy = "lru",
            capacity = self.capacity,
            population = self.index.len(),
            "initialized"
        );
        self.graph = Some(graph);
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        let size = bound_size(self.graph.as_ref(), node)?;

        if let Some(&id) = self.index.get(node) {
            self.counters.record_hit(size);
            self.order.move_to_front(id);
            trace!(node = ?node, size, "lru hit");
            return Ok(Access::Hit);
        }

        self.counters.record_miss(size);
        trace!(node = ?node, size, "lru miss");
        if self.capacity == 0 {
            return Ok(Access::Miss);
        }
        if self.index.len() >= self.capacity {
            self.evict_lru();
        }
        self.insert_mru(node.clone());
        Ok(Access::Miss)
    }

    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError> {
        if self.graph.is_none() {
            return Err(PolicyError::Unbound);
        }
        Ok(self.index.contains_key(node))
    }

    fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
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

impl<G: WorkloadGraph, R> fmt::Debug for LruPolicy<G, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruPolicy")
            .field("capacity", &self.capacity)
            .field("len", &self.index.len())
            .field("bound", &self.graph.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}
