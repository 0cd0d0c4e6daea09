//! Weighted-frequency policy.
//!
//! LFU variant whose score grows by `size × in_degree` per hit instead of by
//! one. Large artifacts with many dependents accumulate importance fastest
//! and are the last to be evicted.
//!
//! ```text
//!   hit(n)  : score[n] += size(n) × in_degree(n)
//!   miss(n) : if full → evict argmin score (oldest assignment on ties)
//!             score[n]  = size(n) × in_degree(n)
//! ```
//!
//! Randomly sampled initial members start at `0.0`. A node with no
//! dependents never rises above `0.0`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::PolicyError;
use crate::graph::WorkloadGraph;
use crate::metrics::SizeCounters;
use crate::policy::lfu::ScoredMembers;
use crate::policy::sample_population;
use crate::traits::{Access, CachePolicy};

/// Totally ordered `f64` score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Weight(f64);

impl Eq for Weight {}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Policy retaining nodes by accumulated `size × in_degree`.
pub struct WeightedFrequencyPolicy<G: WorkloadGraph, R = SmallRng> {
    capacity: usize,
    graph: Option<Arc<G>>,
    members: ScoredMembers<G::Node, Weight>,
    counters: SizeCounters,
    rng: R,
}

impl<G: WorkloadGraph> WeightedFrequencyPolicy<G, SmallRng> {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, SmallRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, SmallRng::seed_from_u64(seed))
    }
}

impl<G: WorkloadGraph, R: Rng> WeightedFrequencyPolicy<G, R> {
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            graph: None,
            members: ScoredMembers::new(),
            counters: SizeCounters::new(),
            rng,
        }
    }

    /// Accumulated score of `node`, if it is a member.
    pub fn score(&self, node: &G::Node) -> Option<f64> {
        self.members.score(node).map(|w| w.0)
    }
}

impl<G: WorkloadGraph, R: Rng> CachePolicy<G> for WeightedFrequencyPolicy<G, R> {
    fn name(&self) -> &'static str {
        "weighted-frequency"
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
            self.members.set(node, Weight(0.0));
        }
        debug!(
            policy = "weighted-frequency",
            capacity = self.capacity,
            population = self.members.len(),
            "initialized"
        );
        self.graph = Some(graph);
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        let graph = self.graph.as_ref().ok_or(PolicyError::Unbound)?;
        let (size, weight) = match (graph.size(node), graph.weighted_in_degree(node)) {
            (Some(size), Some(weight)) => (size, weight),
            _ => return Err(PolicyError::node_not_found(node)),
        };

        if let Some(&Weight(score)) = self.members.score(node) {
            self.counters.record_hit(size);
            self.members.set(node.clone(), Weight(score + weight));
            trace!(node = ?node, size, score = score + weight, "weighted hit");
            return Ok(Access::Hit);
        }

        self.counters.record_miss(size);
        trace!(node = ?node, size, "weighted miss");
        if self.capacity == 0 {
            return Ok(Access::Miss);
        }
        if self.members.len() >= self.capacity {
            if let Some((victim, Weight(score))) = self.members.evict_min() {
                trace!(node = ?victim, score, "weighted evict");
            }
        }
        self.members.set(node.clone(), Weight(weight));
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

impl<G: WorkloadGraph, R> fmt::Debug for WeightedFrequencyPolicy<G, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedFrequencyPolicy")
            .field("capacity", &self.capacity)
            .field("len", &self.members.len())
            .field("bound", &self.graph.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}
