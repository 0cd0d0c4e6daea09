//! Composite policy: one static pool plus adaptively chosen dynamic pools.
//!
//! ## Architecture
//!
//! ```text
//!   CompositePolicy (capacity C)
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │ statics  : [ TopKWeightedInDegree(min(1, C)) ]                   │
//!   │ dynamics : [ WeightedFrequency(⌊R/4⌋), Lru(R − ⌊R/4⌋) ]          │
//!   │            where R = C − static capacity                         │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Query Flow
//!
//! ```text
//!   query(n):
//!     1. first static member holding n   → delegate, return
//!     2. first dynamic member holding n  → delegate, return
//!     3. true miss: pick ONE sub-policy from statics ++ dynamics with
//!        weight = hit_rate() + ε, delegate query(n) to it
//! ```
//!
//! The composite keeps no counters of its own: `hits`, `misses` and
//! `hit_rate` aggregate the sub-policies.
//!
//! Step 3 draws from the static pool too. A static policy turns the query
//! into a terminal miss and never admits `n`, so its share of the weight is
//! spent on a choice that cannot produce a future hit for `n`.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use depcache::graph::DependencyGraph;
//! use depcache::policy::composite::CompositePolicy;
//! use depcache::traits::CachePolicy;
//!
//! let graph = Arc::new(
//!     DependencyGraph::from_parts(
//!         (0..10u32).map(|i| (i, 1.0 + f64::from(i))),
//!         (1..10u32).map(|i| (i, 0)),
//!     )
//!     .unwrap(),
//! );
//! let mut composite = CompositePolicy::with_seed(5, 3);
//! composite.initialize(graph);
//!
//! // Node 0 has every dependent, so the static pool holds it.
//! assert!(composite.query(&0).unwrap().is_hit());
//! assert_eq!(composite.capacity(), 5);
//! ```

use std::fmt;
use std::sync::Arc;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{ConfigError, PolicyError};
use crate::graph::WorkloadGraph;
use crate::metrics::PolicyStats;
use crate::policy::lru::LruPolicy;
use crate::policy::static_topk::TopKWeightedInDegree;
use crate::policy::weighted::WeightedFrequencyPolicy;
use crate::traits::{Access, CachePolicy};

/// Default additive weight keeping zero-hit-rate sub-policies selectable.
pub const DEFAULT_EXPLORATION: f64 = 1e-5;

/// Capacity split and selection parameters for [`CompositePolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompositeConfig {
    /// Capacity of the static Top-K weighted in-degree pool, clamped to the
    /// total capacity.
    pub static_capacity: usize,
    /// The weighted-frequency pool receives `⌊remainder / weighted_divisor⌋`;
    /// LRU receives the rest.
    pub weighted_divisor: usize,
    /// ε added to every hit rate when choosing a sub-policy on a true miss.
    pub exploration: f64,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            static_capacity: 1,
            weighted_divisor: 4,
            exploration: DEFAULT_EXPLORATION,
        }
    }
}

impl CompositeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weighted_divisor == 0 {
            return Err(ConfigError::new("weighted_divisor must be > 0"));
        }
        validate_exploration(self.exploration)
    }

    /// `(static, weighted-frequency, lru)` capacities for a total of `capacity`.
    pub fn partition(&self, capacity: usize) -> (usize, usize, usize) {
        let static_capacity = self.static_capacity.min(capacity);
        let remainder = capacity - static_capacity;
        let weighted = remainder / self.weighted_divisor.max(1);
        (static_capacity, weighted, remainder - weighted)
    }
}

fn validate_exploration(exploration: f64) -> Result<(), ConfigError> {
    if !exploration.is_finite() || exploration <= 0.0 {
        return Err(ConfigError::new(format!(
            "exploration must be finite and > 0, got {exploration}"
        )));
    }
    Ok(())
}

type SubPolicy<G> = Box<dyn CachePolicy<G>>;

/// Policy that routes queries across static and dynamic sub-policies.
pub struct CompositePolicy<G: WorkloadGraph, R = SmallRng> {
    capacity: usize,
    graph: Option<Arc<G>>,
    statics: Vec<SubPolicy<G>>,
    dynamics: Vec<SubPolicy<G>>,
    exploration: f64,
    rng: R,
}

impl<G: WorkloadGraph + 'static> CompositePolicy<G, SmallRng> {
    /// Default partition, seeded from the operating system.
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, SmallRng::from_os_rng())
    }

    /// Default partition with a deterministic seed for selection and for
    /// every sub-policy's initial sampling.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, SmallRng::seed_from_u64(seed))
    }
}

impl<G: WorkloadGraph + 'static, R: Rng> CompositePolicy<G, R> {
    /// Default partition drawing selection randomness from `rng`.
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self::with_config(capacity, CompositeConfig::default(), rng)
    }

    /// Partition `capacity` according to `config`.
    pub fn try_with_config(
        capacity: usize,
        config: CompositeConfig,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(capacity, config, rng))
    }

    /// Partition without validation; `config` must already have passed
    /// [`CompositeConfig::validate`].
    pub(crate) fn with_config(capacity: usize, config: CompositeConfig, rng: R) -> Self {
        let (statics, dynamics, rng) = Self::default_lineup(capacity, &config, rng);
        Self {
            capacity,
            graph: None,
            statics,
            dynamics,
            exploration: config.exploration,
            rng,
        }
    }

    /// Builds a composite over a caller-chosen lineup.
    ///
    /// Both collections are checked in order on every query. Capacity is the
    /// sum of the sub-policy capacities.
    pub fn from_parts(
        statics: Vec<SubPolicy<G>>,
        dynamics: Vec<SubPolicy<G>>,
        exploration: f64,
        rng: R,
    ) -> Result<Self, ConfigError> {
        validate_exploration(exploration)?;
        if statics.is_empty() && dynamics.is_empty() {
            return Err(ConfigError::new("composite needs at least one sub-policy"));
        }
        let capacity = statics.iter().chain(&dynamics).map(|p| p.capacity()).sum();
        Ok(Self {
            capacity,
            graph: None,
            statics,
            dynamics,
            exploration,
            rng,
        })
    }

    fn default_lineup(
        capacity: usize,
        config: &CompositeConfig,
        mut rng: R,
    ) -> (Vec<SubPolicy<G>>, Vec<SubPolicy<G>>, R) {
        let (static_cap, weighted_cap, lru_cap) = config.partition(capacity);
        let statics: Vec<SubPolicy<G>> = vec![Box::new(TopKWeightedInDegree::<G>::new(static_cap))];
        let dynamics: Vec<SubPolicy<G>> = vec![
            Box::new(WeightedFrequencyPolicy::<G>::with_seed(
                weighted_cap,
                rng.random(),
            )),
            Box::new(LruPolicy::<G>::with_seed(lru_cap, rng.random())),
        ];
        (statics, dynamics, rng)
    }
}

impl<G: WorkloadGraph, R: Rng> CompositePolicy<G, R> {
    pub fn statics(&self) -> &[SubPolicy<G>] {
        &self.statics
    }

    pub fn dynamics(&self) -> &[SubPolicy<G>] {
        &self.dynamics
    }

    /// Stats of every sub-policy, statics first.
    pub fn sub_stats(&self) -> Vec<PolicyStats> {
        self.sub_policies().map(|p| p.stats()).collect()
    }

    fn sub_policies(&self) -> impl Iterator<Item = &SubPolicy<G>> {
        self.statics.iter().chain(self.dynamics.iter())
    }

    /// Weighted draw over statics and dynamics by `hit_rate() + ε`.
    fn select(&mut self) -> Result<usize, PolicyError> {
        let weights: Vec<f64> = self
            .sub_policies()
            .map(|p| p.hit_rate() + self.exploration)
            .collect();
        let dist =
            WeightedIndex::new(&weights).map_err(|e| PolicyError::InvalidWeights(e.to_string()))?;
        Ok(dist.sample(&mut self.rng))
    }
}

impl<G: WorkloadGraph, R: Rng> CachePolicy<G> for CompositePolicy<G, R> {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.sub_policies().map(|p| p.len()).sum()
    }

    fn initialize(&mut self, graph: Arc<G>) {
        self.clear();
        for policy in self.statics.iter_mut().chain(self.dynamics.iter_mut()) {
            policy.initialize(Arc::clone(&graph));
        }
        debug!(
            policy = "composite",
            capacity = self.capacity,
            statics = self.statics.len(),
            dynamics = self.dynamics.len(),
            "initialized"
        );
        self.graph = Some(graph);
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        let graph = self.graph.as_ref().ok_or(PolicyError::Unbound)?;
        if !graph.contains_node(node) {
            return Err(PolicyError::node_not_found(node));
        }

        for policy in self.statics.iter_mut() {
            if policy.contains(node)? {
                return policy.query(node);
            }
        }
        for policy in self.dynamics.iter_mut() {
            if policy.contains(node)? {
                return policy.query(node);
            }
        }

        let idx = self.select()?;
        let statics = self.statics.len();
        let chosen = if idx < statics {
            &mut self.statics[idx]
        } else {
            &mut self.dynamics[idx - statics]
        };
        debug!(node = ?node, chosen = chosen.name(), "composite fallback");
        chosen.query(node)
    }

    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError> {
        if self.graph.is_none() {
            return Err(PolicyError::Unbound);
        }
        for policy in self.sub_policies() {
            if policy.contains(node)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn clear(&mut self) {
        for policy in self.statics.iter_mut().chain(self.dynamics.iter_mut()) {
            policy.clear();
        }
    }

    fn reset(&mut self) {
        for policy in self.statics.iter_mut().chain(self.dynamics.iter_mut()) {
            policy.reset();
        }
    }

    fn hits(&self) -> f64 {
        self.sub_policies().map(|p| p.hits()).sum()
    }

    fn misses(&self) -> f64 {
        self.sub_policies().map(|p| p.misses()).sum()
    }
}

impl<G: WorkloadGraph, R> fmt::Debug for CompositePolicy<G, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |pool: &[SubPolicy<G>]| {
            pool.iter()
                .map(|p| (p.name(), p.capacity()))
                .collect::<Vec<_>>()
        };
        f.debug_struct("CompositePolicy")
            .field("capacity", &self.capacity)
            .field("statics", &names(&self.statics))
            .field("dynamics", &names(&self.dynamics))
            .field("exploration", &self.exploration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use rand::RngCore;

    type Graph = DependencyGraph<u32>;

    /// Every uniform draw maps to the same point of the unit interval:
    /// `0` selects the first sub-policy, `u64::MAX` the last.
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(self.0 as u8);
        }
    }

    /// Star graph: nodes 1..n all depend on node 0 (size 5).
    fn star(n: u32) -> Arc<Graph> {
        let nodes = (0..n).map(|i| (i, if i == 0 { 5.0 } else { 1.0 }));
        let edges = (1..n).map(|i| (i, 0));
        Arc::new(DependencyGraph::from_parts(nodes, edges).unwrap())
    }

    mod partition {
        use super::*;

        #[test]
        fn default_partition_matches_layout() {
            let config = CompositeConfig::default();
            assert_eq!(config.partition(5), (1, 1, 3));
            assert_eq!(config.partition(9), (1, 2, 6));
            assert_eq!(config.partition(1), (1, 0, 0));
        }

        #[test]
        fn zero_capacity_degenerates_static_pool() {
            let config = CompositeConfig::default();
            assert_eq!(config.partition(0), (0, 0, 0));

            let mut composite = CompositePolicy::with_seed(0, 1);
            composite.initialize(star(4));
            assert!(composite.is_empty());
            assert_eq!(composite.query(&0).unwrap(), Access::Miss);
            assert_eq!(composite.misses(), 5.0);
        }

        #[test]
        fn sub_policy_capacities_follow_partition() {
            let composite: CompositePolicy<Graph> = CompositePolicy::with_seed(5, 1);
            let caps: Vec<_> = composite
                .statics()
                .iter()
                .chain(composite.dynamics())
                .map(|p| (p.name(), p.capacity()))
                .collect();
            assert_eq!(
                caps,
                vec![
                    ("top-k-weighted-in-degree", 1),
                    ("weighted-frequency", 1),
                    ("lru", 3)
                ]
            );
        }

        #[test]
        fn invalid_config_is_rejected() {
            let bad = CompositeConfig {
                weighted_divisor: 0,
                ..CompositeConfig::default()
            };
            let result = CompositePolicy::<Graph, _>::try_with_config(
                5,
                bad,
                SmallRng::seed_from_u64(0),
            );
            assert!(result.is_err());

            let bad = CompositeConfig {
                exploration: f64::NAN,
                ..CompositeConfig::default()
            };
            assert!(bad.validate().is_err());
        }

        #[test]
        fn from_parts_requires_a_sub_policy() {
            let result = CompositePolicy::<Graph, _>::from_parts(
                Vec::new(),
                Vec::new(),
                DEFAULT_EXPLORATION,
                SmallRng::seed_from_u64(0),
            );
            assert!(result.is_err());
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn static_member_always_hits_through_static_pool() {
            let graph = star(12);
            let mut composite = CompositePolicy::with_seed(5, 9);
            composite.initialize(Arc::clone(&graph));

            for round in 0..20u32 {
                composite.query(&(1 + round % 11)).unwrap();
                assert_eq!(composite.query(&0).unwrap(), Access::Hit);
            }
            let stats = composite.sub_stats();
            assert_eq!(stats[0].name, "top-k-weighted-in-degree");
            // Fallback draws may still charge terminal misses to the static pool.
            assert_eq!(stats[0].hits, 20.0 * 5.0);
        }

        #[test]
        fn dynamic_member_hit_goes_to_its_owner() {
            let graph = star(6);
            let mut composite = CompositePolicy::with_rng(5, ConstRng(u64::MAX));
            composite.initialize(graph);
            composite.clear();

            // Static pool was cleared too; a true miss lands in LRU (last).
            assert_eq!(composite.query(&3).unwrap(), Access::Miss);
            assert!(composite.dynamics()[1].contains(&3).unwrap());
            assert_eq!(composite.query(&3).unwrap(), Access::Hit);
            assert_eq!(composite.dynamics()[1].hits(), 1.0);
        }

        #[test]
        fn fallback_may_pick_static_pool_which_never_admits() {
            let graph = star(6);
            let mut composite = CompositePolicy::with_rng(5, ConstRng(0));
            composite.initialize(graph);

            // Node 4 is outside every pool after clearing the dynamics.
            composite.dynamics.iter_mut().for_each(|p| p.clear());
            assert!(!composite.contains(&4).unwrap());

            // ConstRng(0) draws the first sub-policy: the static pool.
            assert_eq!(composite.query(&4).unwrap(), Access::Miss);
            assert_eq!(composite.statics()[0].misses(), 1.0);
            assert!(!composite.contains(&4).unwrap());
            assert_eq!(composite.query(&4).unwrap(), Access::Miss);
            assert_eq!(composite.statics()[0].misses(), 2.0);
        }

        #[test]
        fn unknown_node_fails_before_selection() {
            let mut composite = CompositePolicy::with_seed(5, 2);
            composite.initialize(star(4));
            assert!(matches!(
                composite.query(&100),
                Err(PolicyError::NodeNotFound(_))
            ));
            assert_eq!(composite.hits() + composite.misses(), 0.0);
        }

        #[test]
        fn unbound_composite_fails() {
            let mut composite: CompositePolicy<Graph> = CompositePolicy::with_seed(5, 2);
            assert_eq!(composite.query(&0), Err(PolicyError::Unbound));
            assert_eq!(composite.contains(&0), Err(PolicyError::Unbound));
        }
    }

    mod accounting {
        use super::*;

        #[test]
        fn hit_rate_aggregates_sub_policies() {
            let graph = star(30);
            let mut composite = CompositePolicy::with_seed(6, 4);
            composite.initialize(graph);
            for i in 0..200u32 {
                composite.query(&((i * 7) % 30)).unwrap();
            }
            let stats = composite.sub_stats();
            let hits: f64 = stats.iter().map(|s| s.hits).sum();
            let misses: f64 = stats.iter().map(|s| s.misses).sum();
            assert_eq!(composite.hits(), hits);
            assert_eq!(composite.misses(), misses);
            assert!((composite.hit_rate() - hits / (hits + misses)).abs() < 1e-12);
            assert!(composite.len() <= composite.capacity());
        }

        #[test]
        fn reset_propagates_to_every_sub_policy() {
            let graph = star(10);
            let mut composite = CompositePolicy::with_seed(5, 4);
            composite.initialize(graph);
            for i in 0..10u32 {
                composite.query(&i).unwrap();
            }
            composite.reset();
            assert_eq!(composite.hit_rate(), 0.0);
            assert!(composite.is_empty());
            for i in 0..10u32 {
                assert!(!composite.contains(&i).unwrap());
            }
            assert!(composite.sub_stats().iter().all(|s| s.hits == 0.0 && s.misses == 0.0));
        }

        #[test]
        fn contains_is_pure() {
            let graph = star(8);
            let mut composite = CompositePolicy::with_seed(5, 4);
            composite.initialize(graph);
            composite.query(&0).unwrap();
            composite.query(&5).unwrap();
            let before = composite.sub_stats();
            for i in 0..8u32 {
                composite.contains(&i).unwrap();
            }
            assert_eq!(composite.sub_stats(), before);
        }
    }
}
