//! Unified policy builder.
//!
//! Creates any policy in this crate as a `Box<dyn CachePolicy<G>>` from a
//! [`PolicyKind`], so drivers can select policies by name and compare them
//! over the same workload.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use depcache::builder::{PolicyBuilder, PolicyKind};
//! use depcache::graph::DependencyGraph;
//! use depcache::traits::CachePolicy;
//!
//! let graph = Arc::new(DependencyGraph::from_parts([(1u32, 2.0), (2, 3.0)], [(1, 2)]).unwrap());
//! let kind: PolicyKind = "top-k-size".parse().unwrap();
//!
//! let mut policy: Box<dyn CachePolicy<DependencyGraph<u32>>> =
//!     PolicyBuilder::new(1).seed(7).build(kind);
//! policy.initialize(graph);
//! assert!(policy.query(&2).unwrap().is_hit());
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::graph::WorkloadGraph;
use crate::policy::composite::{CompositeConfig, CompositePolicy};
use crate::policy::lfu::LfuPolicy;
use crate::policy::lru::LruPolicy;
use crate::policy::static_topk::{TopKInDegree, TopKSize, TopKWeightedInDegree};
use crate::policy::weighted::WeightedFrequencyPolicy;
use crate::traits::CachePolicy;

/// Available eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PolicyKind {
    /// Least Recently Used.
    Lru,
    /// Least Frequently Used, +1 per hit.
    Lfu,
    /// LFU scored by `size × in_degree`.
    WeightedFrequency,
    /// Static top-k by in-degree.
    TopKInDegree,
    /// Static top-k by `in_degree × size`.
    TopKWeightedInDegree,
    /// Static top-k by size.
    TopKSize,
    /// Static + adaptive dynamic sub-policies.
    Composite,
}

impl PolicyKind {
    pub fn all() -> [PolicyKind; 7] {
        [
            PolicyKind::Lru,
            PolicyKind::Lfu,
            PolicyKind::WeightedFrequency,
            PolicyKind::TopKInDegree,
            PolicyKind::TopKWeightedInDegree,
            PolicyKind::TopKSize,
            PolicyKind::Composite,
        ]
    }

    /// Kebab-case name, identical to [`CachePolicy::name`] of the built policy.
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::WeightedFrequency => "weighted-frequency",
            PolicyKind::TopKInDegree => "top-k-in-degree",
            PolicyKind::TopKWeightedInDegree => "top-k-weighted-in-degree",
            PolicyKind::TopKSize => "top-k-size",
            PolicyKind::Composite => "composite",
        }
    }

    /// `true` for policies whose membership never changes after initialize.
    pub fn is_static(self) -> bool {
        matches!(
            self,
            PolicyKind::TopKInDegree | PolicyKind::TopKWeightedInDegree | PolicyKind::TopKSize
        )
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        PolicyKind::all()
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ConfigError::new(format!("unknown policy: {s}")))
    }
}

/// Builder carrying capacity, seed and composite configuration.
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    capacity: usize,
    seed: Option<u64>,
    composite: CompositeConfig,
}

impl PolicyBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seed: None,
            composite: CompositeConfig::default(),
        }
    }

    /// Fixes every random source of the built policy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Overrides the composite capacity split and exploration constant.
    pub fn composite(mut self, config: CompositeConfig) -> Self {
        self.composite = config;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Builds `kind`, falling back to the default composite configuration if
    /// the configured one is invalid.
    pub fn build<G: WorkloadGraph + 'static>(&self, kind: PolicyKind) -> Box<dyn CachePolicy<G>> {
        match self.try_build(kind) {
            Ok(policy) => policy,
            Err(err) => {
                tracing::warn!(error = %err, "invalid composite config, using defaults");
                Self {
                    composite: CompositeConfig::default(),
                    ..self.clone()
                }
                .build_unchecked(kind)
            },
        }
    }

    /// Builds `kind`, validating the composite configuration.
    pub fn try_build<G: WorkloadGraph + 'static>(
        &self,
        kind: PolicyKind,
    ) -> Result<Box<dyn CachePolicy<G>>, ConfigError> {
        if kind == PolicyKind::Composite {
            self.composite.validate()?;
        }
        Ok(self.build_unchecked(kind))
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }

    /// Callers validate the composite configuration first.
    fn build_unchecked<G: WorkloadGraph + 'static>(
        &self,
        kind: PolicyKind,
    ) -> Box<dyn CachePolicy<G>> {
        let capacity = self.capacity;
        let mut rng = self.rng();
        match kind {
            PolicyKind::Lru => Box::new(LruPolicy::with_seed(capacity, rng.random())),
            PolicyKind::Lfu => Box::new(LfuPolicy::with_seed(capacity, rng.random())),
            PolicyKind::WeightedFrequency => {
                Box::new(WeightedFrequencyPolicy::with_seed(capacity, rng.random()))
            },
            PolicyKind::TopKInDegree => Box::new(TopKInDegree::new(capacity)),
            PolicyKind::TopKWeightedInDegree => Box::new(TopKWeightedInDegree::new(capacity)),
            PolicyKind::TopKSize => Box::new(TopKSize::new(capacity)),
            PolicyKind::Composite => {
                Box::new(CompositePolicy::with_config(capacity, self.composite, rng))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use std::sync::Arc;

    type Graph = DependencyGraph<u16>;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in PolicyKind::all() {
            assert_eq!(kind.to_string().parse::<PolicyKind>(), Ok(kind));
        }
        assert_eq!("TOP_K_SIZE".parse::<PolicyKind>(), Ok(PolicyKind::TopKSize));
        assert!("arc".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn built_policy_reports_kind_name_and_capacity() {
        let builder = PolicyBuilder::new(4).seed(1);
        for kind in PolicyKind::all() {
            let policy: Box<dyn CachePolicy<Graph>> = builder.build(kind);
            assert_eq!(policy.name(), kind.as_str());
            assert_eq!(policy.capacity(), 4);
        }
    }

    #[test]
    fn try_build_rejects_invalid_composite_config() {
        let builder = PolicyBuilder::new(4).composite(CompositeConfig {
            exploration: -1.0,
            ..CompositeConfig::default()
        });
        assert!(builder.try_build::<Graph>(PolicyKind::Composite).is_err());
        assert!(builder.try_build::<Graph>(PolicyKind::Lru).is_ok());
        assert_eq!(builder.build::<Graph>(PolicyKind::Composite).capacity(), 4);
    }

    #[test]
    fn seeded_builders_are_reproducible() {
        let graph = Arc::new(
            DependencyGraph::from_parts((0..40u16).map(|i| (i, 1.0)), []).unwrap(),
        );
        let run = || {
            let mut policy: Box<dyn CachePolicy<Graph>> =
                PolicyBuilder::new(8).seed(99).build(PolicyKind::Lru);
            policy.initialize(Arc::clone(&graph));
            (0..40u16)
                .map(|n| policy.contains(&n).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn static_kinds_are_flagged() {
        assert!(PolicyKind::TopKSize.is_static());
        assert!(!PolicyKind::Composite.is_static());
    }
}
