//! # Cache Policy Interface
//!
//! Every eviction policy in this crate implements [`CachePolicy`]. A policy
//! tracks *membership* of graph nodes in a bounded working set; there are no
//! cached values, only presence.
//!
//! ## Lifecycle
//!
//! ```text
//!   new(capacity) ──► initialize(Arc<G>) ──► query / contains ... ──► hit_rate()
//!                          ▲                        │
//!                          │                        ├── clear()  membership only
//!                          └────────────────────────┴── reset()  clear + zero counters
//! ```
//!
//! - `initialize` binds the graph and repopulates membership. Counters are
//!   left untouched; call `reset` to zero them.
//! - `query` records a size-weighted hit or miss and may insert/evict.
//! - `contains` never mutates membership or counters.
//!
//! ## Policy Comparison
//!
//! | Policy                 | Initial population      | On miss                       |
//! |------------------------|-------------------------|-------------------------------|
//! | LRU                    | random sample           | evict LRU, insert as MRU      |
//! | LFU                    | random sample, freq 0   | evict min freq, insert freq 1 |
//! | Weighted frequency     | random sample, score 0  | evict min score, insert s×d   |
//! | Static Top-K (×3)      | top `capacity` by key   | terminal miss                 |
//! | Composite              | every sub-policy        | weighted pick of a sub-policy |
//!
//! ## Thread Safety
//!
//! Policies are single-writer simulation state and are not internally
//! synchronized. Serialize access per instance if sharing across threads.

use std::sync::Arc;

use crate::error::PolicyError;
use crate::graph::WorkloadGraph;
use crate::metrics::PolicyStats;

/// Outcome of a [`CachePolicy::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Hit,
    Miss,
}

impl Access {
    #[inline]
    pub fn is_hit(self) -> bool {
        matches!(self, Access::Hit)
    }

    #[inline]
    pub fn is_miss(self) -> bool {
        !self.is_hit()
    }
}

/// Common contract for graph-workload eviction policies.
///
/// The trait is object safe so heterogeneous policies can be driven through
/// `Box<dyn CachePolicy<G>>`.
pub trait CachePolicy<G: WorkloadGraph> {
    /// Short kebab-case policy name used in reports.
    fn name(&self) -> &'static str;

    /// Maximum number of members. Fixed at construction.
    fn capacity(&self) -> usize;

    /// Current number of members.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds `graph` and repopulates membership. Counters are preserved.
    fn initialize(&mut self, graph: Arc<G>);

    /// Records an access to `node`.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::Unbound`] before `initialize`
    /// - [`PolicyError::NodeNotFound`] if `node` is not in the bound graph
    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError>;

    /// Pure membership check.
    ///
    /// Returns `Ok(false)` for nodes outside the bound graph.
    ///
    /// # Errors
    ///
    /// [`PolicyError::Unbound`] before `initialize`.
    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError>;

    /// Empties membership and auxiliary score tables; counters untouched.
    fn clear(&mut self);

    /// `clear()` followed by zeroing hits and misses.
    fn reset(&mut self);

    /// Accumulated size of hits.
    fn hits(&self) -> f64;

    /// Accumulated size of misses.
    fn misses(&self) -> f64;

    /// Size-weighted hit rate in `[0, 1]`; `0.0` before any access.
    fn hit_rate(&self) -> f64 {
        crate::metrics::hit_rate(self.hits(), self.misses())
    }

    /// Snapshot of counters and occupancy.
    fn stats(&self) -> PolicyStats {
        PolicyStats {
            name: self.name().to_string(),
            capacity: self.capacity(),
            len: self.len(),
            hits: self.hits(),
            misses: self.misses(),
            hit_rate: self.hit_rate(),
        }
    }
}

impl<G: WorkloadGraph, P: CachePolicy<G> + ?Sized> CachePolicy<G> for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn initialize(&mut self, graph: Arc<G>) {
        (**self).initialize(graph)
    }

    fn query(&mut self, node: &G::Node) -> Result<Access, PolicyError> {
        (**self).query(node)
    }

    fn contains(&self, node: &G::Node) -> Result<bool, PolicyError> {
        (**self).contains(node)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn hits(&self) -> f64 {
        (**self).hits()
    }

    fn misses(&self) -> f64 {
        (**self).misses()
    }

    fn hit_rate(&self) -> f64 {
        (**self).hit_rate()
    }
}

/// Resolves the size of `node` in a bound graph, mapping the two failure
/// modes every policy shares.
pub(crate) fn bound_size<G: WorkloadGraph>(
    graph: Option<&Arc<G>>,
    node: &G::Node,
) -> Result<f64, PolicyError> {
    let graph = graph.ok_or(PolicyError::Unbound)?;
    graph
        .size(node)
        .ok_or_else(|| PolicyError::node_not_found(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_predicates() {
        assert!(Access::Hit.is_hit());
        assert!(!Access::Hit.is_miss());
        assert!(Access::Miss.is_miss());
    }
}
