//! Concrete eviction policies.
//!
//! | Module          | Type(s)                                              | Kind    |
//! |-----------------|------------------------------------------------------|---------|
//! | [`lru`]         | [`LruPolicy`](lru::LruPolicy)                        | dynamic |
//! | [`lfu`]         | [`LfuPolicy`](lfu::LfuPolicy)                        | dynamic |
//! | [`weighted`]    | [`WeightedFrequencyPolicy`](weighted::WeightedFrequencyPolicy) | dynamic |
//! | [`static_topk`] | [`TopKInDegree`](static_topk::TopKInDegree), [`TopKWeightedInDegree`](static_topk::TopKWeightedInDegree), [`TopKSize`](static_topk::TopKSize) | static |
//! | [`composite`]   | [`CompositePolicy`](composite::CompositePolicy)      | mixed   |

pub mod composite;
pub mod lfu;
pub mod lru;
pub mod static_topk;
pub mod weighted;

use rand::seq::index;
use rand::Rng;

use crate::graph::{sorted_nodes, WorkloadGraph};

/// Draws `min(capacity, |V|)` distinct nodes uniformly without replacement.
///
/// The candidate list is the identifier-sorted node set, so the outcome
/// depends only on the random source and the graph's contents.
pub(crate) fn sample_population<G, R>(graph: &G, capacity: usize, rng: &mut R) -> Vec<G::Node>
where
    G: WorkloadGraph,
    R: Rng + ?Sized,
{
    let candidates = sorted_nodes(graph);
    let amount = capacity.min(candidates.len());
    index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect()
}
