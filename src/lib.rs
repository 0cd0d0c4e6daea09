//! depcache: cache-replacement policy simulation over weighted dependency graphs.
//!
//! Nodes of a [`WorkloadGraph`](graph::WorkloadGraph) carry a `size` and an
//! in-degree. Policies track which nodes sit in a bounded working set and
//! accumulate size-weighted hits and misses as a node stream is replayed.
//!
//! - [`policy`]: LRU, LFU, weighted frequency, static Top-K and composite
//! - [`builder`]: build any policy by [`PolicyKind`](builder::PolicyKind)
//! - [`sim`]: workload generation and replay

pub mod builder;
pub mod ds;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod sim;
pub mod traits;

pub use crate::ds::{IntrusiveList, LazyMinHeap, SlotArena, SlotId};
