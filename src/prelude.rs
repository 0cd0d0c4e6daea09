pub use crate::builder::{PolicyBuilder, PolicyKind};
pub use crate::error::{ConfigError, GraphError, PolicyError};
pub use crate::graph::{DependencyGraph, WorkloadGraph};
pub use crate::metrics::PolicyStats;
pub use crate::policy::composite::{CompositeConfig, CompositePolicy};
pub use crate::policy::lfu::LfuPolicy;
pub use crate::policy::lru::LruPolicy;
pub use crate::policy::static_topk::{TopKInDegree, TopKSize, TopKWeightedInDegree};
pub use crate::policy::weighted::WeightedFrequencyPolicy;
pub use crate::sim::{SimulationReport, Workload, WorkloadGenerator};
pub use crate::traits::{Access, CachePolicy};
