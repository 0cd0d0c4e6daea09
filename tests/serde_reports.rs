#![cfg(feature = "serde")]

use std::sync::Arc;

use depcache::builder::{PolicyBuilder, PolicyKind};
use depcache::graph::DependencyGraph;
use depcache::policy::composite::CompositeConfig;
use depcache::sim::{run, SimulationReport};
use depcache::traits::CachePolicy;

#[test]
fn policy_kind_serializes_as_its_name() {
    let json = serde_json::to_string(&PolicyKind::TopKWeightedInDegree).unwrap();
    assert_eq!(json, "\"top-k-weighted-in-degree\"");
    let back: PolicyKind = serde_json::from_str("\"weighted-frequency\"").unwrap();
    assert_eq!(back, PolicyKind::WeightedFrequency);
}

#[test]
fn composite_config_fills_missing_fields_with_defaults() {
    let config: CompositeConfig = serde_json::from_str(r#"{"weighted_divisor": 2}"#).unwrap();
    assert_eq!(config.weighted_divisor, 2);
    assert_eq!(config.static_capacity, CompositeConfig::default().static_capacity);
    assert!(config.validate().is_ok());
}

#[test]
fn simulation_report_round_trips() {
    let graph = Arc::new(
        DependencyGraph::from_parts([(0u8, 2.0), (1, 3.0)], [(1, 0)]).unwrap(),
    );
    let mut policy: Box<dyn CachePolicy<DependencyGraph<u8>>> =
        PolicyBuilder::new(1).seed(0).build(PolicyKind::Lfu);
    let report = run(policy.as_mut(), graph, [0, 1, 0, 0]);
    let json = serde_json::to_string(&report).unwrap();
    let back: SimulationReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}
