use std::env;
use std::sync::Arc;

use depcache::builder::{PolicyBuilder, PolicyKind};
use depcache::graph::DependencyGraph;
use depcache::sim::{compare, Workload, WorkloadGenerator};

fn main() {
    let capacity = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(32usize);

    // Layered graph: each node depends on three nodes of the layer below.
    let width = 64u32;
    let layers = 8u32;
    let nodes = (0..width * layers).map(|i| (i, f64::from(1 + (i * 7919) % 50)));
    let edges = (width..width * layers).flat_map(|i| {
        let below = (i / width - 1) * width;
        (0..3).map(move |k| (i, below + (i * 31 + k * 17) % width))
    });
    let graph = Arc::new(DependencyGraph::from_parts(nodes, edges).expect("valid graph"));

    let builder = PolicyBuilder::new(capacity).seed(2024);
    for workload in [
        Workload::Uniform,
        Workload::InDegreeWeighted,
        Workload::SizeWeighted,
        Workload::Scan,
    ] {
        let stream: Vec<u32> = WorkloadGenerator::new(graph.as_ref(), workload, 7)
            .expect("non-empty graph")
            .take(20_000)
            .collect();
        println!("\n{workload:?} (capacity {capacity})");
        println!("{:<26} {:>10}", "policy", "hit rate");
        for report in compare(&PolicyKind::all(), &builder, Arc::clone(&graph), &stream) {
            println!("{:<26} {:>10.4}", report.policy, report.hit_rate);
        }
    }
}
