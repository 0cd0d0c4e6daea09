use std::sync::Arc;

use depcache::graph::DependencyGraph;
use depcache::policy::lru::LruPolicy;
use depcache::traits::CachePolicy;

fn main() {
    // app → {http, json}; http → {tls, json}
    let graph = DependencyGraph::from_parts(
        [
            ("app", 4.0),
            ("http", 12.0),
            ("json", 6.0),
            ("tls", 30.0),
        ],
        [
            ("app", "http"),
            ("app", "json"),
            ("http", "tls"),
            ("http", "json"),
        ],
    )
    .expect("valid graph");
    let graph = Arc::new(graph);

    let mut lru = LruPolicy::with_seed(2, 42);
    lru.initialize(Arc::clone(&graph));
    println!("initial members: {:?}", lru.recency_order());

    for node in ["json", "tls", "json", "app", "tls", "http", "json"] {
        let access = lru
            .query(&node)
            .expect("every queried node belongs to the graph");
        println!("{node:>5}: {access:?}  order={:?}", lru.recency_order());
    }

    println!(
        "hits={} misses={} hit_rate={:.3}",
        lru.hits(),
        lru.misses(),
        lru.hit_rate()
    );
}
