//! Graph fixtures shared by the integration and property tests.

use infmax_core::{GraphBuilder, InfluenceGraph, NodeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Undirected path `0 - 1 - ... - (n-1)` with uniform probability.
pub fn path_graph(n: u32, prob: f64) -> InfluenceGraph {
    let mut b = GraphBuilder::with_nodes(n);
    for i in 1..n {
        b.add_undirected_edge(NodeId(i - 1), NodeId(i), prob)
            .expect("fixture probability is valid");
    }
    b.build()
}

/// Directed star: hub `0` points at leaves `1..=leaves`.
pub fn star_graph(leaves: u32, prob: f64) -> InfluenceGraph {
    let mut b = GraphBuilder::with_nodes(leaves + 1);
    for leaf in 1..=leaves {
        b.add_edge(NodeId(0), NodeId(leaf), prob)
            .expect("fixture probability is valid");
    }
    b.build()
}

/// Two overlapping hubs `0` and `21` over leaves `1..=20`, plus hub `22`
/// over leaves `23..=30`. Every edge is certain, so the best pair of seeds
/// is one of the twins together with `22`, reaching all 30 non-twin-hub nodes.
pub fn twin_hub_graph() -> InfluenceGraph {
    let mut b = GraphBuilder::with_nodes(31);
    for leaf in 1..=20 {
        b.add_edge(NodeId(0), NodeId(leaf), 1.0)
            .expect("fixture probability is valid");
        b.add_edge(NodeId(21), NodeId(leaf), 1.0)
            .expect("fixture probability is valid");
    }
    for leaf in 23..=30 {
        b.add_edge(NodeId(22), NodeId(leaf), 1.0)
            .expect("fixture probability is valid");
    }
    b.build()
}

/// Directed G(n, p) graph with edge probabilities drawn from `[0, max_prob]`.
pub fn random_graph(n: u32, edge_density: f64, max_prob: f64, seed: u64) -> InfluenceGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut b = GraphBuilder::with_nodes(n);
    for u in 0..n {
        for v in 0..n {
            if u != v && rng.gen::<f64>() < edge_density {
                let p = rng.gen::<f64>() * max_prob;
                b.add_edge(NodeId(u), NodeId(v), p)
                    .expect("fixture probability is valid");
            }
        }
    }
    b.build()
}

/// Random graph whose LT in-weights sum to at most 1 at every node.
pub fn random_lt_graph(n: u32, edge_density: f64, seed: u64) -> InfluenceGraph {
    let raw = random_graph(n, edge_density, 1.0, seed);
    let mut b = GraphBuilder::with_nodes(n);
    for e in raw.edges() {
        let total = raw.in_weight_sum(e.dst);
        let w = if total > 1.0 { e.prob / total } else { e.prob };
        b.add_edge(e.src, e.dst, w.min(1.0))
            .expect("normalized weight is valid");
    }
    b.build()
}

/// True when `seeds` has no repeated node.
pub fn all_distinct(seeds: &[NodeId]) -> bool {
    let mut sorted = seeds.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).all(|w| w[0] != w[1])
}
