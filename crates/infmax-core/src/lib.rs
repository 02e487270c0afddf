//! # infmax core
//!
//! Influence maximization: pick `k` seed nodes of a probabilistic graph that
//! maximize the expected spread of a contagion under Independent Cascade,
//! Linear Threshold or Susceptible-Infected kinetics.
//!
//! ```rust
//! use infmax_core::{select_seeds, Algorithm, InfluenceGraph, SelectionConfig};
//!
//! let graph = InfluenceGraph::from_edges(5, (1..5).map(|leaf| (0, leaf, 0.8))).unwrap();
//! let config = SelectionConfig::new(1).with_trials(50).with_evaluation_trials(100).with_seed(7);
//! let result = select_seeds(&graph, Algorithm::Celf, &config).unwrap();
//! assert_eq!(result.seeds[0].0, 0);
//! ```

pub mod engine;
pub mod metrics;

// Re-export commonly used types
pub use engine::diffusion::DiffusionModel;
pub use engine::errors::ImError;
pub use engine::graph::{EdgeId, GraphBuilder, InfluenceGraph, NodeId};
pub use engine::imm::ImmParams;
pub use engine::imrank::ImRankParams;
pub use engine::selection::{select_seeds, Algorithm, SelectionConfig, SelectionResult};
pub use engine::spread::{simulate_spread, MonteCarlo, SpreadEstimate};
pub use metrics::report::{compare_algorithms, ComparisonReport};
pub use metrics::{evaluate_seed_set, SpreadSummary};
