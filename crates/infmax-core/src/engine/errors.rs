//! Error types for seed selection and diffusion simulation.

use std::time::Duration;

use thiserror::Error;

use crate::engine::graph::NodeId;

/// Errors that can occur while building graphs, simulating diffusion or
/// selecting seeds.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// All public APIs return `Result<T, ImError>`; library code never panics on
/// bad input. Failures inside helpers (bad edge weight, missing node)
/// propagate straight to the top-level selection call and no partial seed set
/// is returned.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ImError {
    /// Invalid selection or simulation parameters (budget, trial counts, epsilon, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Edge activation probability that is NaN or outside `[0, 1]`.
    ///
    /// Never clamped: a bad weight usually means an upstream bug.
    #[error("invalid activation probability {value} on edge {src:?} -> {dst:?}")]
    InvalidProbability {
        src: NodeId,
        dst: NodeId,
        value: f64,
    },

    /// A seed or edge endpoint that is not part of the graph.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Simulation requested on a graph without nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// Diffusion model name that does not match IC, LT or SI.
    #[error("unknown diffusion model '{0}' (expected IC, LT or SI)")]
    UnknownModel(String),

    /// Selector name that does not match a known algorithm.
    #[error("unknown algorithm '{0}' (expected greedy, celf, celf++, ris, imm or imrank)")]
    UnknownAlgorithm(String),

    /// Numerical failure (non-finite bound, overflowing sample size).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// The per-call deadline elapsed before selection finished.
    #[error("deadline exceeded after {elapsed:?}")]
    DeadlineExceeded { elapsed: Duration },

    /// Internal invariant violation (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
