//! # Influence graph
//!
//! Weighted directed graph in which every edge `(u, v)` carries the
//! probability that an active `u` activates `v`. Undirected inputs are
//! represented as a pair of opposite directed edges.
//!
//! ## Design
//!
//! - Dense node identifiers `0..n` so per-node state lives in flat vectors
//! - Probabilities validated once, at insertion (NaN and values outside
//!   `[0, 1]` are rejected, never clamped)
//! - Frozen after [`GraphBuilder::build`]: selection runs only borrow the
//!   graph, so it can be shared across worker threads without locking
//! - Forward and reverse offset indexes: forward for simulation, reverse for
//!   reverse-reachable sampling and linear-threshold weight sums
//!
//! ## Example
//!
//! ```rust
//! use infmax_core::engine::graph::{GraphBuilder, NodeId};
//!
//! let mut builder = GraphBuilder::with_nodes(3);
//! builder.add_edge(NodeId(0), NodeId(1), 0.5).unwrap();
//! builder.add_undirected_edge(NodeId(1), NodeId(2), 0.2).unwrap();
//! let graph = builder.build();
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 3);
//! ```

use crate::engine::adjacency_index::{AdjacencyIndex, Direction, Neighborhood};
use crate::engine::errors::ImError;

/// A node identifier. Nodes are numbered densely from zero.
///
/// Ordered so that "smallest node id" tie-breaking is a plain comparison.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of this node in per-node state vectors.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An edge identifier, assigned in insertion order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EdgeId(pub u32);

impl EdgeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed edge with its activation probability.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeData {
    pub id: EdgeId,
    pub src: NodeId,
    pub dst: NodeId,
    /// Activation probability in `[0, 1]`. Doubles as the LT edge weight.
    pub prob: f64,
}

/// Checks that `value` is a usable probability.
pub(crate) fn check_probability(src: NodeId, dst: NodeId, value: f64) -> Result<(), ImError> {
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(ImError::InvalidProbability { src, dst, value });
    }
    Ok(())
}

/// Incremental constructor for [`InfluenceGraph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    node_count: u32,
    edges: Vec<EdgeData>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with nodes `0..n` and no edges.
    pub fn with_nodes(n: u32) -> Self {
        Self {
            node_count: n,
            edges: Vec::new(),
        }
    }

    /// Appends one isolated node and returns its id.
    pub fn add_node(&mut self) -> Result<NodeId, ImError> {
        let id = NodeId(self.node_count);
        self.node_count = self
            .node_count
            .checked_add(1)
            .ok_or_else(|| ImError::InvalidConfig("node count exceeds u32::MAX".into()))?;
        Ok(id)
    }

    pub fn node_count(&self) -> usize {
        self.node_count as usize
    }

    /// Adds a directed edge `src -> dst`.
    ///
    /// The node range grows to cover both endpoints, so edge lists with
    /// implicit node sets can be fed in directly.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, prob: f64) -> Result<EdgeId, ImError> {
        check_probability(src, dst, prob)?;
        let id = u32::try_from(self.edges.len())
            .map(EdgeId)
            .map_err(|_| ImError::InvalidConfig("edge count exceeds u32::MAX".into()))?;
        let max_endpoint = src.0.max(dst.0);
        let needed = max_endpoint.checked_add(1).ok_or_else(|| {
            ImError::InvalidConfig(format!("node id {max_endpoint} exceeds the id range"))
        })?;
        self.node_count = self.node_count.max(needed);
        self.edges.push(EdgeData { id, src, dst, prob });
        Ok(id)
    }

    /// Adds `a -> b` and `b -> a` with the same probability.
    pub fn add_undirected_edge(
        &mut self,
        a: NodeId,
        b: NodeId,
        prob: f64,
    ) -> Result<(EdgeId, EdgeId), ImError> {
        let forward = self.add_edge(a, b, prob)?;
        let backward = self.add_edge(b, a, prob)?;
        Ok((forward, backward))
    }

    /// Freezes the builder into an immutable graph with forward and reverse indexes.
    pub fn build(self) -> InfluenceGraph {
        let node_count = self.node_count as usize;
        let out_index = AdjacencyIndex::build(node_count, &self.edges, Direction::Forward);
        let in_index = AdjacencyIndex::build(node_count, &self.edges, Direction::Reverse);
        InfluenceGraph {
            node_count,
            edges: self.edges,
            out_index,
            in_index,
        }
    }
}

/// Immutable influence graph. Read-only for the lifetime of a selection run.
#[derive(Debug, Clone, Default)]
pub struct InfluenceGraph {
    node_count: usize,
    edges: Vec<EdgeData>,
    out_index: AdjacencyIndex,
    in_index: AdjacencyIndex,
}

impl InfluenceGraph {
    /// Builds a graph from `(src, dst, prob)` triples over at least `node_count` nodes.
    pub fn from_edges(
        node_count: u32,
        edges: impl IntoIterator<Item = (u32, u32, f64)>,
    ) -> Result<Self, ImError> {
        let mut builder = GraphBuilder::with_nodes(node_count);
        for (src, dst, prob) in edges {
            builder.add_edge(NodeId(src), NodeId(dst), prob)?;
        }
        Ok(builder.build())
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count
    }

    /// All node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.node_count as u32).map(NodeId)
    }

    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> Option<&EdgeData> {
        self.edges.get(id.index())
    }

    /// Out-edges of `node` (destinations and probabilities).
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> Neighborhood<'_> {
        self.out_index.neighborhood(node)
    }

    /// In-edges of `node` (sources and probabilities).
    #[inline]
    pub fn in_edges(&self, node: NodeId) -> Neighborhood<'_> {
        self.in_index.neighborhood(node)
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.out_index.degree(node)
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.in_index.degree(node)
    }

    /// Total incoming weight of `node`, the quantity LT thresholds compare against.
    pub fn in_weight_sum(&self, node: NodeId) -> f64 {
        self.in_edges(node).weight_sum()
    }

    /// Largest incoming weight sum over all nodes (0 for edgeless graphs).
    ///
    /// Linear-threshold live-edge sampling assumes this is at most 1.
    pub fn max_in_weight_sum(&self) -> f64 {
        self.nodes()
            .map(|v| self.in_weight_sum(v))
            .fold(0.0, f64::max)
    }

    /// Fails with [`ImError::UnknownNode`] on the first seed outside the graph.
    pub fn check_seeds(&self, seeds: &[NodeId]) -> Result<(), ImError> {
        match seeds.iter().find(|s| !self.contains(**s)) {
            Some(missing) => Err(ImError::UnknownNode(*missing)),
            None => Ok(()),
        }
    }
}
