//! Offset-indexed adjacency for influence graphs.
//!
//! Edges are grouped by their key endpoint (source for the forward index,
//! destination for the reverse index) and flattened into contiguous columns,
//! so a neighbourhood lookup is two offset reads and three slice borrows.
//! Within a neighbourhood, entries keep edge insertion order, which keeps
//! every traversal deterministic.

use crate::engine::graph::{EdgeData, EdgeId, NodeId};

/// Which endpoint an index is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Keyed by source; neighbours are destinations (out-edges).
    Forward,
    /// Keyed by destination; neighbours are sources (in-edges).
    Reverse,
}

/// Column-oriented adjacency with per-node offset ranges.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// `offsets[v]..offsets[v + 1]` is the range of node `v` in the columns below.
    offsets: Vec<usize>,
    neighbors: Vec<NodeId>,
    probs: Vec<f64>,
    edge_ids: Vec<EdgeId>,
}

impl AdjacencyIndex {
    /// Builds an index over `node_count` nodes with a counting sort on the key endpoint.
    pub fn build(node_count: usize, edges: &[EdgeData], direction: Direction) -> Self {
        let endpoints = |e: &EdgeData| match direction {
            Direction::Forward => (e.src, e.dst),
            Direction::Reverse => (e.dst, e.src),
        };

        let mut offsets = vec![0usize; node_count + 1];
        for e in edges {
            let (key, _) = endpoints(e);
            offsets[key.index() + 1] += 1;
        }
        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut neighbors = vec![NodeId(0); edges.len()];
        let mut probs = vec![0.0; edges.len()];
        let mut edge_ids = vec![EdgeId(0); edges.len()];
        for e in edges {
            let (key, other) = endpoints(e);
            let slot = cursor[key.index()];
            cursor[key.index()] += 1;
            neighbors[slot] = other;
            probs[slot] = e.prob;
            edge_ids[slot] = e.id;
        }

        Self {
            offsets,
            neighbors,
            probs,
            edge_ids,
        }
    }

    /// Neighbourhood of `node`; empty for nodes outside the index.
    #[inline]
    pub fn neighborhood(&self, node: NodeId) -> Neighborhood<'_> {
        let idx = node.index();
        if idx + 1 >= self.offsets.len() {
            return Neighborhood::default();
        }
        let (start, end) = (self.offsets[idx], self.offsets[idx + 1]);
        Neighborhood {
            nodes: &self.neighbors[start..end],
            probs: &self.probs[start..end],
            edges: &self.edge_ids[start..end],
        }
    }

    #[inline]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighborhood(node).len()
    }
}

/// Borrowed view of one node's incident edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighborhood<'a> {
    /// Opposite endpoints.
    pub nodes: &'a [NodeId],
    /// Activation probabilities, aligned with `nodes`.
    pub probs: &'a [f64],
    /// Edge identifiers, aligned with `nodes`.
    pub edges: &'a [EdgeId],
}

impl<'a> Neighborhood<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates `(neighbor, probability, edge)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64, EdgeId)> + 'a {
        let (nodes, probs, edges) = (self.nodes, self.probs, self.edges);
        nodes
            .iter()
            .zip(probs)
            .zip(edges)
            .map(|((n, p), e)| (*n, *p, *e))
    }

    /// Sum of the activation probabilities in this neighbourhood.
    pub fn weight_sum(&self) -> f64 {
        self.probs.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: u32, src: u32, dst: u32, prob: f64) -> EdgeData {
        EdgeData {
            id: EdgeId(id),
            src: NodeId(src),
            dst: NodeId(dst),
            prob,
        }
    }

    #[test]
    fn forward_and_reverse_ranges() {
        let edges = vec![
            edge(0, 0, 1, 0.5),
            edge(1, 0, 2, 0.25),
            edge(2, 2, 1, 1.0),
        ];
        let fwd = AdjacencyIndex::build(3, &edges, Direction::Forward);
        let rev = AdjacencyIndex::build(3, &edges, Direction::Reverse);

        assert_eq!(fwd.neighborhood(NodeId(0)).nodes, &[NodeId(1), NodeId(2)]);
        assert_eq!(fwd.neighborhood(NodeId(0)).probs, &[0.5, 0.25]);
        assert!(fwd.neighborhood(NodeId(1)).is_empty());

        let into_one: Vec<_> = rev.neighborhood(NodeId(1)).iter().collect();
        assert_eq!(
            into_one,
            vec![(NodeId(0), 0.5, EdgeId(0)), (NodeId(2), 1.0, EdgeId(2))]
        );
        assert_eq!(rev.degree(NodeId(0)), 0);
        assert!((rev.neighborhood(NodeId(1)).weight_sum() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_node_is_empty() {
        let fwd = AdjacencyIndex::build(2, &[edge(0, 0, 1, 0.1)], Direction::Forward);
        assert!(fwd.neighborhood(NodeId(7)).is_empty());
        assert_eq!(AdjacencyIndex::default().degree(NodeId(0)), 0);
    }
}
