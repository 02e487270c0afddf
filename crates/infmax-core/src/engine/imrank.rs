//! IMRank: seeds from a self-consistent influence ranking.
//!
//! Every node starts with one unit of ranking-based marginal influence `Mr`.
//! One Last-to-First Allocation (LFA) pass walks the current ranking from the
//! bottom up; a node `v` at position `i` hands the share `p(u, v) · Mr(v)` to
//! each in-neighbour `u` ranked above it, higher-ranked neighbours first, and
//! keeps the rest. The total `Σ Mr = n` is preserved. Nodes are then re-ranked
//! by `Mr` (ties keep their previous order) and the pass repeats until the
//! ranking is a fixed point or `max_iterations` passes have run.
//!
//! `p(u, v)` is the edge probability divided by the total out-weight of `u`,
//! so every node distributes at most one unit of influence per pass. The
//! initial ranking is by weighted out-degree. No diffusion is simulated; the
//! diffusion model of the selection call does not affect the ranking.

use tracing::{debug, warn};

use crate::engine::deadline::Deadline;
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Iteration bound of the ranking fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImRankParams {
    /// LFA passes run before giving up on convergence.
    pub max_iterations: usize,
}

impl Default for ImRankParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ImRankParams {
    pub fn validate(&self) -> Result<(), ImError> {
        if self.max_iterations == 0 {
            return Err(ImError::InvalidConfig(
                "IMRank max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Final ranking of every node.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// All nodes, most influential first.
    pub order: Vec<NodeId>,
    /// `Mr` per node index, from the last pass.
    pub scores: Vec<f64>,
    /// LFA passes run.
    pub iterations: usize,
    /// False when `max_iterations` ran out before the ranking settled.
    pub converged: bool,
}

impl Ranking {
    /// The first `k` nodes of the ranking with their scores.
    pub fn top(&self, k: usize) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.order
            .iter()
            .take(k)
            .map(|&v| (v, self.scores[v.index()]))
    }
}

/// Total out-weight per node.
fn out_weight_sums(graph: &InfluenceGraph) -> Vec<f64> {
    graph
        .nodes()
        .map(|v| graph.out_edges(v).weight_sum())
        .collect()
}

/// One LFA pass over `order`; overwrites `scores`.
fn allocate(
    graph: &InfluenceGraph,
    out_sums: &[f64],
    order: &[NodeId],
    position: &[usize],
    scores: &mut [f64],
    donors: &mut Vec<(usize, f64)>,
) {
    scores.fill(1.0);
    for i in (1..order.len()).rev() {
        let v = order[i];
        donors.clear();
        for (u, w, _) in graph.in_edges(v).iter() {
            let rank = position[u.index()];
            let total = out_sums[u.index()];
            if rank < i && total > 0.0 {
                donors.push((rank, w / total));
            }
        }
        donors.sort_by_key(|&(rank, _)| rank);
        for &(rank, p) in donors.iter() {
            let share = p * scores[v.index()];
            scores[order[rank].index()] += share;
            scores[v.index()] -= share;
        }
    }
}

/// Ranks every node of `graph` by iterating LFA to a fixed point.
pub fn rank_nodes(
    graph: &InfluenceGraph,
    params: &ImRankParams,
    deadline: &Deadline,
) -> Result<Ranking, ImError> {
    params.validate()?;
    if graph.is_empty() {
        return Err(ImError::EmptyGraph);
    }
    let n = graph.node_count();
    let out_sums = out_weight_sums(graph);

    let mut order: Vec<NodeId> = graph.nodes().collect();
    // stable: equal out-weight keeps ascending ids
    order.sort_by(|a, b| out_sums[b.index()].total_cmp(&out_sums[a.index()]));

    let mut position = vec![0usize; n];
    let mut scores = vec![1.0; n];
    let mut donors = Vec::new();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations {
        deadline.check()?;
        for (i, v) in order.iter().enumerate() {
            position[v.index()] = i;
        }
        allocate(graph, &out_sums, &order, &position, &mut scores, &mut donors);
        iterations += 1;

        let mut next = order.clone();
        next.sort_by(|a, b| scores[b.index()].total_cmp(&scores[a.index()]));
        let settled = next == order;
        debug!(iteration = iterations, settled, "imrank: lfa pass");
        order = next;
        if settled {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            iterations,
            "imrank: ranking did not settle, using the last pass"
        );
    }
    Ok(Ranking {
        order,
        scores,
        iterations,
        converged,
    })
}

/// Seeds picked from the top of the IMRank ranking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RankOutcome {
    pub seeds: Vec<NodeId>,
    /// `Mr` of each seed in the final ranking.
    pub scores: Vec<f64>,
    /// Sum of the seed scores.
    pub spread: f64,
    pub iterations: usize,
}

/// Picks the `budget` highest-ranked nodes.
pub fn imrank(
    graph: &InfluenceGraph,
    budget: usize,
    params: &ImRankParams,
    deadline: &Deadline,
) -> Result<RankOutcome, ImError> {
    let n = graph.node_count();
    if budget > n {
        return Err(ImError::InvalidConfig(format!(
            "budget {budget} exceeds node count {n}"
        )));
    }
    let ranking = rank_nodes(graph, params, deadline)?;
    let (seeds, scores): (Vec<NodeId>, Vec<f64>) = ranking.top(budget).unzip();
    Ok(RankOutcome {
        spread: scores.iter().sum(),
        seeds,
        scores,
        iterations: ranking.iterations,
    })
}
