//! Plain greedy seed selection.
//!
//! Each round re-evaluates `f(S ∪ {c})` for every remaining candidate `c`
//! and commits the arg-max (smallest node id on ties). Cost is
//! `O(k · |V|)` oracle calls; the lazy selectors in [`crate::engine::celf`]
//! return the same seeds with far fewer calls.
//!
//! Rounds are sequential; candidate evaluations inside a round run on the
//! rayon pool behind the `parallel` feature.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::engine::deadline::Deadline;
use crate::engine::errors::ImError;
use crate::engine::graph::NodeId;
use crate::engine::spread::SpreadOracle;

/// Seeds chosen by an oracle-driven selector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GreedyOutcome {
    /// Seeds in selection order.
    pub seeds: Vec<NodeId>,
    /// Marginal gain of each seed when it was committed.
    pub marginal_gains: Vec<f64>,
    /// Oracle estimate of `f(seeds)` on the selection worlds.
    pub spread: f64,
}

/// `seeds ∪ {candidate}` as an owned seed list.
pub(crate) fn with_candidate(seeds: &[NodeId], candidate: NodeId) -> Vec<NodeId> {
    let mut out = Vec::with_capacity(seeds.len() + 1);
    out.extend_from_slice(seeds);
    out.push(candidate);
    out
}

/// Picks `budget` seeds by exhaustive greedy search.
pub fn greedy<O: SpreadOracle + ?Sized>(
    oracle: &O,
    budget: usize,
    deadline: &Deadline,
) -> Result<GreedyOutcome, ImError> {
    let n = oracle.node_count();
    if budget > n {
        return Err(ImError::InvalidConfig(format!(
            "budget {budget} exceeds node count {n}"
        )));
    }

    let mut chosen = vec![false; n];
    let mut outcome = GreedyOutcome::default();

    for round in 0..budget {
        deadline.check()?;
        let candidates: Vec<NodeId> = (0..n as u32)
            .map(NodeId)
            .filter(|v| !chosen[v.index()])
            .collect();

        let evaluate = |&c: &NodeId| {
            oracle
                .mean_spread(&with_candidate(&outcome.seeds, c))
                .map(|spread| (c, spread))
        };
        #[cfg(feature = "parallel")]
        let scored: Vec<(NodeId, f64)> = candidates
            .par_iter()
            .map(evaluate)
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<(NodeId, f64)> = candidates
            .iter()
            .map(evaluate)
            .collect::<Result<_, _>>()?;

        // candidates are in ascending id order, so strict > keeps the smallest id on ties
        let (best, best_spread) = scored
            .into_iter()
            .reduce(|acc, cand| if cand.1 > acc.1 { cand } else { acc })
            .ok_or_else(|| ImError::Internal("greedy ran out of candidates".into()))?;

        let gain = best_spread - outcome.spread;
        debug!(round, node = best.0, gain, spread = best_spread, "greedy: committed seed");
        chosen[best.index()] = true;
        outcome.seeds.push(best);
        outcome.marginal_gains.push(gain);
        outcome.spread = best_spread;
    }

    Ok(outcome)
}
