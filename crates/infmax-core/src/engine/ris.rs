//! Reverse Influence Sampling with a fixed-size pool.
//!
//! Each round commits the node found in the most live RR sets, retires every
//! set it covers and draws fresh sets until the pool is back at its target
//! size. Fresh sets already hit by an earlier seed are retired on arrival, so
//! the live pool is always a sample of the sets the current seeds miss.
//!
//! The pool tracks `uncovered`, the estimated share of all RR sets missed by
//! the seeds so far. A seed found in `h` of `L` live sets gains
//! `n · uncovered · h / L`, after which `uncovered` shrinks by `1 - h / L`.
//! The selection itself never calls the Monte Carlo oracle.

use tracing::debug;

use crate::engine::deadline::Deadline;
use crate::engine::errors::ImError;
use crate::engine::graph::NodeId;
use crate::engine::rr_sets::{RrPool, RrSampler};

/// Live RR sets kept in the RIS pool unless configured otherwise.
pub const DEFAULT_RR_SETS: usize = 1000;

/// Seeds chosen by a sketch-based selector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SketchOutcome {
    pub seeds: Vec<NodeId>,
    /// Estimated marginal gain of each seed, `n · covered_i / pool_i`.
    pub marginal_gains: Vec<f64>,
    /// Sum of the marginal gain estimates.
    pub spread: f64,
    /// RR sets drawn over the whole run.
    pub rr_sets: usize,
}

/// Picks `budget` seeds by greedy coverage over a pool of `pool_size` RR sets.
pub fn ris(
    sampler: &RrSampler<'_>,
    budget: usize,
    pool_size: usize,
    deadline: &Deadline,
) -> Result<SketchOutcome, ImError> {
    let n = sampler.graph().node_count();
    if budget > n {
        return Err(ImError::InvalidConfig(format!(
            "budget {budget} exceeds node count {n}"
        )));
    }
    if pool_size == 0 {
        return Err(ImError::InvalidConfig("RIS pool size must be at least 1".into()));
    }

    let mut pool = RrPool::new(n);
    pool.fill(sampler, pool_size)?;
    let mut chosen = vec![false; n];
    let mut uncovered = 1.0;
    let mut outcome = SketchOutcome::default();

    for round in 0..budget {
        deadline.check()?;
        let (node, hits) = pool
            .best_node(&chosen)
            .ok_or_else(|| ImError::Internal("RIS ran out of candidates".into()))?;
        let live = pool.live_len();
        let share = if live == 0 {
            0.0
        } else {
            hits as f64 / live as f64
        };
        let gain = n as f64 * uncovered * share;
        uncovered *= 1.0 - share;
        pool.cover(node);
        chosen[node.index()] = true;

        // nothing left to sample once every set is covered
        let drawn = if uncovered > 0.0 {
            pool.top_up(sampler, pool_size, &chosen)?
        } else {
            0
        };
        debug!(round, node = node.0, hits, gain, drawn, "ris: committed seed");

        outcome.seeds.push(node);
        outcome.marginal_gains.push(gain);
        outcome.spread += gain;
    }

    outcome.rr_sets = pool.total_len();
    Ok(outcome)
}
