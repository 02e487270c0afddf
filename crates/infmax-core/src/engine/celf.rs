//! Lazy greedy selection: CELF and CELF++.
//!
//! The spread function is monotone submodular, so a node's marginal gain can
//! only shrink as seeds are added. A cached gain is therefore an upper bound,
//! and a node whose *fresh* gain still tops every cached bound is the greedy
//! choice without re-evaluating anyone else.
//!
//! ## State
//!
//! - An arena of `CachedGain` records, one per node, indexed by `NodeId`.
//!   `generation` is the seed-set size the record was computed against, so
//!   staleness is a single integer comparison.
//! - A max-heap of `(gain, node)` keys, exactly one per unselected node.
//!   Keys are popped and re-pushed when their record is refreshed; they are
//!   never duplicated and the heap is never re-sorted.
//!
//! ## Round loop
//!
//! Pop the top key. If its record is current, commit the node. Otherwise
//! refresh the record against the current seed set, push the new key and
//! repeat.
//!
//! ## CELF++
//!
//! Each refresh also estimates the node's gain against `S ∪ {cur_best}`, where
//! `cur_best` is the best node refreshed so far in the round, in the same
//! batch of trials. If `cur_best` is then committed and the node resurfaces
//! exactly one generation later, that second gain is already current and no
//! oracle call is needed. This is a performance heuristic: it never changes
//! which node is committed when the oracle is deterministic, only how often
//! the oracle is asked.
//!
//! A refresh with a second estimate is one oracle call that simulates two
//! seed sets, so CELF++ saves calls rather than simulation work
//! ([`SpreadOracle::seed_sets_evaluated`] counts the latter). Its
//! initialization pass is also sequential, since every second estimate
//! depends on the best node seen so far, while CELF evaluates all singletons
//! in parallel.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::engine::deadline::Deadline;
use crate::engine::errors::ImError;
use crate::engine::graph::NodeId;
use crate::engine::greedy::{with_candidate, GreedyOutcome};
use crate::engine::spread::SpreadOracle;

/// Cached spread estimates for one node.
#[derive(Debug, Clone, Copy)]
struct CachedGain {
    /// `f(S_g ∪ {node})` where `g = generation`.
    spread_with: f64,
    generation: usize,
    /// CELF++: the node `b` for which `spread_with_best` was estimated.
    prev_best: Option<NodeId>,
    /// CELF++: `f(S_g ∪ {b, node})`.
    spread_with_best: f64,
}

/// Heap key. Larger gain first, then smaller node id.
#[derive(Debug, Clone, Copy)]
struct GainKey {
    gain: f64,
    node: NodeId,
}

impl PartialEq for GainKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GainKey {}

impl PartialOrd for GainKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GainKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Lazy selector variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyVariant {
    Celf,
    CelfPlusPlus,
}

/// Best node refreshed so far in the current round.
#[derive(Debug, Clone, Copy)]
struct RoundBest {
    node: NodeId,
    gain: f64,
}

impl RoundBest {
    fn offer(best: &mut Option<RoundBest>, node: NodeId, gain: f64) {
        let better = match best {
            Some(b) => gain > b.gain || (gain == b.gain && node < b.node),
            None => true,
        };
        if better {
            *best = Some(RoundBest { node, gain });
        }
    }
}

struct LazyGreedy<'o, O: SpreadOracle + ?Sized> {
    oracle: &'o O,
    variant: LazyVariant,
    arena: Vec<CachedGain>,
    heap: BinaryHeap<GainKey>,
    seeds: Vec<NodeId>,
    gains: Vec<f64>,
    /// `f(seeds)` as reported by the oracle when the last seed was committed.
    spread: f64,
    round_best: Option<RoundBest>,
}

impl<'o, O: SpreadOracle + ?Sized> LazyGreedy<'o, O> {
    fn new(oracle: &'o O, variant: LazyVariant, budget: usize) -> Self {
        Self {
            oracle,
            variant,
            arena: Vec::with_capacity(oracle.node_count()),
            heap: BinaryHeap::with_capacity(oracle.node_count()),
            seeds: Vec::with_capacity(budget),
            gains: Vec::with_capacity(budget),
            spread: 0.0,
            round_best: None,
        }
    }

    /// Singleton spreads for every node; the one-time `O(|V|)` evaluation pass.
    fn initialize(&mut self, deadline: &Deadline) -> Result<(), ImError> {
        let n = self.oracle.node_count() as u32;
        match self.variant {
            LazyVariant::Celf => {
                let oracle = self.oracle;
                let singleton = |v: u32| oracle.mean_spread(&[NodeId(v)]);
                #[cfg(feature = "parallel")]
                let spreads: Vec<f64> = (0..n)
                    .into_par_iter()
                    .map(singleton)
                    .collect::<Result<_, _>>()?;
                #[cfg(not(feature = "parallel"))]
                let spreads: Vec<f64> = (0..n).map(singleton).collect::<Result<_, _>>()?;

                for (v, spread_with) in spreads.into_iter().enumerate() {
                    self.arena.push(CachedGain {
                        spread_with,
                        generation: 0,
                        prev_best: None,
                        spread_with_best: 0.0,
                    });
                    self.heap.push(GainKey {
                        gain: spread_with,
                        node: NodeId(v as u32),
                    });
                }
            }
            LazyVariant::CelfPlusPlus => {
                // Sequential: each node's second estimate depends on the best node seen so far.
                self.arena.resize(
                    n as usize,
                    CachedGain {
                        spread_with: 0.0,
                        generation: 0,
                        prev_best: None,
                        spread_with_best: 0.0,
                    },
                );
                for v in 0..n {
                    deadline.check()?;
                    self.refresh(NodeId(v))?;
                }
            }
        }
        Ok(())
    }

    /// Re-estimates `node` against the current seed set and pushes its new key.
    fn refresh(&mut self, node: NodeId) -> Result<(), ImError> {
        let generation = self.seeds.len();
        let base = with_candidate(&self.seeds, node);

        let record = match (self.variant, self.round_best) {
            (LazyVariant::CelfPlusPlus, Some(best)) if best.node != node => {
                let with_best = with_candidate(&base, best.node);
                let spreads = self.oracle.mean_spread_batch(&[base, with_best])?;
                CachedGain {
                    spread_with: spreads[0],
                    generation,
                    prev_best: Some(best.node),
                    spread_with_best: spreads[1],
                }
            }
            _ => CachedGain {
                spread_with: self.oracle.mean_spread(&base)?,
                generation,
                prev_best: None,
                spread_with_best: 0.0,
            },
        };

        let gain = record.spread_with - self.spread;
        self.arena[node.index()] = record;
        self.heap.push(GainKey { gain, node });
        if self.variant == LazyVariant::CelfPlusPlus {
            RoundBest::offer(&mut self.round_best, node, gain);
        }
        Ok(())
    }

    /// CELF++ shortcut: promote the stored `S ∪ {last seed}` estimate without an oracle call.
    fn try_reuse(&mut self, node: NodeId) -> bool {
        if self.variant != LazyVariant::CelfPlusPlus {
            return false;
        }
        let generation = self.seeds.len();
        let last_seed = self.seeds.last().copied();
        let record = &mut self.arena[node.index()];
        if record.prev_best.is_none()
            || record.prev_best != last_seed
            || record.generation + 1 != generation
        {
            return false;
        }
        record.spread_with = record.spread_with_best;
        record.generation = generation;
        record.prev_best = None;
        let gain = record.spread_with - self.spread;
        self.heap.push(GainKey { gain, node });
        RoundBest::offer(&mut self.round_best, node, gain);
        true
    }

    fn commit(&mut self, node: NodeId) {
        let record = self.arena[node.index()];
        let gain = record.spread_with - self.spread;
        debug!(
            round = self.seeds.len(),
            node = node.0,
            gain,
            spread = record.spread_with,
            "lazy greedy: committed seed"
        );
        self.seeds.push(node);
        self.gains.push(gain);
        self.spread = record.spread_with;
        self.round_best = None;
    }

    fn run(mut self, budget: usize, deadline: &Deadline) -> Result<GreedyOutcome, ImError> {
        self.initialize(deadline)?;

        while self.seeds.len() < budget {
            deadline.check()?;
            let top = self
                .heap
                .pop()
                .ok_or_else(|| ImError::Internal("candidate heap exhausted before budget".into()))?;
            let node = top.node;
            if self.arena[node.index()].generation == self.seeds.len() {
                self.commit(node);
            } else if !self.try_reuse(node) {
                self.refresh(node)?;
            }
        }

        Ok(GreedyOutcome {
            seeds: self.seeds,
            marginal_gains: self.gains,
            spread: self.spread,
        })
    }
}

/// Cost-Effective Lazy Forward selection.
pub fn celf<O: SpreadOracle + ?Sized>(
    oracle: &O,
    budget: usize,
    deadline: &Deadline,
) -> Result<GreedyOutcome, ImError> {
    lazy_greedy(oracle, LazyVariant::Celf, budget, deadline)
}

/// CELF++ selection (CELF plus the last-seed shortcut).
pub fn celf_plus_plus<O: SpreadOracle + ?Sized>(
    oracle: &O,
    budget: usize,
    deadline: &Deadline,
) -> Result<GreedyOutcome, ImError> {
    lazy_greedy(oracle, LazyVariant::CelfPlusPlus, budget, deadline)
}

pub fn lazy_greedy<O: SpreadOracle + ?Sized>(
    oracle: &O,
    variant: LazyVariant,
    budget: usize,
    deadline: &Deadline,
) -> Result<GreedyOutcome, ImError> {
    let n = oracle.node_count();
    if budget > n {
        return Err(ImError::InvalidConfig(format!(
            "budget {budget} exceeds node count {n}"
        )));
    }
    if budget == 0 {
        return Ok(GreedyOutcome::default());
    }
    LazyGreedy::new(oracle, variant, budget).run(budget, deadline)
}
