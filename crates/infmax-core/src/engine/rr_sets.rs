//! Reverse-reachable (RR) set sampling and the RR-set pool.
//!
//! An RR set is the set of nodes that would have activated a uniformly random
//! root in one sampled world. The sampler traverses the graph backwards from
//! the root and draws only the randomness it touches:
//!
//! | Model | Reverse traversal                                                     |
//! |-------|-----------------------------------------------------------------------|
//! | IC    | BFS over in-edges, each live with its probability, depth ≤ rounds     |
//! | LT    | walk choosing at most one in-neighbour per step (`w` each, none with `1 - Σw`) |
//! | SI    | first-passage search over lazily drawn transmission delays ≤ steps    |
//!
//! The forward simulator in [`crate::engine::diffusion`] applies the same
//! round/step bounds, so `n · Pr[S hits a random RR set]` is the spread of `S`.
//!
//! [`RrPool`] stores sets in an arena with a node → set inverted index and
//! keeps per-node coverage counts of the sets still alive, so greedy
//! max-coverage is a scan over counts and covering a node touches only the
//! sets that contain it.

use std::ops::Range;

use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::diffusion::{transmission_delay, DiffusionModel, NEVER};
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};
use crate::engine::spread::stream_rng;

/// Draw budget of [`RrPool::top_up`], as a multiple of the target size.
pub const TOP_UP_DRAW_FACTOR: usize = 16;

/// Per-worker traversal scratch, reset sparsely after every sample.
#[derive(Debug, Clone, Default)]
struct ReverseSearch {
    visited: Vec<bool>,
    distance: Vec<u32>,
    frontier: Vec<NodeId>,
    next: Vec<NodeId>,
    buckets: Vec<Vec<NodeId>>,
}

impl ReverseSearch {
    fn new(node_count: usize) -> Self {
        Self {
            visited: vec![false; node_count],
            distance: vec![NEVER; node_count],
            ..Self::default()
        }
    }

    fn sample<R: Rng + ?Sized>(
        &mut self,
        graph: &InfluenceGraph,
        model: &DiffusionModel,
        rng: &mut R,
    ) -> Vec<NodeId> {
        let root = NodeId(rng.gen_range(0..graph.node_count() as u32));
        let mut set = vec![root];
        self.visited[root.index()] = true;

        match *model {
            DiffusionModel::IndependentCascade { max_rounds } => {
                self.reverse_cascade(graph, max_rounds, rng, &mut set)
            }
            DiffusionModel::LinearThreshold { max_rounds } => {
                reverse_walk(graph, max_rounds, rng, &mut self.visited, &mut set)
            }
            DiffusionModel::SusceptibleInfected { beta, steps } => {
                self.reverse_infection(graph, beta, steps, rng, &mut set)
            }
        }

        for v in &set {
            self.visited[v.index()] = false;
            self.distance[v.index()] = NEVER;
        }
        set
    }

    fn reverse_cascade<R: Rng + ?Sized>(
        &mut self,
        graph: &InfluenceGraph,
        max_rounds: usize,
        rng: &mut R,
        set: &mut Vec<NodeId>,
    ) {
        self.frontier.clear();
        self.frontier.push(set[0]);
        for _ in 0..max_rounds {
            if self.frontier.is_empty() {
                break;
            }
            self.next.clear();
            for &v in &self.frontier {
                for (u, p, _) in graph.in_edges(v).iter() {
                    if !self.visited[u.index()] && rng.gen::<f64>() < p {
                        self.visited[u.index()] = true;
                        self.next.push(u);
                    }
                }
            }
            set.extend_from_slice(&self.next);
            std::mem::swap(&mut self.frontier, &mut self.next);
        }
    }

    /// Bucketed first-passage search; every node is settled once, at its final distance.
    fn reverse_infection<R: Rng + ?Sized>(
        &mut self,
        graph: &InfluenceGraph,
        beta: f64,
        steps: usize,
        rng: &mut R,
        set: &mut Vec<NodeId>,
    ) {
        if self.buckets.len() < steps + 1 {
            self.buckets.resize_with(steps + 1, Vec::new);
        }
        let root = set[0];
        self.distance[root.index()] = 0;
        self.buckets[0].push(root);

        for t in 0..=steps {
            let bucket = std::mem::take(&mut self.buckets[t]);
            for &v in &bucket {
                if self.distance[v.index()] != t as u32 {
                    continue;
                }
                for (u, _, _) in graph.in_edges(v).iter() {
                    let delay = transmission_delay(rng, beta, steps);
                    if delay == NEVER {
                        continue;
                    }
                    let reach = t as u32 + delay;
                    if reach as usize > steps || reach >= self.distance[u.index()] {
                        continue;
                    }
                    if !self.visited[u.index()] {
                        self.visited[u.index()] = true;
                        set.push(u);
                    }
                    self.distance[u.index()] = reach;
                    self.buckets[reach as usize].push(u);
                }
            }
            let mut bucket = bucket;
            bucket.clear();
            self.buckets[t] = bucket;
        }
    }
}

fn reverse_walk<R: Rng + ?Sized>(
    graph: &InfluenceGraph,
    max_rounds: usize,
    rng: &mut R,
    visited: &mut [bool],
    set: &mut Vec<NodeId>,
) {
    let mut current = set[0];
    for _ in 0..max_rounds {
        let draw = rng.gen::<f64>();
        let mut cumulative = 0.0;
        let mut picked = None;
        for (u, w, _) in graph.in_edges(current).iter() {
            cumulative += w;
            if draw < cumulative {
                picked = Some(u);
                break;
            }
        }
        match picked {
            Some(u) if !visited[u.index()] => {
                visited[u.index()] = true;
                set.push(u);
                current = u;
            }
            _ => break,
        }
    }
}

/// Draws one RR set with the caller's RNG (root first, then discovery order).
pub fn generate_rr_set<R: Rng + ?Sized>(
    graph: &InfluenceGraph,
    model: &DiffusionModel,
    rng: &mut R,
) -> Result<Vec<NodeId>, ImError> {
    if graph.is_empty() {
        return Err(ImError::EmptyGraph);
    }
    model.validate()?;
    Ok(ReverseSearch::new(graph.node_count()).sample(graph, model, rng))
}

/// Reproducible batch sampler: the set with stream index `i` is drawn from
/// [`stream_rng`]`(seed, i)`, independent of how batches are split or scheduled.
#[derive(Debug, Clone, Copy)]
pub struct RrSampler<'g> {
    graph: &'g InfluenceGraph,
    model: DiffusionModel,
    seed: u64,
}

impl<'g> RrSampler<'g> {
    pub fn new(graph: &'g InfluenceGraph, model: DiffusionModel, seed: u64) -> Result<Self, ImError> {
        if graph.is_empty() {
            return Err(ImError::EmptyGraph);
        }
        model.validate()?;
        Ok(Self { graph, model, seed })
    }

    pub fn graph(&self) -> &'g InfluenceGraph {
        self.graph
    }

    /// Samples the sets with the given stream indices.
    pub fn sample_streams(&self, streams: Range<u64>) -> Vec<Vec<NodeId>> {
        let n = self.graph.node_count();
        let draw = |search: &mut ReverseSearch, i: u64| {
            let mut rng = stream_rng(self.seed, i);
            search.sample(self.graph, &self.model, &mut rng)
        };

        #[cfg(feature = "parallel")]
        {
            streams
                .into_par_iter()
                .map_init(|| ReverseSearch::new(n), draw)
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut search = ReverseSearch::new(n);
            streams.map(|i| draw(&mut search, i)).collect()
        }
    }
}

/// Greedy max-coverage result over a pool.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coverage {
    pub seeds: Vec<NodeId>,
    /// Newly covered sets per seed, in selection order.
    pub gains: Vec<usize>,
    /// Sets covered by all seeds together.
    pub covered: usize,
}

/// Arena of RR sets with an inverted index and live coverage counts.
#[derive(Debug, Clone)]
pub struct RrPool {
    sets: Vec<Vec<NodeId>>,
    alive: Vec<bool>,
    live: usize,
    /// node -> indices of the sets containing it
    index: Vec<Vec<u32>>,
    /// node -> number of live sets containing it
    coverage: Vec<usize>,
    /// Stream indices consumed so far; the next set uses this one.
    next_stream: u64,
}

impl RrPool {
    pub fn new(node_count: usize) -> Self {
        Self {
            sets: Vec::new(),
            alive: Vec::new(),
            live: 0,
            index: vec![Vec::new(); node_count],
            coverage: vec![0; node_count],
            next_stream: 0,
        }
    }

    /// Sets still alive (not covered by a removed node).
    pub fn live_len(&self) -> usize {
        self.live
    }

    /// Every set ever added, alive or not.
    pub fn total_len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn coverage(&self, node: NodeId) -> usize {
        self.coverage.get(node.index()).copied().unwrap_or(0)
    }

    /// Adds one set. Its nodes must belong to the pool's node range.
    pub fn push(&mut self, set: Vec<NodeId>) -> Result<(), ImError> {
        let id = u32::try_from(self.sets.len())
            .map_err(|_| ImError::InvalidConfig("RR pool exceeds u32::MAX sets".into()))?;
        if let Some(&missing) = set.iter().find(|v| v.index() >= self.index.len()) {
            return Err(ImError::UnknownNode(missing));
        }
        for &v in &set {
            self.index[v.index()].push(id);
            self.coverage[v.index()] += 1;
        }
        self.sets.push(set);
        self.alive.push(true);
        self.live += 1;
        Ok(())
    }

    /// Draws `count` fresh sets from `sampler`, continuing its stream sequence.
    pub fn fill(&mut self, sampler: &RrSampler<'_>, count: usize) -> Result<(), ImError> {
        if count == 0 {
            return Ok(());
        }
        let start = self.next_stream;
        let end = start + count as u64;
        for set in sampler.sample_streams(start..end) {
            self.push(set)?;
        }
        self.next_stream = end;
        Ok(())
    }

    /// Tops the live set count back up to `target` with sets that miss every
    /// node flagged in `covered`; fresh sets hitting one are retired on arrival.
    ///
    /// Gives up after `TOP_UP_DRAW_FACTOR · target` draws, so the pool may stay
    /// short when almost every set is already covered. Returns the sets drawn.
    pub fn top_up(
        &mut self,
        sampler: &RrSampler<'_>,
        target: usize,
        covered: &[bool],
    ) -> Result<usize, ImError> {
        let limit = target.saturating_mul(TOP_UP_DRAW_FACTOR);
        let mut drawn = 0;
        while self.live < target && drawn < limit {
            let batch = (target - self.live).min(limit - drawn);
            let first = self.sets.len();
            self.fill(sampler, batch)?;
            drawn += batch;
            for id in first..self.sets.len() {
                let hit = self.sets[id]
                    .iter()
                    .any(|v| covered.get(v.index()).copied().unwrap_or(false));
                if hit {
                    self.retire(id);
                }
            }
        }
        Ok(drawn)
    }

    fn retire(&mut self, id: usize) {
        self.alive[id] = false;
        for v in &self.sets[id] {
            self.coverage[v.index()] -= 1;
        }
        self.live -= 1;
    }

    /// Node in the most live sets, skipping `excluded`; smallest id on ties.
    pub fn best_node(&self, excluded: &[bool]) -> Option<(NodeId, usize)> {
        let mut best: Option<(NodeId, usize)> = None;
        for (v, &count) in self.coverage.iter().enumerate() {
            if excluded.get(v).copied().unwrap_or(false) {
                continue;
            }
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((NodeId(v as u32), count));
            }
        }
        best
    }

    /// Retires every live set containing `node`; returns how many were retired.
    pub fn cover(&mut self, node: NodeId) -> usize {
        let Some(containing) = self.index.get(node.index()) else {
            return 0;
        };
        let live: Vec<usize> = containing
            .iter()
            .map(|&id| id as usize)
            .filter(|&id| self.alive[id])
            .collect();
        for &id in &live {
            self.retire(id);
        }
        live.len()
    }

    /// Greedy maximum coverage of the live sets with `k` nodes. Leaves the pool untouched.
    pub fn max_coverage(&self, k: usize) -> Coverage {
        let mut coverage = self.coverage.clone();
        let mut covered = self.alive.iter().map(|a| !a).collect::<Vec<_>>();
        let mut chosen = vec![false; coverage.len()];
        let mut out = Coverage::default();

        for _ in 0..k.min(coverage.len()) {
            let mut best: Option<(usize, usize)> = None;
            for (v, &count) in coverage.iter().enumerate() {
                if !chosen[v] && best.map_or(true, |(_, c)| count > c) {
                    best = Some((v, count));
                }
            }
            let Some((v, gain)) = best else { break };
            chosen[v] = true;
            for &id in &self.index[v] {
                let id = id as usize;
                if covered[id] {
                    continue;
                }
                covered[id] = true;
                for u in &self.sets[id] {
                    coverage[u.index()] -= 1;
                }
            }
            out.seeds.push(NodeId(v as u32));
            out.gains.push(gain);
            out.covered += gain;
        }
        out
    }
}
