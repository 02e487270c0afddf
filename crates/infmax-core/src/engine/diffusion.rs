//! # Diffusion models
//!
//! One stochastic trial of Independent Cascade (IC), Linear Threshold (LT)
//! or Susceptible-Infected (SI) spreading from a seed set.
//!
//! A trial is split into two phases:
//!
//! 1. **World sampling**: all randomness of the trial is drawn up front from
//!    the caller's RNG into a [`World`]:
//!    - IC: one live/dead coin per edge. Each edge is attempted at most once
//!      (when its source first activates), so pre-flipping the coin yields the
//!      same process as flipping it at attempt time.
//!    - LT: one activation threshold per node, uniform on `(0, 1]`.
//!    - SI: one transmission delay per edge: the first step at which the
//!      repeated per-step Bernoulli(`beta`) attempts across that edge succeed,
//!      or never within the step budget.
//! 2. **Propagation**: a deterministic sweep over the sampled world.
//!    IC and LT advance in synchronous rounds (nodes activated in round `t`
//!    first act in round `t + 1`); SI propagates first-passage times through
//!    the sampled delays. All stop at the round/step bound.
//!
//! Splitting the phases lets one world be evaluated against several seed sets,
//! which is how the lazy-greedy selectors compare candidates under common
//! random numbers.
//!
//! Graph and edge weights are only borrowed; per-node activation state lives
//! in a private [`ActivationState`] that is reset between evaluations.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};

/// Propagation rounds for IC and LT unless configured otherwise.
pub const DEFAULT_MAX_ROUNDS: usize = 5;

/// SI step count unless configured otherwise.
pub const DEFAULT_SI_STEPS: usize = 5;

/// SI infection probability used when only the model name is given.
pub const DEFAULT_SI_BETA: f64 = 0.1;

/// Marker for "never within the horizon" in arrival and delay vectors.
pub(crate) const NEVER: u32 = u32::MAX;

/// Diffusion kinetics, selected once at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum DiffusionModel {
    /// Every newly active node gets one activation attempt per inactive
    /// out-neighbour, succeeding with the edge probability.
    IndependentCascade { max_rounds: usize },
    /// A node activates once the weight of its active in-neighbours reaches
    /// its per-trial random threshold.
    LinearThreshold { max_rounds: usize },
    /// Every step, each infected node infects each susceptible out-neighbour
    /// with probability `beta`. No recovery.
    SusceptibleInfected { beta: f64, steps: usize },
}

impl Default for DiffusionModel {
    fn default() -> Self {
        Self::independent_cascade()
    }
}

impl DiffusionModel {
    pub fn independent_cascade() -> Self {
        Self::IndependentCascade {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn linear_threshold() -> Self {
        Self::LinearThreshold {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn susceptible_infected(beta: f64) -> Self {
        Self::SusceptibleInfected {
            beta,
            steps: DEFAULT_SI_STEPS,
        }
    }

    /// Short model name (`IC`, `LT`, `SI`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::IndependentCascade { .. } => "IC",
            Self::LinearThreshold { .. } => "LT",
            Self::SusceptibleInfected { .. } => "SI",
        }
    }

    /// Round (IC/LT) or step (SI) bound.
    pub fn horizon(&self) -> usize {
        match *self {
            Self::IndependentCascade { max_rounds } | Self::LinearThreshold { max_rounds } => {
                max_rounds
            }
            Self::SusceptibleInfected { steps, .. } => steps,
        }
    }

    /// Same model with a different round/step bound.
    pub fn with_horizon(self, horizon: usize) -> Self {
        match self {
            Self::IndependentCascade { .. } => Self::IndependentCascade {
                max_rounds: horizon,
            },
            Self::LinearThreshold { .. } => Self::LinearThreshold {
                max_rounds: horizon,
            },
            Self::SusceptibleInfected { beta, .. } => Self::SusceptibleInfected {
                beta,
                steps: horizon,
            },
        }
    }

    /// Same model with a different SI infection probability; no-op for IC/LT.
    pub fn with_beta(self, beta: f64) -> Self {
        match self {
            Self::SusceptibleInfected { steps, .. } => Self::SusceptibleInfected { beta, steps },
            other => other,
        }
    }

    /// Rejects NaN or out-of-range `beta` and horizons that overflow the arrival clock.
    pub fn validate(&self) -> Result<(), ImError> {
        if let Self::SusceptibleInfected { beta, .. } = *self {
            if beta.is_nan() || !(0.0..=1.0).contains(&beta) {
                return Err(ImError::InvalidConfig(format!(
                    "SI beta must lie in [0, 1], got {beta}"
                )));
            }
        }
        if self.horizon() >= NEVER as usize {
            return Err(ImError::InvalidConfig(format!(
                "{} horizon {} is too large",
                self.name(),
                self.horizon()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DiffusionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndependentCascade { max_rounds } => write!(f, "IC(rounds={max_rounds})"),
            Self::LinearThreshold { max_rounds } => write!(f, "LT(rounds={max_rounds})"),
            Self::SusceptibleInfected { beta, steps } => {
                write!(f, "SI(beta={beta}, steps={steps})")
            }
        }
    }
}

impl FromStr for DiffusionModel {
    type Err = ImError;

    /// Parses `IC`, `LT` or `SI` (case-insensitive, long names accepted) with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ic" | "independent_cascade" | "independent-cascade" => {
                Ok(Self::independent_cascade())
            }
            "lt" | "linear_threshold" | "linear-threshold" => Ok(Self::linear_threshold()),
            "si" | "susceptible_infected" | "susceptible-infected" => {
                Ok(Self::susceptible_infected(DEFAULT_SI_BETA))
            }
            _ => Err(ImError::UnknownModel(s.to_string())),
        }
    }
}

/// All randomness of one trial.
#[derive(Debug, Clone, Default)]
pub(crate) enum World {
    #[default]
    Unsampled,
    /// IC: per-edge live flag.
    LiveEdges(Vec<bool>),
    /// LT: per-node threshold in `(0, 1]`.
    Thresholds(Vec<f64>),
    /// SI: per-edge transmission delay in steps, [`NEVER`] beyond the horizon.
    Delays(Vec<u32>),
}

impl World {
    /// Draws a fresh world into `self`, reusing its allocation where possible.
    pub(crate) fn resample<R: Rng + ?Sized>(
        &mut self,
        graph: &InfluenceGraph,
        model: &DiffusionModel,
        rng: &mut R,
    ) {
        match *model {
            DiffusionModel::IndependentCascade { .. } => {
                let mut live = match std::mem::take(self) {
                    World::LiveEdges(buf) => buf,
                    _ => Vec::new(),
                };
                live.clear();
                live.extend(graph.edges().iter().map(|e| rng.gen::<f64>() < e.prob));
                *self = World::LiveEdges(live);
            }
            DiffusionModel::LinearThreshold { .. } => {
                let mut thresholds = match std::mem::take(self) {
                    World::Thresholds(buf) => buf,
                    _ => Vec::new(),
                };
                thresholds.clear();
                // 1 - U maps [0, 1) onto (0, 1]
                thresholds.extend((0..graph.node_count()).map(|_| 1.0 - rng.gen::<f64>()));
                *self = World::Thresholds(thresholds);
            }
            DiffusionModel::SusceptibleInfected { beta, steps } => {
                let mut delays = match std::mem::take(self) {
                    World::Delays(buf) => buf,
                    _ => Vec::new(),
                };
                delays.clear();
                delays.extend(graph.edges().iter().map(|_| transmission_delay(rng, beta, steps)));
                *self = World::Delays(delays);
            }
        }
    }

    /// Number of nodes ever active when `seeds` start active in this world.
    pub(crate) fn spread(
        &self,
        graph: &InfluenceGraph,
        model: &DiffusionModel,
        seeds: &[NodeId],
        state: &mut ActivationState,
    ) -> usize {
        state.reset();
        match self {
            World::LiveEdges(live) => cascade(graph, seeds, live, model.horizon(), state),
            World::Thresholds(thresholds) => {
                threshold(graph, seeds, thresholds, model.horizon(), state)
            }
            World::Delays(delays) => infection(graph, seeds, delays, model.horizon(), state),
            World::Unsampled => 0,
        }
    }
}

/// Step of the first successful Bernoulli(`beta`) attempt, or [`NEVER`].
pub(crate) fn transmission_delay<R: Rng + ?Sized>(rng: &mut R, beta: f64, steps: usize) -> u32 {
    for step in 1..=steps {
        if rng.gen::<f64>() < beta {
            return step as u32;
        }
    }
    NEVER
}

/// Per-node activation scratch, reset sparsely between evaluations.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActivationState {
    active: Vec<bool>,
    influence: Vec<f64>,
    arrival: Vec<u32>,
    touched: Vec<NodeId>,
    frontier: Vec<NodeId>,
    next: Vec<NodeId>,
    buckets: Vec<Vec<NodeId>>,
}

impl ActivationState {
    pub(crate) fn new(node_count: usize) -> Self {
        Self {
            active: vec![false; node_count],
            influence: vec![0.0; node_count],
            arrival: vec![NEVER; node_count],
            ..Self::default()
        }
    }

    fn reset(&mut self) {
        for v in self.touched.drain(..) {
            let i = v.index();
            self.active[i] = false;
            self.influence[i] = 0.0;
            self.arrival[i] = NEVER;
        }
        self.frontier.clear();
        self.next.clear();
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Marks `v` active; false if it already was.
    #[inline]
    fn activate(&mut self, v: NodeId) -> bool {
        let slot = &mut self.active[v.index()];
        if *slot {
            return false;
        }
        *slot = true;
        self.touched.push(v);
        true
    }

    /// Activates the distinct seeds and makes them the first frontier.
    fn seed(&mut self, seeds: &[NodeId]) -> usize {
        let mut count = 0;
        for &s in seeds {
            if self.activate(s) {
                self.frontier.push(s);
                count += 1;
            }
        }
        count
    }
}

fn cascade(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    live: &[bool],
    max_rounds: usize,
    state: &mut ActivationState,
) -> usize {
    let mut count = state.seed(seeds);
    for _ in 0..max_rounds {
        if state.frontier.is_empty() {
            break;
        }
        let frontier = std::mem::take(&mut state.frontier);
        for &u in &frontier {
            for (v, _, e) in graph.out_edges(u).iter() {
                if live[e.index()] && state.activate(v) {
                    state.next.push(v);
                }
            }
        }
        count += state.next.len();
        state.frontier = frontier;
        std::mem::swap(&mut state.frontier, &mut state.next);
        state.next.clear();
    }
    count
}

fn threshold(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    thresholds: &[f64],
    max_rounds: usize,
    state: &mut ActivationState,
) -> usize {
    let mut count = state.seed(seeds);
    for _ in 0..max_rounds {
        if state.frontier.is_empty() {
            break;
        }
        let frontier = std::mem::take(&mut state.frontier);
        for &u in &frontier {
            for (v, w, _) in graph.out_edges(u).iter() {
                let i = v.index();
                if state.active[i] {
                    continue;
                }
                if state.influence[i] == 0.0 {
                    // tracked so reset() clears partially influenced nodes too
                    state.touched.push(v);
                }
                state.influence[i] += w;
                if state.influence[i] >= thresholds[i] && state.activate(v) {
                    state.next.push(v);
                }
            }
        }
        count += state.next.len();
        state.frontier = frontier;
        std::mem::swap(&mut state.frontier, &mut state.next);
        state.next.clear();
    }
    count
}

/// First-passage propagation with a bucket queue keyed by arrival step.
fn infection(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    delays: &[u32],
    steps: usize,
    state: &mut ActivationState,
) -> usize {
    if state.buckets.len() < steps + 1 {
        state.buckets.resize_with(steps + 1, Vec::new);
    }
    let mut count = 0;
    for &s in seeds {
        if state.activate(s) {
            state.arrival[s.index()] = 0;
            state.buckets[0].push(s);
            count += 1;
        }
    }

    for t in 0..=steps {
        let bucket = std::mem::take(&mut state.buckets[t]);
        for &u in &bucket {
            if state.arrival[u.index()] != t as u32 {
                continue; // superseded by an earlier arrival
            }
            for (v, _, e) in graph.out_edges(u).iter() {
                let delay = delays[e.index()];
                if delay == NEVER {
                    continue;
                }
                let arrival = t as u32 + delay;
                if arrival as usize > steps || arrival >= state.arrival[v.index()] {
                    continue;
                }
                if state.activate(v) {
                    count += 1;
                }
                state.arrival[v.index()] = arrival;
                state.buckets[arrival as usize].push(v);
            }
        }
        state.buckets[t] = bucket;
    }
    count
}

/// Runs one stochastic trial of `model` from `seeds` using the caller's RNG.
///
/// Returns the number of ever-active nodes. Duplicate seeds count once.
pub fn simulate_trial<R: Rng + ?Sized>(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    model: &DiffusionModel,
    rng: &mut R,
) -> Result<usize, ImError> {
    if graph.is_empty() {
        return Err(ImError::EmptyGraph);
    }
    graph.check_seeds(seeds)?;
    model.validate()?;

    let mut world = World::default();
    world.resample(graph, model, rng);
    let mut state = ActivationState::new(graph.node_count());
    Ok(world.spread(graph, model, seeds, &mut state))
}
