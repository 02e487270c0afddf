//! Monte Carlo spread estimation.
//!
//! [`simulate_spread`] runs `trials` independent diffusion trials and returns
//! the per-trial samples together with their mean. Trial `i` draws from its
//! own ChaCha stream derived from `(seed, i)`, so:
//!
//! - results are identical whether trials run sequentially or on the rayon pool
//! - two calls with the same seed observe the same sampled worlds, which makes
//!   candidate comparisons inside the greedy selectors use common random numbers
//!
//! ## Feature gating
//!
//! Trials run in parallel behind the `parallel` feature flag. When disabled,
//! they are evaluated sequentially with identical results.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::engine::diffusion::{ActivationState, DiffusionModel, World};
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};
use crate::metrics::SpreadSummary;

/// Trials per spread estimate during selection.
pub const DEFAULT_TRIALS: usize = 100;

/// Trials used when evaluating a finished seed set.
pub const DEFAULT_EVALUATION_TRIALS: usize = 1000;

/// Trial count and base seed of a Monte Carlo estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarlo {
    pub trials: usize,
    pub seed: u64,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: 0,
        }
    }
}

impl MonteCarlo {
    pub fn new(trials: usize, seed: u64) -> Self {
        Self { trials, seed }
    }

    pub fn validate(&self) -> Result<(), ImError> {
        if self.trials == 0 {
            return Err(ImError::InvalidConfig(
                "Monte Carlo trial count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// RNG for stream `stream` under `seed`. Streams are independent.
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Per-trial spread samples and their mean.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpreadEstimate {
    pub mean: f64,
    pub samples: Vec<f64>,
}

impl SpreadEstimate {
    /// Mean, sample standard deviation and extrema of the samples.
    pub fn summary(&self) -> SpreadSummary {
        SpreadSummary::from_samples(&self.samples)
    }
}

fn check_inputs(
    graph: &InfluenceGraph,
    model: &DiffusionModel,
    mc: &MonteCarlo,
) -> Result<(), ImError> {
    if graph.is_empty() {
        return Err(ImError::EmptyGraph);
    }
    model.validate()?;
    mc.validate()
}

/// Runs `eval` once per trial on a freshly sampled world.
fn run_trials<T, F>(
    graph: &InfluenceGraph,
    model: &DiffusionModel,
    mc: &MonteCarlo,
    eval: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(&World, &mut ActivationState) -> T + Sync + Send,
{
    let n = graph.node_count();
    let trial = |(world, state): &mut (World, ActivationState), i: usize| {
        let mut rng = stream_rng(mc.seed, i as u64);
        world.resample(graph, model, &mut rng);
        eval(world, state)
    };

    #[cfg(feature = "parallel")]
    {
        (0..mc.trials)
            .into_par_iter()
            .map_init(|| (World::default(), ActivationState::new(n)), trial)
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut scratch = (World::default(), ActivationState::new(n));
        (0..mc.trials).map(|i| trial(&mut scratch, i)).collect()
    }
}

/// Estimates the spread of `seeds` under `model` with `mc.trials` trials.
///
/// Fails on an empty graph, seeds outside the graph, an invalid model
/// parameter or a zero trial count.
pub fn simulate_spread(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    model: &DiffusionModel,
    mc: &MonteCarlo,
) -> Result<SpreadEstimate, ImError> {
    check_inputs(graph, model, mc)?;
    graph.check_seeds(seeds)?;

    let counts = run_trials(graph, model, mc, |world, state| {
        world.spread(graph, model, seeds, state)
    });
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    Ok(SpreadEstimate {
        mean: total as f64 / mc.trials as f64,
        samples: counts.into_iter().map(|c| c as f64).collect(),
    })
}

/// Source of spread estimates for the greedy selectors.
pub trait SpreadOracle: Sync {
    fn node_count(&self) -> usize;

    /// Expected number of nodes reached from `seeds`.
    fn mean_spread(&self, seeds: &[NodeId]) -> Result<f64, ImError>;

    /// Expected spreads of several seed sets, estimated in one pass over the
    /// same sampled worlds. Counts as a single evaluation.
    fn mean_spread_batch(&self, seed_sets: &[Vec<NodeId>]) -> Result<Vec<f64>, ImError>;

    /// Number of oracle calls (single or batched) served so far.
    ///
    /// A batch is one call however many seed sets it holds, so this measures
    /// round trips, not simulation work; see [`SpreadOracle::seed_sets_evaluated`].
    fn evaluations(&self) -> usize;

    /// Number of seed sets estimated so far, counting each member of a batch.
    fn seed_sets_evaluated(&self) -> usize;
}

/// [`SpreadOracle`] backed by Monte Carlo diffusion trials.
///
/// Every estimate reuses the same base seed, so all candidates in a
/// selection run are compared on identical sampled worlds.
#[derive(Debug)]
pub struct MonteCarloOracle<'g> {
    graph: &'g InfluenceGraph,
    model: DiffusionModel,
    mc: MonteCarlo,
    evaluations: AtomicUsize,
    seed_sets: AtomicUsize,
}

impl<'g> MonteCarloOracle<'g> {
    pub fn new(
        graph: &'g InfluenceGraph,
        model: DiffusionModel,
        mc: MonteCarlo,
    ) -> Result<Self, ImError> {
        check_inputs(graph, &model, &mc)?;
        Ok(Self {
            graph,
            model,
            mc,
            evaluations: AtomicUsize::new(0),
            seed_sets: AtomicUsize::new(0),
        })
    }

    pub fn model(&self) -> &DiffusionModel {
        &self.model
    }

    pub fn monte_carlo(&self) -> &MonteCarlo {
        &self.mc
    }
}

impl SpreadOracle for MonteCarloOracle<'_> {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn mean_spread(&self, seeds: &[NodeId]) -> Result<f64, ImError> {
        self.graph.check_seeds(seeds)?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.seed_sets.fetch_add(1, Ordering::Relaxed);
        let counts = run_trials(self.graph, &self.model, &self.mc, |world, state| {
            world.spread(self.graph, &self.model, seeds, state)
        });
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        Ok(total as f64 / self.mc.trials as f64)
    }

    fn mean_spread_batch(&self, seed_sets: &[Vec<NodeId>]) -> Result<Vec<f64>, ImError> {
        for seeds in seed_sets {
            self.graph.check_seeds(seeds)?;
        }
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        self.seed_sets.fetch_add(seed_sets.len(), Ordering::Relaxed);
        let per_trial = run_trials(self.graph, &self.model, &self.mc, |world, state| {
            seed_sets
                .iter()
                .map(|seeds| world.spread(self.graph, &self.model, seeds, state) as u64)
                .collect::<SmallVec<[u64; 4]>>()
        });
        let mut totals = vec![0u64; seed_sets.len()];
        for counts in &per_trial {
            for (total, c) in totals.iter_mut().zip(counts) {
                *total += c;
            }
        }
        Ok(totals
            .into_iter()
            .map(|t| t as f64 / self.mc.trials as f64)
            .collect())
    }

    fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn seed_sets_evaluated(&self) -> usize {
        self.seed_sets.load(Ordering::Relaxed)
    }
}
