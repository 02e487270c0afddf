//! Spread statistics and selector comparison reports.
//!
//! - [`SpreadSummary`]: mean, sample standard deviation and range of Monte
//!   Carlo spread samples
//! - [`evaluate_seed_set`]: the standard post-selection evaluation (many
//!   trials on a stream independent of the one used during selection)
//! - [`report`]: runs several selectors on one graph and tabulates the results
//!
//! Notes:
//! - Numeric stability: Kahan summation for means and squared deviations.
//! - Deterministic evaluation: identical inputs and seed give identical summaries.

pub mod report;

use crate::engine::diffusion::DiffusionModel;
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};
use crate::engine::spread::{simulate_spread, MonteCarlo};

/// Mean ± stdev of a spread estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpreadSummary {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); 0 for fewer than two samples.
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub trials: usize,
}

impl SpreadSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len();
        let mean = kahan_sum(samples.iter().copied()) / n as f64;
        let stdev = if n > 1 {
            let ss = kahan_sum(samples.iter().map(|x| (x - mean) * (x - mean)));
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        Self {
            mean,
            stdev,
            min,
            max,
            trials: n,
        }
    }

    /// Summary of a spread known without simulation (every trial equals `value`).
    pub fn exact(value: f64, trials: usize) -> Self {
        Self {
            mean: value,
            stdev: 0.0,
            min: value,
            max: value,
            trials,
        }
    }
}

/// Kahan compensated summation.
pub fn kahan_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0f64;
    let mut c = 0.0f64; // running compensation for lost low-order bits
    for term in values {
        let y = term - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

/// Evaluates a finished seed set with `trials` fresh Monte Carlo trials.
pub fn evaluate_seed_set(
    graph: &InfluenceGraph,
    seeds: &[NodeId],
    model: &DiffusionModel,
    trials: usize,
    seed: u64,
) -> Result<SpreadSummary, ImError> {
    let estimate = simulate_spread(graph, seeds, model, &MonteCarlo::new(trials, seed))?;
    Ok(estimate.summary())
}
