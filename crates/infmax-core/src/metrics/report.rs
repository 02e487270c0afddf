//! Side-by-side comparison of several selectors on one graph.
//!
//! Every selector runs with the same configuration and base seed, so the
//! evaluation step scores all seed sets on identical Monte Carlo worlds.

use std::fmt;
use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::engine::diffusion::DiffusionModel;
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};
use crate::engine::selection::{select_seeds, Algorithm, SelectionConfig, SelectionResult};
use crate::metrics::SpreadSummary;

/// One selector's line in a [`ComparisonReport`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonRow {
    pub algorithm: Algorithm,
    pub seeds: Vec<NodeId>,
    pub spread: SpreadSummary,
    pub oracle_evaluations: usize,
    pub rr_sets_generated: usize,
    pub elapsed: Duration,
    /// Fraction of this row's seeds also chosen by the top row.
    pub overlap_with_best: f64,
}

impl From<SelectionResult> for ComparisonRow {
    fn from(r: SelectionResult) -> Self {
        Self {
            algorithm: r.algorithm,
            seeds: r.seeds,
            spread: r.spread,
            oracle_evaluations: r.oracle_evaluations,
            rr_sets_generated: r.rr_sets_generated,
            elapsed: r.elapsed,
            overlap_with_best: 1.0,
        }
    }
}

/// Selector results sorted by descending mean spread.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonReport {
    pub model: DiffusionModel,
    pub budget: usize,
    pub seed: u64,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonReport {
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }
}

fn overlap(reference: &FxHashSet<NodeId>, seeds: &[NodeId]) -> f64 {
    if seeds.is_empty() {
        return 1.0;
    }
    let shared = seeds.iter().filter(|s| reference.contains(s)).count();
    shared as f64 / seeds.len() as f64
}

/// Runs every selector in `algorithms` with `config` and ranks the results.
///
/// A missing `config.seed` is drawn once and shared by all runs. Rows with
/// equal mean spread keep the order of `algorithms`.
pub fn compare_algorithms(
    graph: &InfluenceGraph,
    algorithms: &[Algorithm],
    config: &SelectionConfig,
) -> Result<ComparisonReport, ImError> {
    if algorithms.is_empty() {
        return Err(ImError::InvalidConfig("no algorithms to compare".into()));
    }
    config.validate(graph)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let shared = config.clone().with_seed(seed);

    let mut rows = algorithms
        .iter()
        .map(|&a| select_seeds(graph, a, &shared).map(ComparisonRow::from))
        .collect::<Result<Vec<_>, _>>()?;
    // stable sort keeps caller order on ties
    rows.sort_by(|a, b| b.spread.mean.total_cmp(&a.spread.mean));

    let reference: FxHashSet<NodeId> = rows[0].seeds.iter().copied().collect();
    for row in &mut rows {
        row.overlap_with_best = overlap(&reference, &row.seeds);
    }

    Ok(ComparisonReport {
        model: config.model,
        budget: config.budget,
        seed,
        rows,
    })
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "model {}  budget {}  seed {}",
            self.model, self.budget, self.seed
        )?;
        writeln!(
            f,
            "{:<8} {:>10} {:>9} {:>8} {:>10} {:>10} {:>8}  seeds",
            "algo", "spread", "stdev", "overlap", "oracle", "rr_sets", "ms"
        )?;
        for row in &self.rows {
            let seeds = row
                .seeds
                .iter()
                .map(|s| s.0.to_string())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(
                f,
                "{:<8} {:>10.3} {:>9.3} {:>8.2} {:>10} {:>10} {:>8}  [{}]",
                row.algorithm.name(),
                row.spread.mean,
                row.spread.stdev,
                row.overlap_with_best,
                row.oracle_evaluations,
                row.rr_sets_generated,
                row.elapsed.as_millis(),
                seeds
            )?;
        }
        Ok(())
    }
}
