//! Top-level seed selection.
//!
//! [`select_seeds`] validates a [`SelectionConfig`] against the graph, handles
//! the degenerate budgets without simulating, dispatches to one selector and
//! finally evaluates the chosen seeds with a fresh Monte Carlo run on a stream
//! distinct from the one used during selection.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::celf::{celf, celf_plus_plus};
use crate::engine::deadline::Deadline;
use crate::engine::diffusion::DiffusionModel;
use crate::engine::errors::ImError;
use crate::engine::graph::{InfluenceGraph, NodeId};
use crate::engine::greedy::{greedy, GreedyOutcome};
use crate::engine::imm::{imm, ImmParams};
use crate::engine::imrank::{imrank, ImRankParams, RankOutcome};
use crate::engine::ris::{ris, SketchOutcome, DEFAULT_RR_SETS};
use crate::engine::rr_sets::RrSampler;
use crate::engine::spread::{
    MonteCarlo, MonteCarloOracle, SpreadOracle, DEFAULT_EVALUATION_TRIALS, DEFAULT_TRIALS,
};
use crate::metrics::{evaluate_seed_set, SpreadSummary};

/// Seed-selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Algorithm {
    /// Exhaustive greedy over Monte Carlo estimates.
    Greedy,
    Celf,
    CelfPlusPlus,
    /// Reverse Influence Sampling with a fixed pool.
    Ris,
    /// RIS with the IMM sample-size certificate.
    Imm,
    /// Top of the IMRank influence ranking; no simulation.
    #[cfg_attr(feature = "serde", serde(rename = "imrank"))]
    ImRank,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Greedy,
        Algorithm::Celf,
        Algorithm::CelfPlusPlus,
        Algorithm::Ris,
        Algorithm::Imm,
        Algorithm::ImRank,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::Celf => "celf",
            Algorithm::CelfPlusPlus => "celf++",
            Algorithm::Ris => "ris",
            Algorithm::Imm => "imm",
            Algorithm::ImRank => "imrank",
        }
    }

    /// True for selectors that query the Monte Carlo oracle.
    pub fn uses_oracle(&self) -> bool {
        matches!(self, Algorithm::Greedy | Algorithm::Celf | Algorithm::CelfPlusPlus)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ImError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Algorithm::Greedy),
            "celf" => Ok(Algorithm::Celf),
            "celf++" | "celfpp" | "celf_plus_plus" => Ok(Algorithm::CelfPlusPlus),
            "ris" => Ok(Algorithm::Ris),
            "imm" => Ok(Algorithm::Imm),
            "imrank" | "im_rank" => Ok(Algorithm::ImRank),
            _ => Err(ImError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Parameters of one selection call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SelectionConfig {
    /// Number of seeds `k`.
    pub budget: usize,
    pub model: DiffusionModel,
    /// Monte Carlo trials per spread estimate during selection.
    pub trials: usize,
    /// Monte Carlo trials for the final evaluation of the chosen seeds.
    pub evaluation_trials: usize,
    /// Base RNG seed. `None` draws one from the OS and reports it in the result.
    pub seed: Option<u64>,
    /// Live RR sets kept by RIS.
    pub rr_sets: usize,
    pub imm: ImmParams,
    pub imrank: ImRankParams,
    /// Wall-clock limit for selection plus evaluation.
    pub deadline: Option<Duration>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            budget: 1,
            model: DiffusionModel::default(),
            trials: DEFAULT_TRIALS,
            evaluation_trials: DEFAULT_EVALUATION_TRIALS,
            seed: None,
            rr_sets: DEFAULT_RR_SETS,
            imm: ImmParams::default(),
            imrank: ImRankParams::default(),
            deadline: None,
        }
    }
}

impl SelectionConfig {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: DiffusionModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_evaluation_trials(mut self, trials: usize) -> Self {
        self.evaluation_trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_rr_sets(mut self, rr_sets: usize) -> Self {
        self.rr_sets = rr_sets;
        self
    }

    pub fn with_imm(mut self, imm: ImmParams) -> Self {
        self.imm = imm;
        self
    }

    pub fn with_imrank(mut self, imrank: ImRankParams) -> Self {
        self.imrank = imrank;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Checks every parameter against `graph` before any simulation work.
    pub fn validate(&self, graph: &InfluenceGraph) -> Result<(), ImError> {
        let n = graph.node_count();
        if self.budget > n {
            return Err(ImError::InvalidConfig(format!(
                "budget {} exceeds node count {n}",
                self.budget
            )));
        }
        if self.trials == 0 {
            return Err(ImError::InvalidConfig("trials must be at least 1".into()));
        }
        if self.evaluation_trials == 0 {
            return Err(ImError::InvalidConfig(
                "evaluation_trials must be at least 1".into(),
            ));
        }
        if self.rr_sets == 0 {
            return Err(ImError::InvalidConfig("rr_sets must be at least 1".into()));
        }
        self.model.validate()?;
        self.imm.validate()?;
        self.imrank.validate()
    }
}

/// Outcome of one [`select_seeds`] call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionResult {
    pub algorithm: Algorithm,
    pub model: DiffusionModel,
    /// Seeds in selection order.
    pub seeds: Vec<NodeId>,
    /// Marginal gain of each seed as estimated by the selector.
    pub marginal_gains: Vec<f64>,
    /// Spread the selector estimated for its own seed set.
    pub estimated_spread: f64,
    /// Independent evaluation of the seed set.
    pub spread: SpreadSummary,
    /// Spread oracle calls (greedy family; 0 otherwise).
    pub oracle_evaluations: usize,
    /// RR sets drawn (RIS/IMM; 0 otherwise).
    pub rr_sets_generated: usize,
    /// Base seed actually used.
    pub seed: u64,
    pub elapsed: Duration,
}

/// Seeds plus estimates, before the common evaluation step.
struct Selected {
    seeds: Vec<NodeId>,
    marginal_gains: Vec<f64>,
    estimated_spread: f64,
    oracle_evaluations: usize,
    rr_sets_generated: usize,
}

impl Selected {
    /// `k` nodes in id order, each reaching only itself.
    fn trivial(k: usize) -> Self {
        Self {
            seeds: (0..k as u32).map(NodeId).collect(),
            marginal_gains: vec![1.0; k],
            estimated_spread: k as f64,
            oracle_evaluations: 0,
            rr_sets_generated: 0,
        }
    }

    fn from_oracle(outcome: GreedyOutcome, oracle: &impl SpreadOracle) -> Self {
        Self {
            seeds: outcome.seeds,
            marginal_gains: outcome.marginal_gains,
            estimated_spread: outcome.spread,
            oracle_evaluations: oracle.evaluations(),
            rr_sets_generated: 0,
        }
    }

    fn from_sketch(outcome: SketchOutcome) -> Self {
        Self {
            seeds: outcome.seeds,
            marginal_gains: outcome.marginal_gains,
            estimated_spread: outcome.spread,
            oracle_evaluations: 0,
            rr_sets_generated: outcome.rr_sets,
        }
    }

    fn from_rank(outcome: RankOutcome) -> Self {
        Self {
            seeds: outcome.seeds,
            marginal_gains: outcome.scores,
            estimated_spread: outcome.spread,
            oracle_evaluations: 0,
            rr_sets_generated: 0,
        }
    }
}

fn run_selector(
    graph: &InfluenceGraph,
    algorithm: Algorithm,
    config: &SelectionConfig,
    seed: u64,
    deadline: &Deadline,
) -> Result<Selected, ImError> {
    let k = config.budget;
    match algorithm {
        Algorithm::Greedy | Algorithm::Celf | Algorithm::CelfPlusPlus => {
            let oracle =
                MonteCarloOracle::new(graph, config.model, MonteCarlo::new(config.trials, seed))?;
            let outcome = match algorithm {
                Algorithm::Greedy => greedy(&oracle, k, deadline)?,
                Algorithm::Celf => celf(&oracle, k, deadline)?,
                _ => celf_plus_plus(&oracle, k, deadline)?,
            };
            Ok(Selected::from_oracle(outcome, &oracle))
        }
        Algorithm::Ris => {
            let sampler = RrSampler::new(graph, config.model, seed)?;
            Ok(Selected::from_sketch(ris(&sampler, k, config.rr_sets, deadline)?))
        }
        Algorithm::Imm => {
            let sampler = RrSampler::new(graph, config.model, seed)?;
            Ok(Selected::from_sketch(imm(&sampler, k, &config.imm, deadline)?))
        }
        Algorithm::ImRank => Ok(Selected::from_rank(imrank(
            graph,
            k,
            &config.imrank,
            deadline,
        )?)),
    }
}

/// Selects `config.budget` seeds with `algorithm` and evaluates them.
///
/// Degenerate inputs are answered without simulation: `k = 0` gives no seeds
/// and spread 0, `k = n` gives every node and spread `n`, and a graph without
/// edges gives the first `k` node ids and spread `k`.
pub fn select_seeds(
    graph: &InfluenceGraph,
    algorithm: Algorithm,
    config: &SelectionConfig,
) -> Result<SelectionResult, ImError> {
    config.validate(graph)?;
    let deadline = Deadline::start(config.deadline);
    let seed = config.seed.unwrap_or_else(rand::random);
    let k = config.budget;
    let n = graph.node_count();

    if let DiffusionModel::LinearThreshold { .. } = config.model {
        let max_in = graph.max_in_weight_sum();
        if max_in > 1.0 + 1e-9 {
            warn!(max_in, "LT in-weight sum exceeds 1; thresholds above it are never reached");
        }
    }

    let degenerate = k == 0 || k == n || graph.edge_count() == 0;
    let (selected, spread) = if degenerate {
        (Selected::trivial(k), SpreadSummary::exact(k as f64, 0))
    } else {
        let selected = run_selector(graph, algorithm, config, seed, &deadline)?;
        deadline.check()?;
        let spread = evaluate_seed_set(
            graph,
            &selected.seeds,
            &config.model,
            config.evaluation_trials,
            seed.wrapping_add(1),
        )?;
        (selected, spread)
    };

    let result = SelectionResult {
        algorithm,
        model: config.model,
        seeds: selected.seeds,
        marginal_gains: selected.marginal_gains,
        estimated_spread: selected.estimated_spread,
        spread,
        oracle_evaluations: selected.oracle_evaluations,
        rr_sets_generated: selected.rr_sets_generated,
        seed,
        elapsed: deadline.elapsed(),
    };
    info!(
        algorithm = %algorithm,
        model = %config.model,
        k,
        spread = result.spread.mean,
        stdev = result.spread.stdev,
        oracle_evaluations = result.oracle_evaluations,
        rr_sets = result.rr_sets_generated,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "selection finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: u32, p: f64) -> InfluenceGraph {
        InfluenceGraph::from_edges(n, (0..n - 1).flat_map(|i| [(i, i + 1, p), (i + 1, i, p)]))
            .unwrap()
    }

    #[test]
    fn parses_algorithm_names() {
        assert_eq!("CELF++".parse::<Algorithm>().unwrap(), Algorithm::CelfPlusPlus);
        assert_eq!("celfpp".parse::<Algorithm>().unwrap(), Algorithm::CelfPlusPlus);
        assert_eq!(" imm".parse::<Algorithm>().unwrap(), Algorithm::Imm);
        assert_eq!("IMRank".parse::<Algorithm>().unwrap(), Algorithm::ImRank);
        for a in Algorithm::ALL {
            assert_eq!(a.name().parse::<Algorithm>().unwrap(), a);
        }
        assert!(matches!(
            "pagerank".parse::<Algorithm>(),
            Err(ImError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn validation_runs_before_any_work() {
        let g = path(4, 0.5);
        let cfg = SelectionConfig::new(5);
        assert!(matches!(
            select_seeds(&g, Algorithm::Celf, &cfg),
            Err(ImError::InvalidConfig(_))
        ));
        let cfg = SelectionConfig::new(2).with_trials(0);
        assert!(cfg.validate(&g).is_err());
        let cfg = SelectionConfig::new(2).with_model(DiffusionModel::susceptible_infected(2.0));
        assert!(cfg.validate(&g).is_err());
    }

    #[test]
    fn degenerate_budgets_skip_simulation() {
        let g = path(4, 0.5);
        let none = select_seeds(&g, Algorithm::Greedy, &SelectionConfig::new(0)).unwrap();
        assert!(none.seeds.is_empty());
        assert_eq!(none.spread.mean, 0.0);

        let all = select_seeds(&g, Algorithm::Imm, &SelectionConfig::new(4)).unwrap();
        assert_eq!(all.seeds, (0..4).map(NodeId).collect::<Vec<_>>());
        assert_eq!(all.spread.mean, 4.0);
        assert_eq!(all.oracle_evaluations + all.rr_sets_generated, 0);

        let edgeless = InfluenceGraph::from_edges(6, std::iter::empty()).unwrap();
        let r = select_seeds(&edgeless, Algorithm::Celf, &SelectionConfig::new(2)).unwrap();
        assert_eq!(r.seeds, vec![NodeId(0), NodeId(1)]);
        assert_eq!(r.spread.mean, 2.0);
    }

    #[test]
    fn imrank_selects_without_simulating() {
        let g = InfluenceGraph::from_edges(8, (1..8).map(|leaf| (0, leaf, 0.4))).unwrap();
        let cfg = SelectionConfig::new(1).with_evaluation_trials(100).with_seed(5);
        let r = select_seeds(&g, Algorithm::ImRank, &cfg).unwrap();
        assert_eq!(r.seeds, vec![NodeId(0)]);
        assert_eq!(r.oracle_evaluations + r.rr_sets_generated, 0);
        assert_eq!(r.spread.trials, 100);

        let bad = cfg.with_imrank(ImRankParams { max_iterations: 0 });
        assert!(matches!(
            select_seeds(&g, Algorithm::ImRank, &bad),
            Err(ImError::InvalidConfig(_))
        ));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let g = path(8, 0.4);
        let cfg = SelectionConfig::new(2)
            .with_trials(50)
            .with_evaluation_trials(200)
            .with_seed(42);
        let a = select_seeds(&g, Algorithm::CelfPlusPlus, &cfg).unwrap();
        let b = select_seeds(&g, Algorithm::CelfPlusPlus, &cfg).unwrap();
        assert_eq!(a.seeds, b.seeds);
        assert_eq!(a.spread, b.spread);
        assert_eq!(a.seed, 42);
        assert_eq!(a.spread.trials, 200);
    }

    #[test]
    fn expired_deadline_returns_no_seeds() {
        let g = path(30, 0.5);
        let cfg = SelectionConfig::new(3).with_seed(1).with_deadline(Duration::ZERO);
        assert!(matches!(
            select_seeds(&g, Algorithm::Greedy, &cfg),
            Err(ImError::DeadlineExceeded { .. })
        ));
    }
}
