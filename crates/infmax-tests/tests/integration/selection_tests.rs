//! Oracle-driven selectors and the top-level selection contract.

use infmax_core::engine::celf::{celf, celf_plus_plus};
use infmax_core::engine::deadline::Deadline;
use infmax_core::engine::greedy::greedy;
use infmax_core::engine::spread::{MonteCarloOracle, SpreadOracle};
use infmax_core::{
    select_seeds, Algorithm, DiffusionModel, ImError, InfluenceGraph, MonteCarlo, NodeId,
    SelectionConfig,
};
use infmax_tests::{all_distinct, path_graph, random_graph, star_graph};

fn oracle(g: &InfluenceGraph, model: DiffusionModel, trials: usize, seed: u64) -> MonteCarloOracle<'_> {
    MonteCarloOracle::new(g, model, MonteCarlo::new(trials, seed)).unwrap()
}

#[test]
fn central_node_of_a_six_node_path() {
    let g = path_graph(6, 0.9);
    let cfg = SelectionConfig::new(1)
        .with_trials(500)
        .with_evaluation_trials(1000)
        .with_seed(2024);
    for algorithm in [Algorithm::Greedy, Algorithm::Celf, Algorithm::CelfPlusPlus] {
        let result = select_seeds(&g, algorithm, &cfg).unwrap();
        assert!(
            result.seeds == [NodeId(2)] || result.seeds == [NodeId(3)],
            "{algorithm}: {:?}",
            result.seeds
        );
        assert!(result.spread.mean > 3.5, "{algorithm}: {}", result.spread.mean);
        assert_eq!(result.spread.trials, 1000);
    }
}

#[test]
fn celf_matches_greedy_on_small_graphs() {
    // power-of-two trial counts keep every mean exact in binary
    for seed in 0..4 {
        let g = random_graph(18, 0.15, 0.6, seed);
        for model in [
            DiffusionModel::independent_cascade(),
            DiffusionModel::susceptible_infected(0.4),
        ] {
            let d = Deadline::unbounded();
            let plain = greedy(&oracle(&g, model, 64, seed), 3, &d).unwrap();
            let lazy = celf(&oracle(&g, model, 64, seed), 3, &d).unwrap();
            assert_eq!(plain.seeds, lazy.seeds, "seed {seed} {model}");
            assert!((plain.spread - lazy.spread).abs() < 1e-9);
        }
    }
}

#[test]
fn celf_plus_plus_saves_oracle_calls_without_changing_seeds() {
    for seed in 0..4 {
        let g = random_graph(20, 0.12, 0.5, 100 + seed);
        let model = DiffusionModel::independent_cascade();
        let d = Deadline::unbounded();
        let lazy_oracle = oracle(&g, model, 64, seed);
        let lazier_oracle = oracle(&g, model, 64, seed);
        let lazy = celf(&lazy_oracle, 5, &d).unwrap();
        let lazier = celf_plus_plus(&lazier_oracle, 5, &d).unwrap();
        assert_eq!(lazy.seeds, lazier.seeds, "seed {seed}");
        assert!(
            lazier_oracle.evaluations() <= lazy_oracle.evaluations(),
            "celf++ {} > celf {}",
            lazier_oracle.evaluations(),
            lazy_oracle.evaluations()
        );
        // paired estimates are cheaper calls, not less simulation
        assert_eq!(lazy_oracle.seed_sets_evaluated(), lazy_oracle.evaluations());
        assert!(lazier_oracle.seed_sets_evaluated() >= lazier_oracle.evaluations());
    }
}

#[test]
fn lazy_selectors_beat_greedy_on_evaluations() {
    let g = random_graph(30, 0.1, 0.4, 9);
    let cfg = SelectionConfig::new(4)
        .with_trials(32)
        .with_evaluation_trials(64)
        .with_seed(1);
    let plain = select_seeds(&g, Algorithm::Greedy, &cfg).unwrap();
    let lazy = select_seeds(&g, Algorithm::Celf, &cfg).unwrap();
    // greedy: 30 + 29 + 28 + 27
    assert_eq!(plain.oracle_evaluations, 114);
    assert!(lazy.oracle_evaluations < plain.oracle_evaluations);
}

#[test]
fn marginal_gains_never_increase() {
    let g = random_graph(25, 0.15, 0.5, 77);
    let cfg = SelectionConfig::new(6)
        .with_trials(64)
        .with_evaluation_trials(64)
        .with_seed(3);
    for algorithm in [Algorithm::Greedy, Algorithm::Celf, Algorithm::CelfPlusPlus] {
        let result = select_seeds(&g, algorithm, &cfg).unwrap();
        assert_eq!(result.marginal_gains.len(), 6);
        for w in result.marginal_gains.windows(2) {
            assert!(w[0] >= w[1], "{algorithm}: {:?}", result.marginal_gains);
        }
        let total: f64 = result.marginal_gains.iter().sum();
        assert!((total - result.estimated_spread).abs() < 1e-9);
    }
}

#[test]
fn budget_boundaries_for_every_algorithm() {
    let g = star_graph(5, 0.5);
    for algorithm in Algorithm::ALL {
        let none = select_seeds(&g, algorithm, &SelectionConfig::new(0)).unwrap();
        assert!(none.seeds.is_empty());
        assert_eq!(none.spread.mean, 0.0);

        let all = select_seeds(&g, algorithm, &SelectionConfig::new(6)).unwrap();
        assert_eq!(all.seeds.len(), 6);
        assert!(all_distinct(&all.seeds));
        assert_eq!(all.spread.mean, 6.0);

        assert!(matches!(
            select_seeds(&g, algorithm, &SelectionConfig::new(7)),
            Err(ImError::InvalidConfig(_))
        ));
    }
}

#[test]
fn results_are_reproducible_under_a_fixed_seed() {
    let g = random_graph(30, 0.1, 0.5, 5);
    let cfg = SelectionConfig::new(3)
        .with_model(DiffusionModel::linear_threshold())
        .with_trials(40)
        .with_evaluation_trials(100)
        .with_seed(8);
    for algorithm in Algorithm::ALL {
        let a = select_seeds(&g, algorithm, &cfg).unwrap();
        let b = select_seeds(&g, algorithm, &cfg).unwrap();
        assert_eq!(a.seeds, b.seeds, "{algorithm}");
        assert_eq!(a.spread, b.spread, "{algorithm}");
        assert_eq!(a.marginal_gains, b.marginal_gains, "{algorithm}");
    }
}

#[test]
fn unseeded_runs_report_the_seed_they_used() {
    let g = path_graph(8, 0.3);
    let cfg = SelectionConfig::new(2).with_trials(20).with_evaluation_trials(50);
    let first = select_seeds(&g, Algorithm::Celf, &cfg).unwrap();
    let replay = select_seeds(&g, Algorithm::Celf, &cfg.clone().with_seed(first.seed)).unwrap();
    assert_eq!(first.seeds, replay.seeds);
    assert_eq!(first.spread, replay.spread);
}
