//! Property tests for spread bounds, monotonicity and selector agreement.

use infmax_core::engine::celf::{celf, celf_plus_plus};
use infmax_core::engine::deadline::Deadline;
use infmax_core::engine::greedy::greedy;
use infmax_core::engine::rr_sets::RrSampler;
use infmax_core::engine::spread::MonteCarloOracle;
use infmax_core::{
    select_seeds, simulate_spread, Algorithm, DiffusionModel, InfluenceGraph, MonteCarlo, NodeId,
    SelectionConfig,
};
use infmax_tests::all_distinct;
use proptest::prelude::*;

fn arb_graph() -> impl Strategy<Value = InfluenceGraph> {
    (3u32..14).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n, 0.0f64..=1.0), 1..40).prop_map(move |edges| {
            InfluenceGraph::from_edges(n, edges.into_iter().filter(|(s, d, _)| s != d))
                .expect("generated probabilities are valid")
        })
    })
}

fn arb_model() -> impl Strategy<Value = DiffusionModel> {
    prop_oneof![
        (1usize..6).prop_map(|r| DiffusionModel::independent_cascade().with_horizon(r)),
        (1usize..6).prop_map(|r| DiffusionModel::linear_threshold().with_horizon(r)),
        (0.0f64..=1.0, 1usize..6).prop_map(|(beta, steps)| DiffusionModel::SusceptibleInfected { beta, steps }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn spread_lies_between_seed_count_and_node_count(
        g in arb_graph(),
        model in arb_model(),
        picks in prop::collection::vec(0u32..3, 1..4),
        seed in any::<u64>(),
    ) {
        let seeds: Vec<NodeId> = picks.into_iter().map(NodeId).collect();
        let mut distinct = seeds.clone();
        distinct.sort();
        distinct.dedup();
        let est = simulate_spread(&g, &seeds, &model, &MonteCarlo::new(20, seed)).unwrap();
        for s in &est.samples {
            prop_assert!(*s >= distinct.len() as f64 && *s <= g.node_count() as f64);
        }
    }

    #[test]
    fn adding_a_seed_never_lowers_the_estimate(
        g in arb_graph(),
        model in arb_model(),
        seed in any::<u64>(),
    ) {
        // same worlds for both seed sets, so the comparison holds trial by trial
        let mc = MonteCarlo::new(16, seed);
        let small = simulate_spread(&g, &[NodeId(0)], &model, &mc).unwrap();
        let large = simulate_spread(&g, &[NodeId(0), NodeId(2)], &model, &mc).unwrap();
        for (a, b) in small.samples.iter().zip(&large.samples) {
            prop_assert!(b >= a);
        }
    }

    #[test]
    fn lazy_selectors_agree_with_greedy_under_ic(
        g in arb_graph(),
        k in 1usize..4,
        seed in any::<u64>(),
    ) {
        let k = k.min(g.node_count());
        let model = DiffusionModel::independent_cascade();
        let d = Deadline::unbounded();
        let make = || MonteCarloOracle::new(&g, model, MonteCarlo::new(32, seed)).unwrap();
        let plain = greedy(&make(), k, &d).unwrap();
        let lazy = celf(&make(), k, &d).unwrap();
        let lazier = celf_plus_plus(&make(), k, &d).unwrap();
        prop_assert_eq!(&plain.seeds, &lazy.seeds);
        prop_assert_eq!(&plain.seeds, &lazier.seeds);
    }

    #[test]
    fn rr_sets_start_at_their_root_and_stay_in_range(
        g in arb_graph(),
        model in arb_model(),
        seed in any::<u64>(),
    ) {
        let sampler = RrSampler::new(&g, model, seed).unwrap();
        for set in sampler.sample_streams(0..30) {
            prop_assert!(!set.is_empty());
            prop_assert!(all_distinct(&set));
            prop_assert!(set.iter().all(|v| g.contains(*v)));
        }
    }

    #[test]
    fn every_selector_returns_k_distinct_seeds(
        g in arb_graph(),
        k in 0usize..4,
        seed in any::<u64>(),
    ) {
        let k = k.min(g.node_count());
        let cfg = SelectionConfig::new(k)
            .with_trials(8)
            .with_evaluation_trials(8)
            .with_rr_sets(50)
            .with_seed(seed);
        for algorithm in Algorithm::ALL {
            let result = select_seeds(&g, algorithm, &cfg).unwrap();
            prop_assert_eq!(result.seeds.len(), k);
            prop_assert!(all_distinct(&result.seeds));
            prop_assert!(result.spread.mean >= k as f64 - 1e-9);
        }
    }
}
