//! RR-set sampling, RIS and IMM.

use infmax_core::engine::deadline::Deadline;
use infmax_core::engine::imm::imm;
use infmax_core::engine::ris::ris;
use infmax_core::engine::rr_sets::{generate_rr_set, RrPool, RrSampler};
use infmax_core::engine::spread::stream_rng;
use infmax_core::{
    select_seeds, simulate_spread, Algorithm, DiffusionModel, ImmParams, MonteCarlo, NodeId,
    SelectionConfig,
};
use infmax_tests::{all_distinct, random_graph, random_lt_graph, star_graph, twin_hub_graph};

fn models() -> [DiffusionModel; 3] {
    [
        DiffusionModel::independent_cascade(),
        DiffusionModel::linear_threshold(),
        DiffusionModel::susceptible_infected(0.5),
    ]
}

#[test]
fn star_hub_is_selected_by_sketches() {
    let g = star_graph(10, 0.6);
    for model in models() {
        let cfg = SelectionConfig::new(1)
            .with_model(model)
            .with_rr_sets(400)
            .with_evaluation_trials(200)
            .with_seed(12);
        for algorithm in [Algorithm::Ris, Algorithm::Imm] {
            let result = select_seeds(&g, algorithm, &cfg).unwrap();
            assert_eq!(result.seeds, vec![NodeId(0)], "{algorithm} {model}");
            assert!(result.rr_sets_generated > 0);
            assert_eq!(result.oracle_evaluations, 0);
        }
    }
}

#[test]
fn overlapping_hubs_are_not_both_selected() {
    let g = twin_hub_graph();
    let cfg = SelectionConfig::new(2)
        .with_trials(16)
        .with_evaluation_trials(50)
        .with_rr_sets(2000)
        .with_seed(3);
    for algorithm in Algorithm::ALL {
        let result = select_seeds(&g, algorithm, &cfg).unwrap();
        assert!(result.seeds.contains(&NodeId(22)), "{algorithm}: {:?}", result.seeds);
        assert_eq!(result.spread.mean, 30.0, "{algorithm}: {:?}", result.seeds);
    }
}

#[test]
fn rr_hit_rate_estimates_spread() {
    // n * Pr[seed set hits a random RR set] is the expected spread
    let g = random_lt_graph(40, 0.08, 21);
    let seeds = [NodeId(3), NodeId(17)];
    for model in models() {
        let mut rng = stream_rng(4, 0);
        let draws = 20_000;
        let hits = (0..draws)
            .filter(|_| {
                let set = generate_rr_set(&g, &model, &mut rng).unwrap();
                set.iter().any(|v| seeds.contains(v))
            })
            .count();
        let sketch = 40.0 * hits as f64 / draws as f64;
        let forward = simulate_spread(&g, &seeds, &model, &MonteCarlo::new(6000, 5))
            .unwrap()
            .mean;
        assert!(
            (sketch - forward).abs() < 0.06 * forward + 0.3,
            "{model}: sketch {sketch} vs forward {forward}"
        );
    }
}

#[test]
fn pool_coverage_counts_match_set_membership() {
    let g = random_graph(25, 0.1, 0.7, 2);
    let sampler = RrSampler::new(&g, DiffusionModel::independent_cascade(), 6).unwrap();
    let sets = sampler.sample_streams(0..300);
    let mut pool = RrPool::new(g.node_count());
    for set in &sets {
        pool.push(set.clone()).unwrap();
    }
    for v in g.nodes() {
        let expected = sets.iter().filter(|s| s.contains(&v)).count();
        assert_eq!(pool.coverage(v), expected);
    }

    let (best, hits) = pool.best_node(&vec![false; g.node_count()]).unwrap();
    assert_eq!(pool.cover(best), hits);
    assert_eq!(pool.live_len(), 300 - hits);
    assert_eq!(pool.coverage(best), 0);
}

#[test]
fn ris_and_imm_return_distinct_seeds() {
    let g = random_graph(60, 0.05, 0.5, 8);
    let sampler = RrSampler::new(&g, DiffusionModel::independent_cascade(), 1).unwrap();
    let d = Deadline::unbounded();
    let r = ris(&sampler, 8, 500, &d).unwrap();
    let i = imm(&sampler, 8, &ImmParams::default(), &d).unwrap();
    for out in [&r, &i] {
        assert_eq!(out.seeds.len(), 8);
        assert!(all_distinct(&out.seeds));
    }
    // IMM covers one fixed pool greedily, so its coverage gains cannot grow
    for w in i.marginal_gains.windows(2) {
        assert!(w[0] >= w[1], "{:?}", i.marginal_gains);
    }
}

#[test]
fn imm_tightens_with_smaller_epsilon() {
    let g = random_graph(50, 0.06, 0.4, 13);
    let sampler = RrSampler::new(&g, DiffusionModel::independent_cascade(), 2).unwrap();
    let d = Deadline::unbounded();
    let loose = imm(&sampler, 3, &ImmParams::default(), &d).unwrap();
    let tight = imm(&sampler, 3, &ImmParams { epsilon: 0.2, ..ImmParams::default() }, &d).unwrap();
    assert!(tight.rr_sets > loose.rr_sets);
}
