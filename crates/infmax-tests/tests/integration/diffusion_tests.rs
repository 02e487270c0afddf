//! Monte Carlo oracle behaviour across models.

use infmax_core::engine::diffusion::simulate_trial;
use infmax_core::engine::spread::stream_rng;
use infmax_core::{simulate_spread, DiffusionModel, ImError, MonteCarlo, NodeId};
use infmax_tests::{path_graph, random_graph, random_lt_graph, star_graph};

#[test]
fn identical_seed_gives_identical_samples() {
    let g = random_graph(40, 0.1, 0.5, 3);
    for model in [
        DiffusionModel::independent_cascade(),
        DiffusionModel::linear_threshold(),
        DiffusionModel::susceptible_infected(0.3),
    ] {
        let mc = MonteCarlo::new(120, 99);
        let a = simulate_spread(&g, &[NodeId(0), NodeId(7)], &model, &mc).unwrap();
        let b = simulate_spread(&g, &[NodeId(0), NodeId(7)], &model, &mc).unwrap();
        assert_eq!(a, b, "{model}");
    }
}

#[test]
fn single_trial_uses_the_callers_rng() {
    let g = path_graph(10, 0.5);
    let model = DiffusionModel::independent_cascade();
    let mut r1 = stream_rng(5, 0);
    let mut r2 = stream_rng(5, 0);
    let a: Vec<usize> = (0..20)
        .map(|_| simulate_trial(&g, &[NodeId(4)], &model, &mut r1).unwrap())
        .collect();
    let b: Vec<usize> = (0..20)
        .map(|_| simulate_trial(&g, &[NodeId(4)], &model, &mut r2).unwrap())
        .collect();
    assert_eq!(a, b);
    assert!(a.iter().any(|&x| x != a[0]), "trials should vary: {a:?}");
}

#[test]
fn ic_star_spread_matches_expectation() {
    // hub reaches each of 20 leaves with probability 0.5: mean 11
    let g = star_graph(20, 0.5);
    let est = simulate_spread(
        &g,
        &[NodeId(0)],
        &DiffusionModel::independent_cascade(),
        &MonteCarlo::new(4000, 1),
    )
    .unwrap();
    assert!((est.mean - 11.0).abs() < 0.3, "{}", est.mean);
    let summary = est.summary();
    // binomial stdev sqrt(20 * 0.25) ~ 2.24
    assert!((summary.stdev - 5f64.sqrt()).abs() < 0.2, "{}", summary.stdev);
}

#[test]
fn lt_single_in_edge_activates_with_its_weight() {
    // 0 -> 1 with weight 0.3: threshold U(0, 1] is met with probability 0.3
    let g = infmax_core::InfluenceGraph::from_edges(2, [(0, 1, 0.3)]).unwrap();
    let est = simulate_spread(
        &g,
        &[NodeId(0)],
        &DiffusionModel::linear_threshold(),
        &MonteCarlo::new(5000, 2),
    )
    .unwrap();
    assert!((est.mean - 1.3).abs() < 0.03, "{}", est.mean);
}

#[test]
fn si_grows_with_beta_and_steps() {
    let g = random_lt_graph(60, 0.08, 4);
    let seeds = [NodeId(1), NodeId(2)];
    let mc = MonteCarlo::new(300, 8);
    let spread = |beta: f64, steps: usize| {
        let model = DiffusionModel::SusceptibleInfected { beta, steps };
        simulate_spread(&g, &seeds, &model, &mc).unwrap().mean
    };
    assert!(spread(0.1, 5) <= spread(0.5, 5));
    assert!(spread(0.3, 2) <= spread(0.3, 6));
    assert_eq!(spread(0.0, 5), 2.0);
}

#[test]
fn bad_inputs_fail_before_simulating() {
    let g = path_graph(3, 0.5);
    let ic = DiffusionModel::independent_cascade();
    assert!(matches!(
        simulate_spread(&g, &[NodeId(3)], &ic, &MonteCarlo::default()),
        Err(ImError::UnknownNode(NodeId(3)))
    ));
    assert!(matches!(
        simulate_spread(
            &g,
            &[NodeId(0)],
            &DiffusionModel::susceptible_infected(-0.1),
            &MonteCarlo::default()
        ),
        Err(ImError::InvalidConfig(_))
    ));
    assert!(matches!(
        infmax_core::InfluenceGraph::from_edges(2, [(0, 1, f64::NAN)]),
        Err(ImError::InvalidProbability { .. })
    ));
}
