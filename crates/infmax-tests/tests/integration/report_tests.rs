//! Comparison report and serialized output.

use infmax_core::{compare_algorithms, select_seeds, Algorithm, DiffusionModel, SelectionConfig};
use infmax_tests::{path_graph, random_graph};

#[test]
fn comparison_rows_are_sorted_by_spread() {
    let g = random_graph(40, 0.08, 0.5, 31);
    let cfg = SelectionConfig::new(3)
        .with_trials(32)
        .with_evaluation_trials(300)
        .with_rr_sets(500)
        .with_seed(6);
    let report = compare_algorithms(&g, &Algorithm::ALL, &cfg).unwrap();
    assert_eq!(report.rows.len(), Algorithm::ALL.len());
    for w in report.rows.windows(2) {
        assert!(w[0].spread.mean >= w[1].spread.mean);
    }
    assert_eq!(report.best().unwrap().overlap_with_best, 1.0);
    for row in &report.rows {
        assert_eq!(row.seeds.len(), 3);
        assert!((0.0..=1.0).contains(&row.overlap_with_best));
    }
}

#[test]
fn results_serialize_to_json() {
    let g = path_graph(6, 0.5);
    let cfg = SelectionConfig::new(2)
        .with_model(DiffusionModel::susceptible_infected(0.3))
        .with_trials(16)
        .with_evaluation_trials(32)
        .with_seed(1);
    let result = select_seeds(&g, Algorithm::CelfPlusPlus, &cfg).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["algorithm"], "celf_plus_plus");
    assert_eq!(json["model"]["kind"], "susceptible_infected");
    assert_eq!(json["seeds"].as_array().unwrap().len(), 2);
    assert_eq!(json["spread"]["trials"], 32);

    let cfg_json = serde_json::to_string(&cfg).unwrap();
    let back: SelectionConfig = serde_json::from_str(&cfg_json).unwrap();
    assert_eq!(back, cfg);
}
