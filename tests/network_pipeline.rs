//! Integration tests for the per-category co-occurrence network pipeline.

use approx::assert_relative_eq;
use cooccur_net::prelude::*;
use proptest::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const TAXA: [&str; 5] = ["alpha", "beta", "gamma", "delta", "filler"];

/// Counts for three environments, every sample totalling 1000.
///
/// - gut (12 samples): alpha and beta rise in lockstep, gamma follows alpha
///   with adjacent pairs swapped (rho = 0.958), delta is constant and filler
///   absorbs the remainder, so it falls as the others rise.
/// - soil (4 samples): every organism constant, nothing can correlate.
/// - air (2 samples): too few samples to test.
fn create_synthetic_counts() -> CountMatrix {
    let swapped = [1u64, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10];
    let mut rows: Vec<Vec<u64>> = vec![Vec::new(); 5];

    for k in 0..12u64 {
        let alpha = 10 + k;
        let beta = 20 + k;
        let gamma = 10 + swapped[k as usize];
        let delta = 50;
        let filler = 1000 - alpha - beta - gamma - delta;
        for (row, value) in rows.iter_mut().zip([alpha, beta, gamma, delta, filler]) {
            row.push(value);
        }
    }
    for _ in 0..4 {
        for (row, value) in rows.iter_mut().zip([10, 20, 30, 50, 890]) {
            row.push(value);
        }
    }
    for (row, values) in rows.iter_mut().zip([[5, 9], [7, 3], [1, 1], [2, 8], [985, 979]]) {
        row.extend(values);
    }

    CountMatrix::from_rows(
        &rows,
        TAXA.iter().map(|s| s.to_string()).collect(),
        sample_ids(),
    )
    .unwrap()
}

fn sample_ids() -> Vec<String> {
    (0..18).map(|j| format!("S{:02}", j)).collect()
}

fn environment(j: usize) -> &'static str {
    match j {
        0..=11 => "gut",
        12..=15 => "soil",
        _ => "air",
    }
}

fn create_metadata_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sample_id\tenvironment\tdepth").unwrap();
    for (j, id) in sample_ids().iter().enumerate() {
        writeln!(file, "{}\t{}\t{}", id, environment(j), j * 10).unwrap();
    }
    file.flush().unwrap();
    file
}

fn create_metadata() -> Metadata {
    let file = create_metadata_file();
    Metadata::from_tsv(file.path()).unwrap()
}

fn pipeline() -> NetworkPipeline {
    NetworkPipeline::new().group_column("environment")
}

fn gut_counts() -> CountMatrix {
    let ids: Vec<String> = sample_ids().into_iter().take(12).collect();
    create_synthetic_counts().select_samples(&ids).unwrap()
}

#[test]
fn test_relative_abundances_sum_to_one() {
    let rel = norm_tss(&create_synthetic_counts(), ZeroTotalPolicy::Reject).unwrap();
    for j in 0..rel.n_samples() {
        assert_relative_eq!(rel.col(j).iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_perfect_pair_becomes_unit_edge() {
    let network = pipeline().run_category("gut", &gut_counts()).unwrap();
    let edge = network
        .edges()
        .into_iter()
        .find(|(s, t, _)| s == "alpha" && t == "beta")
        .expect("alpha-beta edge");
    assert_relative_eq!(edge.2, 1.0, epsilon = 1e-12);
}

#[test]
fn test_constant_organism_is_neutral_and_excluded() {
    let rel = norm_tss(&gut_counts(), ZeroTotalPolicy::Reject).unwrap();
    let assoc = estimate_associations(&rel, &EstimatorOptions::default()).unwrap();
    let delta = 3;
    for k in 0..assoc.dim() {
        if k != delta {
            assert!(assoc.get(delta, k).is_neutral());
        }
    }

    let network = pipeline().run_category("gut", &gut_counts()).unwrap();
    assert!(!network.nodes().contains(&"delta"));
}

#[test]
fn test_negative_associations_are_dropped() {
    let network = pipeline().run_category("gut", &gut_counts()).unwrap();
    assert!(!network.nodes().contains(&"filler"));
    assert_eq!(network.nodes(), vec!["alpha", "beta", "gamma"]);
    assert_eq!(network.record.n_edges, 3);
    assert_relative_eq!(network.record.transitivity, 1.0);
    assert_relative_eq!(network.record.density, 1.0);
}

#[test]
fn test_empty_graph_is_not_an_error() {
    let comparison = pipeline()
        .run(&create_synthetic_counts(), &create_metadata())
        .unwrap();
    let soil = comparison.table.get("soil").unwrap();
    assert_eq!(soil.status, CategoryStatus::EmptyGraph);

    let record = soil.record.as_ref().unwrap();
    assert_eq!(record.n_nodes, 0);
    assert_eq!(record.n_edges, 0);
    assert_eq!(record.density, 0.0);
    assert_eq!(record.transitivity, 0.0);
    assert_eq!(record.modularity, 0.0);
}

#[test]
fn test_failed_category_does_not_abort_others() {
    let comparison = pipeline()
        .run(&create_synthetic_counts(), &create_metadata())
        .unwrap();

    let categories: Vec<&str> = comparison.table.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["air", "gut", "soil"]);

    let air = comparison.table.get("air").unwrap();
    assert!(matches!(air.status, CategoryStatus::Failed(_)));
    assert!(air.record.is_none());
    assert_eq!(comparison.table.get("gut").unwrap().status, CategoryStatus::Ok);
    assert_eq!(comparison.table.n_failed(), 1);
}

#[test]
fn test_stricter_cutoff_removes_nodes() {
    let counts = gut_counts();
    let loose = pipeline().min_coefficient(0.6).run_category("gut", &counts).unwrap();
    let strict = pipeline().min_coefficient(0.99).run_category("gut", &counts).unwrap();
    assert!(strict.record.n_nodes < loose.record.n_nodes);
    assert_eq!(strict.nodes(), vec!["alpha", "beta"]);
}

#[test]
fn test_rerun_is_identical() {
    let counts = create_synthetic_counts();
    let metadata = create_metadata();
    for p in [pipeline(), pipeline().seed(11)] {
        let first = p.run(&counts, &metadata).unwrap();
        let second = p.run(&counts, &metadata).unwrap();
        let a: Vec<TopologyRecord> = first.table.records().cloned().collect();
        let b: Vec<TopologyRecord> = second.table.records().cloned().collect();
        assert_eq!(a, b);
    }
}

#[test]
fn test_sorting_puts_failures_last() {
    let comparison = pipeline()
        .run(&create_synthetic_counts(), &create_metadata())
        .unwrap();
    let sorted = comparison.table.sorted_by(Metric::Nodes, true);
    let order: Vec<&str> = sorted.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(order, vec!["gut", "soil", "air"]);
}

#[test]
fn test_tsv_and_yaml_roundtrip() {
    let dir = TempDir::new().unwrap();
    let counts_path = dir.path().join("counts.tsv");
    create_synthetic_counts().to_tsv(&counts_path).unwrap();
    let counts = CountMatrix::from_tsv(&counts_path).unwrap();
    assert_eq!(counts.n_taxa(), 5);
    assert_eq!(counts.n_samples(), 18);

    let config_path = dir.path().join("pipeline.yaml");
    pipeline()
        .name("roundtrip")
        .seed(5)
        .to_config(None)
        .to_yaml_file(&config_path)
        .unwrap();
    let config = NetworkConfig::from_yaml_file(&config_path).unwrap();
    assert_eq!(config.group_column, "environment");

    let comparison = NetworkPipeline::from_config(&config)
        .run(&counts, &create_metadata())
        .unwrap();
    let table_path = dir.path().join("table.tsv");
    comparison.table.to_tsv(&table_path).unwrap();

    let text = std::fs::read_to_string(&table_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("category\tn_samples\tstatus"));
    assert!(lines[1].starts_with("air\t2\tfailed\tNA"));
    assert!(lines[2].starts_with("gut\t12\tok\t3\t3"));
}

#[test]
fn test_bh_adjustment_keeps_strong_edges() {
    let network = pipeline().correct_bh().run_category("gut", &gut_counts()).unwrap();
    assert_eq!(network.record.n_edges, 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_metrics_within_bounds(
        values in prop::collection::vec(1u64..60, 6 * 10),
        min_coefficient in 0.0f64..0.9,
    ) {
        let rows: Vec<Vec<u64>> = values.chunks(10).map(|c| c.to_vec()).collect();
        let counts = CountMatrix::from_rows(
            &rows,
            (0..6).map(|i| format!("t{}", i)).collect(),
            (0..10).map(|j| format!("s{}", j)).collect(),
        )
        .unwrap();

        let network = NetworkPipeline::new()
            .min_coefficient(min_coefficient)
            .alpha(0.2)
            .run_category("random", &counts)
            .unwrap();
        let r = &network.record;

        prop_assert!(r.n_nodes <= 6);
        prop_assert!((0.0..=1.0).contains(&r.density));
        prop_assert!((0.0..=1.0).contains(&r.transitivity));
        prop_assert!(r.modularity >= -0.5 - 1e-12 && r.modularity <= 1.0);
        for v in network.graph.node_indices() {
            prop_assert!(network.graph.neighbors(v).next().is_some());
        }
        for (_, _, w) in network.edges() {
            prop_assert!(w >= min_coefficient && w <= 1.0);
        }
    }
}
