//! Multi-category comparison.
//!
//! Categories are independent: each one is subset, run and summarized on its
//! own, and a failure is recorded on that category's row without touching the
//! others. Rows are appended by a single aggregator in category order.

use super::output::CategoryNetwork;
use super::runner::NetworkPipeline;
use crate::data::{ComparisonRow, ComparisonTable, CountMatrix, Metadata};
use crate::error::{CooccurError, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Comparison table plus the networks of every category that produced one.
#[derive(Debug, Clone)]
pub struct NetworkComparison {
    pub table: ComparisonTable,
    pub networks: BTreeMap<String, CategoryNetwork>,
}

impl NetworkComparison {
    pub fn network(&self, category: &str) -> Option<&CategoryNetwork> {
        self.networks.get(category)
    }

    /// Write one `<category>.edges.tsv` per network into `dir`.
    ///
    /// # Errors
    /// Fails before writing anything if two categories map to the same file
    /// name.
    pub fn write_edges<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut stems: HashMap<String, &str> = HashMap::with_capacity(self.networks.len());
        for category in self.networks.keys() {
            if let Some(other) = stems.insert(file_stem(category), category) {
                return Err(CooccurError::InvalidParameter(format!(
                    "Categories '{}' and '{}' share the edge list file name '{}.edges.tsv'",
                    other,
                    category,
                    file_stem(category)
                )));
            }
        }

        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.networks.len());
        for (category, network) in &self.networks {
            let path = dir.join(format!("{}.edges.tsv", file_stem(category)));
            network.edges_to_tsv(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

fn file_stem(category: &str) -> String {
    category
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Split samples by category and build one network per category.
///
/// # Errors
/// Fails as a whole only for problems shared by every category: a missing
/// group column, or count-table samples absent from the metadata. Everything else becomes a failed row.
pub fn compare_categories(
    counts: &CountMatrix,
    metadata: &Metadata,
    pipeline: &NetworkPipeline,
) -> Result<NetworkComparison> {
    let config = pipeline.config();
    let groups = metadata.groups(&config.group_column)?;

    let known: HashSet<&str> = metadata.sample_ids().iter().map(String::as_str).collect();
    if let Some(missing) = counts.sample_ids().iter().find(|s| !known.contains(s.as_str())) {
        return Err(CooccurError::SampleMismatch(format!(
            "Sample '{}' in count table has no metadata",
            missing
        )));
    }

    // Metadata may describe samples that were not sequenced.
    let present: HashSet<&str> = counts.sample_ids().iter().map(String::as_str).collect();
    let groups: Vec<(String, Vec<String>)> = groups
        .into_iter()
        .map(|(category, samples)| {
            let samples = samples
                .into_iter()
                .filter(|s| present.contains(s.as_str()))
                .collect();
            (category, samples)
        })
        .collect();

    tracing::info!(
        name = %config.name,
        group_column = %config.group_column,
        n_categories = groups.len(),
        n_taxa = counts.n_taxa(),
        n_samples = counts.n_samples(),
        "comparing co-occurrence networks"
    );

    let run_one = |(category, samples): &(String, Vec<String>)| {
        tracing::info!(category = %category, n_samples = samples.len(), "building network");
        let result = counts
            .select_samples(samples)
            .and_then(|subset| pipeline.run_category(category, &subset));
        (category.clone(), samples.len(), result)
    };

    let outcomes: Vec<(String, usize, Result<CategoryNetwork>)> = if config.parallel {
        groups.par_iter().map(run_one).collect()
    } else {
        groups.iter().map(run_one).collect()
    };

    let mut table = ComparisonTable::new(&config.name);
    let mut networks = BTreeMap::new();
    for (category, n_samples, outcome) in outcomes {
        match outcome {
            Ok(network) => {
                let record = network.record.clone();
                if record.n_edges == 0 {
                    tracing::warn!(category = %category, "no association survived filtering");
                } else {
                    tracing::info!(
                        category = %category,
                        n_nodes = record.n_nodes,
                        n_edges = record.n_edges,
                        modularity = record.modularity,
                        "network built"
                    );
                }
                table.push(ComparisonRow::succeeded(n_samples, record));
                networks.insert(category, network);
            }
            Err(e) => {
                tracing::warn!(category = %category, error = %e, "category failed");
                table.push(ComparisonRow::failed(&category, n_samples, e.to_string()));
            }
        }
    }

    Ok(NetworkComparison { table, networks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CategoryStatus;
    use tempfile::TempDir;

    fn create_test_data() -> (CountMatrix, Metadata) {
        // "gut": s0..s5 with a perfectly co-varying pair.
        // "soil": s6..s7 only, too few samples.
        let counts = CountMatrix::from_rows(
            &[
                vec![10, 20, 30, 35, 39, 5, 4, 7],
                vec![11, 21, 31, 36, 40, 6, 9, 2],
                vec![20, 20, 20, 20, 20, 20, 5, 5],
                vec![59, 39, 19, 9, 1, 69, 3, 8],
            ],
            vec!["t0".into(), "t1".into(), "t2".into(), "t3".into()],
            (0..8).map(|j| format!("s{}", j)).collect(),
        )
        .unwrap();
        let assignments: Vec<(String, String)> = (0..8)
            .map(|j| {
                let category = if j < 6 { "gut" } else { "soil" };
                (format!("s{}", j), category.to_string())
            })
            .collect();
        (counts, Metadata::from_categories("category", &assignments))
    }

    #[test]
    fn test_failure_is_isolated() {
        let (counts, metadata) = create_test_data();
        let comparison = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap();

        assert_eq!(comparison.table.len(), 2);
        let gut = comparison.table.get("gut").unwrap();
        assert_eq!(gut.status, CategoryStatus::Ok);
        assert_eq!(gut.record.as_ref().unwrap().n_edges, 1);

        let soil = comparison.table.get("soil").unwrap();
        assert!(matches!(soil.status, CategoryStatus::Failed(_)));
        assert!(soil.record.is_none());
        assert_eq!(comparison.table.n_failed(), 1);

        assert!(comparison.network("gut").is_some());
        assert!(comparison.network("soil").is_none());
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let (counts, metadata) = create_test_data();
        let par = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap();
        let seq =
            compare_categories(&counts, &metadata, &NetworkPipeline::new().parallel(false)).unwrap();
        let a: Vec<_> = par.table.records().cloned().collect();
        let b: Vec<_> = seq.table.records().cloned().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_sample_is_an_error() {
        let (counts, _) = create_test_data();
        let metadata = Metadata::from_categories("category", &[("s0", "gut")]);
        let err = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap_err();
        assert!(matches!(err, CooccurError::SampleMismatch(_)));
    }

    #[test]
    fn test_missing_group_column() {
        let (counts, metadata) = create_test_data();
        let pipeline = NetworkPipeline::new().group_column("biome");
        assert!(matches!(
            compare_categories(&counts, &metadata, &pipeline),
            Err(CooccurError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_write_edges() {
        let (counts, metadata) = create_test_data();
        let comparison = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap();
        let dir = TempDir::new().unwrap();
        let written = comparison.write_edges(dir.path()).unwrap();
        assert_eq!(written.len(), 1);

        let text = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "source\ttarget\tweight\tcommunity_source\tcommunity_target");
        assert_eq!(lines[1], "t0\tt1\t1.000000\t0\t0");
    }

    #[test]
    fn test_n_samples_counts_group_before_dropping() {
        let (counts, metadata) = create_test_data();
        // s1 becomes a zero-total sample and is dropped inside the run
        let mut rows: Vec<Vec<u64>> = (0..counts.n_taxa()).map(|i| counts.row_dense(i)).collect();
        for row in rows.iter_mut() {
            row[1] = 0;
        }
        let counts = CountMatrix::from_rows(
            &rows,
            counts.taxon_ids().to_vec(),
            counts.sample_ids().to_vec(),
        )
        .unwrap();

        let comparison = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap();
        assert_eq!(comparison.table.get("gut").unwrap().n_samples, 6);
        assert_eq!(comparison.network("gut").unwrap().n_samples, 5);
        assert_eq!(comparison.table.get("soil").unwrap().n_samples, 2);
    }

    #[test]
    fn test_colliding_file_names_rejected() {
        let (counts, _) = create_test_data();
        let assignments: Vec<(String, String)> = (0..8)
            .map(|j| {
                let category = if j < 4 { "deep sea" } else { "deep/sea" };
                (format!("s{}", j), category.to_string())
            })
            .collect();
        let metadata = Metadata::from_categories("category", &assignments);
        let comparison = compare_categories(&counts, &metadata, &NetworkPipeline::new()).unwrap();
        assert_eq!(comparison.networks.len(), 2);

        let dir = TempDir::new().unwrap();
        let err = comparison.write_edges(dir.path()).unwrap_err();
        assert!(matches!(err, CooccurError::InvalidParameter(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("deep sea/vent"), "deep_sea_vent");
    }
}
