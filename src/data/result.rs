//! Per-category topology records and the cross-category comparison table.

use crate::error::{CooccurError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;

/// Global structure of one category's co-occurrence network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyRecord {
    pub category: String,
    pub n_nodes: usize,
    pub n_edges: usize,
    /// 2·edges / nodes, or 0 for an empty graph.
    pub mean_degree: f64,
    /// Closed triplets / connected triplets, 0 when there are none.
    pub transitivity: f64,
    /// Modularity of the greedy partition, 0 for an empty graph.
    pub modularity: f64,
    /// Edges / (n·(n−1)/2), 0 below two nodes.
    pub density: f64,
    pub n_communities: usize,
}

impl TopologyRecord {
    /// Record for a category whose filtered network has no edges.
    pub fn empty(category: &str) -> Self {
        Self {
            category: category.to_string(),
            n_nodes: 0,
            n_edges: 0,
            mean_degree: 0.0,
            transitivity: 0.0,
            modularity: 0.0,
            density: 0.0,
            n_communities: 0,
        }
    }

    /// Value of a metric as f64, for sorting and display.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Nodes => self.n_nodes as f64,
            Metric::Edges => self.n_edges as f64,
            Metric::MeanDegree => self.mean_degree,
            Metric::Transitivity => self.transitivity,
            Metric::Modularity => self.modularity,
            Metric::Density => self.density,
            Metric::Communities => self.n_communities as f64,
        }
    }
}

/// Sortable columns of the comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Nodes,
    Edges,
    MeanDegree,
    Transitivity,
    Modularity,
    Density,
    Communities,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Nodes,
        Metric::Edges,
        Metric::MeanDegree,
        Metric::Transitivity,
        Metric::Modularity,
        Metric::Density,
        Metric::Communities,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Nodes => "n_nodes",
            Metric::Edges => "n_edges",
            Metric::MeanDegree => "mean_degree",
            Metric::Transitivity => "transitivity",
            Metric::Modularity => "modularity",
            Metric::Density => "density",
            Metric::Communities => "n_communities",
        }
    }
}

impl FromStr for Metric {
    type Err = CooccurError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == key || m.name().trim_start_matches("n_") == key)
            .ok_or_else(|| CooccurError::InvalidParameter(format!("Unknown metric '{}'", s)))
    }
}

/// Outcome of processing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CategoryStatus {
    Ok,
    /// Filtering removed every association; metrics are the zero record.
    EmptyGraph,
    /// Processing aborted for this category only.
    Failed(String),
}

impl CategoryStatus {
    pub fn name(&self) -> &'static str {
        match self {
            CategoryStatus::Ok => "ok",
            CategoryStatus::EmptyGraph => "empty_graph",
            CategoryStatus::Failed(_) => "failed",
        }
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub category: String,
    /// Samples assigned to the category and present in the count table,
    /// counted before zero-total samples are dropped. Failed and successful
    /// rows use the same count.
    pub n_samples: usize,
    pub status: CategoryStatus,
    /// Absent only for failed categories.
    pub record: Option<TopologyRecord>,
}

impl ComparisonRow {
    pub fn succeeded(n_samples: usize, record: TopologyRecord) -> Self {
        let status = if record.n_edges == 0 {
            CategoryStatus::EmptyGraph
        } else {
            CategoryStatus::Ok
        };
        Self {
            category: record.category.clone(),
            n_samples,
            status,
            record: Some(record),
        }
    }

    pub fn failed(category: &str, n_samples: usize, reason: String) -> Self {
        Self {
            category: category.to_string(),
            n_samples,
            status: CategoryStatus::Failed(reason),
            record: None,
        }
    }
}

/// Append-only table with one row per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub method: String,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ComparisonRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, category: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter()
    }

    /// Rows for which a topology record exists (ok and empty-graph).
    pub fn records(&self) -> impl Iterator<Item = &TopologyRecord> {
        self.rows.iter().filter_map(|r| r.record.as_ref())
    }

    pub fn n_failed(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.status, CategoryStatus::Failed(_)))
            .count()
    }

    /// Rows ordered by a metric. Failed rows go last; ties fall back to the
    /// category name.
    pub fn sorted_by(&self, metric: Metric, descending: bool) -> Vec<&ComparisonRow> {
        let mut rows: Vec<&ComparisonRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let ord = match (&a.record, &b.record) {
                (Some(ra), Some(rb)) => {
                    let o = ra.metric(metric).total_cmp(&rb.metric(metric));
                    if descending {
                        o.reverse()
                    } else {
                        o
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            ord.then_with(|| a.category.cmp(&b.category))
        });
        rows
    }

    /// Write the table as TSV; failed rows carry `NA` metrics and a reason.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        self.write_tsv(writer)
    }

    /// Render the table as a TSV string.
    pub fn to_tsv_string(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());
        self.write_records(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|e| CooccurError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| CooccurError::Pipeline(e.to_string()))
    }

    fn write_tsv<W: std::io::Write>(&self, mut writer: csv::Writer<W>) -> Result<()> {
        self.write_records(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_records<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer.write_record([
            "category",
            "n_samples",
            "status",
            "n_nodes",
            "n_edges",
            "mean_degree",
            "transitivity",
            "modularity",
            "density",
            "n_communities",
            "reason",
        ])?;

        for row in &self.rows {
            let reason = match &row.status {
                CategoryStatus::Failed(reason) => reason.clone(),
                _ => String::new(),
            };
            let metrics: Vec<String> = match &row.record {
                Some(r) => vec![
                    r.n_nodes.to_string(),
                    r.n_edges.to_string(),
                    format!("{:.4}", r.mean_degree),
                    format!("{:.4}", r.transitivity),
                    format!("{:.4}", r.modularity),
                    format!("{:.4}", r.density),
                    r.n_communities.to_string(),
                ],
                None => vec!["NA".to_string(); 7],
            };

            let mut record = vec![
                row.category.clone(),
                row.n_samples.to_string(),
                row.status.name().to_string(),
            ];
            record.extend(metrics);
            record.push(reason);
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<20} {:>7} {:>6} {:>6} {:>8} {:>8} {:>8} {:>8}  status",
            "category", "samples", "nodes", "edges", "mean_deg", "trans", "modul", "density"
        )?;
        for row in &self.rows {
            match &row.record {
                Some(r) => writeln!(
                    f,
                    "{:<20} {:>7} {:>6} {:>6} {:>8.3} {:>8.3} {:>8.3} {:>8.3}  {}",
                    row.category,
                    row.n_samples,
                    r.n_nodes,
                    r.n_edges,
                    r.mean_degree,
                    r.transitivity,
                    r.modularity,
                    r.density,
                    row.status.name()
                )?,
                None => writeln!(
                    f,
                    "{:<20} {:>7} {:>6} {:>6} {:>8} {:>8} {:>8} {:>8}  {}",
                    row.category, row.n_samples, "NA", "NA", "NA", "NA", "NA", "NA",
                    row.status.name()
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn record(category: &str, n_edges: usize, modularity: f64) -> TopologyRecord {
        TopologyRecord {
            category: category.to_string(),
            n_nodes: n_edges + 1,
            n_edges,
            mean_degree: 2.0 * n_edges as f64 / (n_edges + 1) as f64,
            transitivity: 0.0,
            modularity,
            density: 1.0,
            n_communities: 1,
        }
    }

    fn table() -> ComparisonTable {
        let mut t = ComparisonTable::new("spearman");
        t.push(ComparisonRow::succeeded(10, record("soil", 5, 0.2)));
        t.push(ComparisonRow::failed("air", 2, "too few samples".into()));
        t.push(ComparisonRow::succeeded(8, TopologyRecord::empty("water")));
        t.push(ComparisonRow::succeeded(12, record("gut", 9, 0.4)));
        t
    }

    #[test]
    fn test_status_assignment() {
        let t = table();
        assert_eq!(t.get("soil").unwrap().status, CategoryStatus::Ok);
        assert_eq!(t.get("water").unwrap().status, CategoryStatus::EmptyGraph);
        assert_eq!(t.n_failed(), 1);
        assert_eq!(t.records().count(), 3);
    }

    #[test]
    fn test_sorting_puts_failed_last() {
        let t = table();
        let desc: Vec<_> = t
            .sorted_by(Metric::Modularity, true)
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(desc, vec!["gut", "soil", "water", "air"]);

        let asc: Vec<_> = t
            .sorted_by(Metric::Edges, false)
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(asc, vec!["water", "soil", "gut", "air"]);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("modularity".parse::<Metric>().unwrap(), Metric::Modularity);
        assert_eq!("nodes".parse::<Metric>().unwrap(), Metric::Nodes);
        assert_eq!("n_edges".parse::<Metric>().unwrap(), Metric::Edges);
        assert!("diameter".parse::<Metric>().is_err());
    }

    #[test]
    fn test_tsv_output() {
        let t = table();
        let file = NamedTempFile::new().unwrap();
        t.to_tsv(file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("category\tn_samples\tstatus"));
        assert!(lines[2].starts_with("air\t2\tfailed\tNA"));
        assert!(lines[2].ends_with("too few samples"));
        assert_eq!(t.to_tsv_string().unwrap(), content);
    }

    #[test]
    fn test_json_roundtrip_keeps_status() {
        let t = table();
        let json = serde_json::to_string(&t).unwrap();
        let back: ComparisonTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 4);
        assert_eq!(
            back.get("air").unwrap().status,
            CategoryStatus::Failed("too few samples".into())
        );
    }
}
