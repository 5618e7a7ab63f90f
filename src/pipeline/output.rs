//! Per-category network output.

use crate::data::{AssociationMatrix, TopologyRecord};
use crate::error::Result;
use crate::network::{edge_triples, CooccurrenceGraph, Partition};
use petgraph::visit::EdgeRef;
use std::path::Path;

/// Everything computed for one successful category.
#[derive(Debug, Clone)]
pub struct CategoryNetwork {
    pub category: String,
    /// Samples that reached normalization.
    pub n_samples: usize,
    /// Cleaned association matrix over the organisms that were correlated.
    pub association: AssociationMatrix,
    pub graph: CooccurrenceGraph,
    pub partition: Partition,
    pub record: TopologyRecord,
}

impl CategoryNetwork {
    /// Edges as `(source, target, weight)`.
    pub fn edges(&self) -> Vec<(String, String, f64)> {
        edge_triples(&self.graph)
    }

    /// Organism identifiers of the graph nodes, in node order.
    pub fn nodes(&self) -> Vec<&str> {
        self.graph.node_weights().map(String::as_str).collect()
    }

    /// Community id of an organism, if it is in the graph.
    pub fn community_of(&self, taxon_id: &str) -> Option<usize> {
        self.graph
            .node_indices()
            .find(|&v| self.graph[v] == taxon_id)
            .and_then(|v| self.partition.membership.get(v.index()).copied())
    }

    /// Write the edge list with community labels of both endpoints.
    pub fn edges_to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;
        writer.write_record([
            "source",
            "target",
            "weight",
            "community_source",
            "community_target",
        ])?;
        for edge in self.graph.edge_references() {
            let (s, t) = (edge.source(), edge.target());
            let community = |v: usize| {
                self.partition
                    .membership
                    .get(v)
                    .map_or_else(|| "NA".to_string(), |c| c.to_string())
            };
            writer.write_record([
                self.graph[s].clone(),
                self.graph[t].clone(),
                format!("{:.6}", edge.weight()),
                community(s.index()),
                community(t.index()),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
