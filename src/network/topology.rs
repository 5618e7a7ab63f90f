//! Global topology metrics of a co-occurrence graph.

use super::build::CooccurrenceGraph;
use super::community::{GreedyModularity, Partition};
use crate::data::TopologyRecord;
use crate::error::Result;
use std::collections::HashSet;

/// Average node degree, 2E / N. Zero for an empty graph.
pub fn mean_degree(graph: &CooccurrenceGraph) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    2.0 * graph.edge_count() as f64 / n as f64
}

/// Fraction of possible edges present, 2E / (N(N−1)). Zero below two nodes.
pub fn density(graph: &CooccurrenceGraph) -> f64 {
    let n = graph.node_count();
    if n < 2 {
        return 0.0;
    }
    2.0 * graph.edge_count() as f64 / (n * (n - 1)) as f64
}

/// Global clustering coefficient: closed connected triples over all
/// connected triples. Zero when the graph has no connected triple.
pub fn transitivity(graph: &CooccurrenceGraph) -> f64 {
    let adjacency: Vec<HashSet<usize>> = graph
        .node_indices()
        .map(|v| graph.neighbors(v).map(|u| u.index()).filter(|&u| u != v.index()).collect())
        .collect();

    let mut closed = 0usize;
    let mut triples = 0usize;
    for neighbors in &adjacency {
        let d = neighbors.len();
        triples += d * d.saturating_sub(1) / 2;
        let ordered: Vec<usize> = {
            let mut v: Vec<usize> = neighbors.iter().copied().collect();
            v.sort_unstable();
            v
        };
        for (k, &a) in ordered.iter().enumerate() {
            for &b in &ordered[k + 1..] {
                if adjacency[a].contains(&b) {
                    closed += 1;
                }
            }
        }
    }

    if triples == 0 {
        0.0
    } else {
        closed as f64 / triples as f64
    }
}

/// Topology record and community partition of one category's graph.
///
/// An empty graph yields [`TopologyRecord::empty`] and an empty partition.
pub fn analyze(
    category: &str,
    graph: &CooccurrenceGraph,
    communities: &GreedyModularity,
) -> Result<(TopologyRecord, Partition)> {
    if graph.node_count() == 0 {
        communities.validate()?;
        return Ok((TopologyRecord::empty(category), Partition::empty()));
    }

    let partition = communities.detect(graph)?;
    let record = TopologyRecord {
        category: category.to_string(),
        n_nodes: graph.node_count(),
        n_edges: graph.edge_count(),
        mean_degree: mean_degree(graph),
        transitivity: transitivity(graph),
        modularity: partition.modularity,
        density: density(graph),
        n_communities: partition.n_communities(),
    };
    Ok((record, partition))
}
