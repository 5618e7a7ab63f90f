//! Graph construction from a cleaned association matrix.

use crate::data::AssociationMatrix;
use petgraph::graph::{NodeIndex, UnGraph};

/// Undirected weighted co-occurrence graph. Nodes carry organism identifiers,
/// edges the retained coefficient.
pub type CooccurrenceGraph = UnGraph<String, f64>;

/// One node per organism, one edge per nonzero upper-triangle cell.
///
/// Isolated organisms are kept; see [`prune_isolated`].
pub fn full_graph(cleaned: &AssociationMatrix) -> CooccurrenceGraph {
    let n = cleaned.dim();
    let mut graph = CooccurrenceGraph::with_capacity(n, cleaned.n_nonzero_pairs());
    let nodes: Vec<NodeIndex> = cleaned
        .taxon_ids
        .iter()
        .map(|id| graph.add_node(id.clone()))
        .collect();

    for (i, j, stat) in cleaned.upper_pairs() {
        if stat.coefficient != 0.0 {
            graph.add_edge(nodes[i], nodes[j], stat.coefficient);
        }
    }
    graph
}

/// Drop zero-degree nodes. Remaining nodes keep their relative order.
pub fn prune_isolated(graph: &CooccurrenceGraph) -> CooccurrenceGraph {
    graph.filter_map(
        |idx, name| graph.neighbors(idx).next().map(|_| name.clone()),
        |_, &weight| Some(weight),
    )
}

/// Build the pruned co-occurrence graph of a cleaned matrix.
pub fn build_graph(cleaned: &AssociationMatrix) -> CooccurrenceGraph {
    let full = full_graph(cleaned);
    let graph = prune_isolated(&full);
    tracing::debug!(
        n_organisms = full.node_count(),
        n_nodes = graph.node_count(),
        n_edges = graph.edge_count(),
        "built co-occurrence graph"
    );
    graph
}

/// Edges as `(source, target, weight)` organism identifiers.
pub fn edge_triples(graph: &CooccurrenceGraph) -> Vec<(String, String, f64)> {
    use petgraph::visit::EdgeRef;
    graph
        .edge_references()
        .map(|e| {
            (
                graph[e.source()].clone(),
                graph[e.target()].clone(),
                *e.weight(),
            )
        })
        .collect()
}
