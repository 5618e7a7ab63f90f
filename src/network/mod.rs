//! Network construction and analysis.
//!
//! A cleaned association matrix becomes a weighted undirected graph whose
//! global structure is summarised as a [`TopologyRecord`](crate::data::TopologyRecord).

pub mod build;
pub mod community;
pub mod sparsify;
pub mod topology;

pub use build::{build_graph, edge_triples, full_graph, prune_isolated, CooccurrenceGraph};
pub use community::{modularity, GreedyModularity, Partition, TieBreak};
pub use sparsify::{check_symmetry, sparsify, SparsifyConfig};
pub use topology::{analyze, density, mean_degree, transitivity};
