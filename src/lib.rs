//! Co-occurrence Network Library
//!
//! This library builds co-occurrence networks from organism-abundance count
//! tables, one network per environmental category, and compares their global
//! structure.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (CountMatrix, Metadata, AssociationMatrix, ComparisonTable)
//! - **filter**: Upstream guards (library size, prevalence)
//! - **normalize**: Total-sum scaling to relative abundances
//! - **correlate**: Pairwise Spearman correlation with progress and cancellation
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **network**: Significance filtering, graph construction, topology and communities
//! - **pipeline**: Per-category pipeline and multi-category comparison
//!
//! # Example
//!
//! ```no_run
//! use cooccur_net::prelude::*;
//!
//! // Load data
//! let counts = CountMatrix::from_tsv("counts.tsv").unwrap();
//! let metadata = Metadata::from_tsv("metadata.tsv").unwrap();
//!
//! // One network per level of the "environment" column
//! let comparison = NetworkPipeline::new()
//!     .group_column("environment")
//!     .min_coefficient(0.6)
//!     .alpha(0.05)
//!     .run(&counts, &metadata)
//!     .unwrap();
//!
//! println!("{}", comparison.table);
//! ```

pub mod correct;
pub mod correlate;
pub mod data;
pub mod error;
pub mod filter;
pub mod network;
pub mod normalize;
pub mod pipeline;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::correct::{adjust_associations, correct_bh, PAdjust};
    pub use crate::correlate::{
        estimate_associations, spearman, CancelToken, EstimatorOptions, ProgressSink,
        TracingProgress,
    };
    pub use crate::data::{
        AssociationMatrix, CategoryStatus, ComparisonRow, ComparisonTable, CountMatrix, Metadata,
        Metric, PairStat, TopologyRecord, Variable,
    };
    pub use crate::error::{CooccurError, Result};
    pub use crate::filter::{drop_empty_samples, filter_library_size, filter_prevalence};
    pub use crate::network::{
        analyze, build_graph, check_symmetry, sparsify, CooccurrenceGraph, GreedyModularity,
        Partition, SparsifyConfig, TieBreak,
    };
    pub use crate::normalize::{norm_tss, RelativeAbundanceMatrix, ZeroTotalPolicy};
    pub use crate::pipeline::{
        compare_categories, CategoryNetwork, NetworkComparison, NetworkConfig, NetworkPipeline,
    };
}
