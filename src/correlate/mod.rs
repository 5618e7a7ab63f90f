//! Rank-based pairwise dependence between organisms.

pub mod estimator;
pub mod rank;
pub mod spearman;

pub use estimator::{
    estimate_associations, n_pairs, pair_association, rank_profiles, CancelToken,
    EstimatorOptions, ProgressSink, TracingProgress,
};
pub use rank::{average_ranks, RankedProfile};
pub use spearman::{spearman, spearman_ranked, two_sided_p};
