//! Abundance normalization.
//!
//! Only total sum scaling is needed for rank-based co-occurrence: the
//! estimator consumes per-sample proportions.

pub mod tss;

pub use tss::{norm_tss, RelativeAbundanceMatrix, ZeroTotalPolicy};
