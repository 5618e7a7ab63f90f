//! Prevalence-based filtering of organisms.

use crate::data::CountMatrix;
use crate::error::{CooccurError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Keep organisms observed in at least `threshold` of the samples.
///
/// The minimum is `ceil(threshold · n_samples)` samples with a nonzero count.
pub fn filter_prevalence(counts: &CountMatrix, threshold: f64) -> Result<CountMatrix> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(CooccurError::InvalidParameter(
            "Prevalence threshold must be between 0 and 1".to_string(),
        ));
    }

    let min_samples = (threshold * counts.n_samples() as f64).ceil() as usize;
    let keep: Vec<usize> = (0..counts.n_taxa())
        .into_par_iter()
        .filter(|&row| counts.occupancy(row) >= min_samples)
        .collect();

    if keep.is_empty() {
        return Err(CooccurError::EmptyData(format!(
            "No taxa pass prevalence threshold of {:.1}%",
            threshold * 100.0
        )));
    }

    counts.subset_taxa(&keep)
}

/// Before/after counts of a filtering step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub n_before: usize,
    pub n_after: usize,
}

impl FilterResult {
    pub fn n_removed(&self) -> usize {
        self.n_before - self.n_after
    }

    pub fn retention_rate(&self) -> f64 {
        if self.n_before == 0 {
            0.0
        } else {
            self.n_after as f64 / self.n_before as f64
        }
    }
}

impl std::fmt::Display for FilterResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({} removed, {:.1}% retained)",
            self.n_before,
            self.n_after,
            self.n_removed(),
            self.retention_rate() * 100.0
        )
    }
}
