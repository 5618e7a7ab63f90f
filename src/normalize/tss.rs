//! Total Sum Scaling: raw counts to per-sample relative abundances.
//!
//! Each count is divided by its sample's library size, so every column of the
//! result sums to 1. Rank correlation is invariant to monotone transforms of a
//! single organism's values but not to per-sample scaling, which is why the
//! estimator runs on proportions rather than counts.

use crate::data::CountMatrix;
use crate::error::{CooccurError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// What to do with a sample whose counts sum to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTotalPolicy {
    /// Fail with [`CooccurError::Numerical`].
    #[default]
    Reject,
    /// Emit an all-zero column without dividing.
    ZeroVector,
}

/// Relative abundances (organisms × samples).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeAbundanceMatrix {
    pub data: DMatrix<f64>,
    pub taxon_ids: Vec<String>,
    pub sample_ids: Vec<String>,
    /// Library size of each sample before scaling.
    pub library_sizes: Vec<u64>,
}

impl RelativeAbundanceMatrix {
    #[inline]
    pub fn get(&self, taxon: usize, sample: usize) -> f64 {
        self.data[(taxon, sample)]
    }

    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// One organism's profile across samples.
    pub fn row(&self, taxon: usize) -> Vec<f64> {
        self.data.row(taxon).iter().copied().collect()
    }

    pub fn col(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().copied().collect()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// Convert counts to proportions per sample.
///
/// # Formula
/// For sample j: p_ij = x_ij / Σ_i x_ij
///
/// # Errors
/// `EmptyData` for a matrix without taxa or samples, and `Numerical` for a
/// zero-total sample under [`ZeroTotalPolicy::Reject`].
pub fn norm_tss(counts: &CountMatrix, policy: ZeroTotalPolicy) -> Result<RelativeAbundanceMatrix> {
    let n_taxa = counts.n_taxa();
    let n_samples = counts.n_samples();

    if n_taxa == 0 || n_samples == 0 {
        return Err(CooccurError::EmptyData(
            "Cannot normalize an empty count matrix".to_string(),
        ));
    }

    let library_sizes = counts.col_sums();

    if policy == ZeroTotalPolicy::Reject {
        if let Some(j) = library_sizes.iter().position(|&total| total == 0) {
            return Err(CooccurError::Numerical(format!(
                "Sample {} has zero total counts, cannot normalize",
                counts.sample_ids()[j]
            )));
        }
    }

    let columns: Vec<Vec<f64>> = (0..n_samples)
        .into_par_iter()
        .map(|j| {
            let total = library_sizes[j];
            if total == 0 {
                return vec![0.0; n_taxa];
            }
            let total = total as f64;
            (0..n_taxa).map(|i| counts.get(i, j) as f64 / total).collect()
        })
        .collect();

    let data = DMatrix::from_fn(n_taxa, n_samples, |i, j| columns[j][i]);

    Ok(RelativeAbundanceMatrix {
        data,
        taxon_ids: counts.taxon_ids().to_vec(),
        sample_ids: counts.sample_ids().to_vec(),
        library_sizes,
    })
}
