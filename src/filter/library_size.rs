//! Library size-based filtering for samples.

use crate::data::CountMatrix;
use crate::error::{CooccurError, Result};

/// Filter samples by library size (total counts).
///
/// Keeps samples whose total lies in `[min_reads, max_reads]`; `None` leaves
/// that side open. `filter_library_size(counts, Some(1), None)` is the guard
/// that keeps zero-total samples away from normalization.
///
/// # Errors
/// `InvalidParameter` when `max_reads < min_reads`; `EmptyData` when no sample
/// survives.
pub fn filter_library_size(
    counts: &CountMatrix,
    min_reads: Option<u64>,
    max_reads: Option<u64>,
) -> Result<CountMatrix> {
    if let (Some(min), Some(max)) = (min_reads, max_reads) {
        if max < min {
            return Err(CooccurError::InvalidParameter(
                "max_reads cannot be less than min_reads".to_string(),
            ));
        }
    }

    let min = min_reads.unwrap_or(0);
    let max = max_reads.unwrap_or(u64::MAX);

    let keep: Vec<usize> = counts
        .col_sums()
        .iter()
        .enumerate()
        .filter(|(_, &total)| total >= min && total <= max)
        .map(|(j, _)| j)
        .collect();

    if keep.is_empty() {
        return Err(CooccurError::EmptyData(format!(
            "No samples have library size between {} and {}",
            min, max
        )));
    }

    counts.subset_samples(&keep)
}

/// Drop samples with no counts at all.
pub fn drop_empty_samples(counts: &CountMatrix) -> Result<CountMatrix> {
    filter_library_size(counts, Some(1), None)
}
