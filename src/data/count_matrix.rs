//! Sparse organism × sample count matrix.

use crate::error::{CooccurError, Result};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::path::Path;

/// Raw abundance counts for a set of organisms across samples.
///
/// Rows are organisms (taxa), columns are samples. Storage is CSR since
/// microbiome tables are mostly zeros and the pairwise estimator walks rows.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    data: CsMat<u64>,
    taxon_ids: Vec<String>,
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a count matrix from a sparse matrix and row/column labels.
    pub fn new(data: CsMat<u64>, taxon_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != taxon_ids.len() {
            return Err(CooccurError::DimensionMismatch {
                expected: nrows,
                actual: taxon_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(CooccurError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            taxon_ids,
            sample_ids,
        })
    }

    /// Build a count matrix from dense rows (one `Vec` per organism).
    pub fn from_rows(
        rows: &[Vec<u64>],
        taxon_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let n_samples = sample_ids.len();
        let mut tri = TriMat::new((rows.len(), n_samples));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_samples {
                return Err(CooccurError::DimensionMismatch {
                    expected: n_samples,
                    actual: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                if value > 0 {
                    tri.add_triplet(i, j, value);
                }
            }
        }
        Self::new(tri.to_csr(), taxon_ids, sample_ids)
    }

    /// Load a count matrix from a tab-separated file.
    ///
    /// The header holds sample ids (its first cell labels the taxon column);
    /// every following record is a taxon id followed by one count per sample.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let header = reader.headers()?.clone();
        if header.len() < 2 {
            return Err(CooccurError::EmptyData(
                "Count table must have at least one sample column".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        let n_samples = sample_ids.len();

        let mut taxon_ids = Vec::new();
        let mut triplets: Vec<(usize, usize, u64)> = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let Some(taxon) = record.get(0) else {
                continue;
            };
            if record.len() - 1 != n_samples {
                return Err(CooccurError::DimensionMismatch {
                    expected: n_samples,
                    actual: record.len() - 1,
                });
            }
            taxon_ids.push(taxon.to_string());

            for (col, raw) in record.iter().skip(1).enumerate() {
                let value: u64 = raw.trim().parse().map_err(|_| CooccurError::InvalidCount {
                    value: raw.to_string(),
                    row,
                    col,
                })?;
                if value > 0 {
                    triplets.push((row, col, value));
                }
            }
        }

        if taxon_ids.is_empty() {
            return Err(CooccurError::EmptyData("No taxa in count table".to_string()));
        }

        let mut tri = TriMat::new((taxon_ids.len(), n_samples));
        for (row, col, value) in triplets {
            tri.add_triplet(row, col, value);
        }
        Self::new(tri.to_csr(), taxon_ids, sample_ids)
    }

    /// Write the matrix as a tab-separated table readable by [`CountMatrix::from_tsv`].
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)?;

        let mut header = Vec::with_capacity(self.n_samples() + 1);
        header.push("taxon_id".to_string());
        header.extend(self.sample_ids.iter().cloned());
        writer.write_record(&header)?;

        for (row, taxon) in self.taxon_ids.iter().enumerate() {
            let mut record = Vec::with_capacity(self.n_samples() + 1);
            record.push(taxon.clone());
            record.extend(self.row_dense(row).into_iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Count at (taxon, sample); absent entries are zero.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    #[inline]
    pub fn n_taxa(&self) -> usize {
        self.data.rows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    #[inline]
    pub fn taxon_ids(&self) -> &[String] {
        &self.taxon_ids
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of samples in which a taxon was observed.
    pub fn occupancy(&self, row: usize) -> usize {
        self.data.outer_view(row).map(|v| v.nnz()).unwrap_or(0)
    }

    /// Dense copy of one taxon's counts.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_samples()];
        if let Some(view) = self.data.outer_view(row) {
            for (col, &val) in view.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Total counts per taxon.
    pub fn row_sums(&self) -> Vec<u64> {
        (0..self.n_taxa())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| val).sum())
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Library size (total counts) per sample.
    pub fn col_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.n_samples()];
        for view in self.data.outer_iterator() {
            for (col, &val) in view.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Keep only the taxa at `indices`, in that order.
    pub fn subset_taxa(&self, indices: &[usize]) -> Result<Self> {
        let mut tri = TriMat::new((indices.len(), self.n_samples()));
        let mut taxon_ids = Vec::with_capacity(indices.len());

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_taxa() {
                return Err(CooccurError::InvalidParameter(format!(
                    "Taxon index {} out of bounds",
                    old_row
                )));
            }
            taxon_ids.push(self.taxon_ids[old_row].clone());
            if let Some(view) = self.data.outer_view(old_row) {
                for (col, &val) in view.iter() {
                    tri.add_triplet(new_row, col, val);
                }
            }
        }

        Self::new(tri.to_csr(), taxon_ids, self.sample_ids.clone())
    }

    /// Keep only the samples at `indices`, in that order.
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let mut sample_ids = Vec::with_capacity(indices.len());
        for &old_col in indices {
            if old_col >= self.n_samples() {
                return Err(CooccurError::InvalidParameter(format!(
                    "Sample index {} out of bounds",
                    old_col
                )));
            }
            sample_ids.push(self.sample_ids[old_col].clone());
        }

        let col_map: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_col, &old_col)| (old_col, new_col))
            .collect();

        let mut tri = TriMat::new((self.n_taxa(), indices.len()));
        for (row, view) in self.data.outer_iterator().enumerate() {
            for (old_col, &val) in view.iter() {
                if let Some(&new_col) = col_map.get(&old_col) {
                    tri.add_triplet(row, new_col, val);
                }
            }
        }

        Self::new(tri.to_csr(), self.taxon_ids.clone(), sample_ids)
    }

    /// Keep only the named samples, in the given order.
    pub fn select_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let positions: HashMap<&str, usize> = self
            .sample_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let indices = sample_ids
            .iter()
            .map(|id| {
                positions.get(id.as_str()).copied().ok_or_else(|| {
                    CooccurError::SampleMismatch(format!(
                        "Sample '{}' not found in count table",
                        id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.subset_samples(&indices)
    }
}
