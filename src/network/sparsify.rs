//! Significance and strength filtering of an association matrix.
//!
//! Only strong, significant, positive co-occurrences survive. The cleaned
//! matrix is symmetric with a zero diagonal; anything else is a fatal
//! [`CooccurError::SymmetryViolation`].

use crate::data::AssociationMatrix;
use crate::error::{CooccurError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Cutoffs for retaining an association.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparsifyConfig {
    /// Minimum |coefficient| to keep.
    pub min_coefficient: f64,
    /// Maximum p-value (or q-value) to keep.
    pub alpha: f64,
}

impl Default for SparsifyConfig {
    fn default() -> Self {
        Self {
            min_coefficient: 0.6,
            alpha: 0.05,
        }
    }
}

impl SparsifyConfig {
    pub fn new(min_coefficient: f64, alpha: f64) -> Self {
        Self {
            min_coefficient,
            alpha,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_coefficient) {
            return Err(CooccurError::InvalidParameter(format!(
                "Coefficient cutoff must be between 0 and 1, got {}",
                self.min_coefficient
            )));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(CooccurError::InvalidParameter(format!(
                "Significance level must be between 0 and 1, got {}",
                self.alpha
            )));
        }
        Ok(())
    }

    /// Whether a single cell passes. NaN never passes.
    #[inline]
    pub fn keeps(&self, coefficient: f64, p_value: f64) -> bool {
        coefficient > 0.0
            && coefficient.abs() >= self.min_coefficient
            && p_value <= self.alpha
            && coefficient.is_finite()
    }
}

/// Fail unless `m` is exactly symmetric.
pub fn check_symmetry(m: &DMatrix<f64>) -> Result<()> {
    if m.nrows() != m.ncols() {
        return Err(CooccurError::DimensionMismatch {
            expected: m.nrows(),
            actual: m.ncols(),
        });
    }
    for i in 0..m.nrows() {
        for j in (i + 1)..m.ncols() {
            let (upper, lower) = (m[(i, j)], m[(j, i)]);
            // NaN != NaN, so a NaN anywhere is a violation too
            if upper != lower {
                return Err(CooccurError::SymmetryViolation {
                    row: i,
                    col: j,
                    upper,
                    lower,
                });
            }
        }
    }
    Ok(())
}

/// Zero every association that is negative, weak, or not significant.
///
/// Cells are thresholded on their original signed values, non-finite results
/// are zeroed, the matrix is averaged with its transpose and the diagonal is
/// cleared. An averaged pair that no longer passes the cutoffs is dropped, so
/// an asymmetric input cannot leave a weak edge behind. P-values of the
/// result are carried over for kept cells and set to 1 elsewhere.
pub fn sparsify(assoc: &AssociationMatrix, config: &SparsifyConfig) -> Result<AssociationMatrix> {
    config.validate()?;

    let n = assoc.dim();
    let mut coefficients = DMatrix::zeros(n, n);
    let mut p_values = DMatrix::from_element(n, n, 1.0);

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let r = assoc.coefficients[(i, j)];
            let p = assoc.p_values[(i, j)];
            if config.keeps(r, p) {
                coefficients[(i, j)] = r;
                p_values[(i, j)] = p;
            }
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let mut r = (coefficients[(i, j)] + coefficients[(j, i)]) / 2.0;
            let mut p = p_values[(i, j)].max(p_values[(j, i)]);
            if !config.keeps(r, p) {
                r = 0.0;
                p = 1.0;
            }
            coefficients[(i, j)] = r;
            coefficients[(j, i)] = r;
            p_values[(i, j)] = p;
            p_values[(j, i)] = p;
        }
    }

    check_symmetry(&coefficients)?;

    let cleaned = AssociationMatrix::from_parts(assoc.taxon_ids.clone(), coefficients, p_values)?;
    tracing::debug!(
        min_coefficient = config.min_coefficient,
        alpha = config.alpha,
        pairs_before = assoc.n_nonzero_pairs(),
        pairs_after = cleaned.n_nonzero_pairs(),
        "sparsified association matrix"
    );
    Ok(cleaned)
}
