//! Pairwise association matrix between organisms.

use crate::error::{CooccurError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Coefficient and two-sided p-value for one organism pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairStat {
    pub coefficient: f64,
    pub p_value: f64,
}

impl PairStat {
    /// Placeholder for pairs whose coefficient is undefined (a constant
    /// organism, or too few samples).
    pub const NEUTRAL: PairStat = PairStat {
        coefficient: 0.0,
        p_value: 1.0,
    };

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// Organisms × organisms matrix of (coefficient, p-value) cells.
///
/// The diagonal carries no information: coefficients are stored as 0 and
/// p-values as 1 there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationMatrix {
    pub taxon_ids: Vec<String>,
    pub coefficients: DMatrix<f64>,
    pub p_values: DMatrix<f64>,
}

impl AssociationMatrix {
    /// Matrix of `n` organisms with every off-diagonal cell neutral.
    pub fn neutral(taxon_ids: Vec<String>) -> Self {
        let n = taxon_ids.len();
        Self {
            taxon_ids,
            coefficients: DMatrix::zeros(n, n),
            p_values: DMatrix::from_element(n, n, 1.0),
        }
    }

    pub fn from_parts(
        taxon_ids: Vec<String>,
        coefficients: DMatrix<f64>,
        p_values: DMatrix<f64>,
    ) -> Result<Self> {
        let n = taxon_ids.len();
        for shape in [coefficients.shape(), p_values.shape()] {
            if shape != (n, n) {
                return Err(CooccurError::DimensionMismatch {
                    expected: n,
                    actual: if shape.0 != n { shape.0 } else { shape.1 },
                });
            }
        }
        Ok(Self {
            taxon_ids,
            coefficients,
            p_values,
        })
    }

    /// Number of organisms.
    #[inline]
    pub fn dim(&self) -> usize {
        self.taxon_ids.len()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> PairStat {
        PairStat {
            coefficient: self.coefficients[(i, j)],
            p_value: self.p_values[(i, j)],
        }
    }

    /// Write one pair into both triangles.
    pub fn set_pair(&mut self, i: usize, j: usize, stat: PairStat) {
        self.coefficients[(i, j)] = stat.coefficient;
        self.coefficients[(j, i)] = stat.coefficient;
        self.p_values[(i, j)] = stat.p_value;
        self.p_values[(j, i)] = stat.p_value;
    }

    /// Upper-triangle pairs `(i, j, stat)` with `i < j`, row-major.
    pub fn upper_pairs(&self) -> impl Iterator<Item = (usize, usize, PairStat)> + '_ {
        let n = self.dim();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j, self.get(i, j))))
    }

    /// Count of off-diagonal pairs with a nonzero coefficient.
    pub fn n_nonzero_pairs(&self) -> usize {
        self.upper_pairs()
            .filter(|(_, _, s)| s.coefficient != 0.0)
            .count()
    }

    /// True when both matrices equal their transpose within `tolerance`.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        let n = self.dim();
        (0..n).all(|i| {
            ((i + 1)..n).all(|j| {
                (self.coefficients[(i, j)] - self.coefficients[(j, i)]).abs() <= tolerance
                    && (self.p_values[(i, j)] - self.p_values[(j, i)]).abs() <= tolerance
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_matrix() {
        let m = AssociationMatrix::neutral(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(m.dim(), 3);
        assert!(m.get(0, 2).is_neutral());
        assert_eq!(m.n_nonzero_pairs(), 0);
        assert!(m.is_symmetric(0.0));
    }

    #[test]
    fn test_set_pair_mirrors() {
        let mut m = AssociationMatrix::neutral(vec!["a".into(), "b".into(), "c".into()]);
        m.set_pair(0, 2, PairStat { coefficient: 0.7, p_value: 0.01 });
        assert_eq!(m.get(2, 0).coefficient, 0.7);
        assert_eq!(m.get(2, 0).p_value, 0.01);
        assert_eq!(m.n_nonzero_pairs(), 1);

        let pairs: Vec<_> = m.upper_pairs().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_from_parts_shape_check() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let bad = AssociationMatrix::from_parts(ids, DMatrix::zeros(2, 3), DMatrix::zeros(2, 2));
        assert!(bad.is_err());
    }
}
