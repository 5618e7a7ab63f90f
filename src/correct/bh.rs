//! Benjamini-Hochberg false discovery rate correction.

use crate::data::AssociationMatrix;
use serde::{Deserialize, Serialize};

/// P-value adjustment applied to the pairwise tests before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PAdjust {
    /// Raw p-values.
    #[default]
    None,
    BenjaminiHochberg,
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// For p-values sorted ascending, q[i] = min(p[i] · n / rank[i], q[i+1]),
/// capped at 1. Returned q-values are in the original order.
pub fn correct_bh(p_values: &[f64]) -> Vec<f64> {
    let n = p_values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let n_f64 = n as f64;
    let mut q_sorted = vec![0.0; n];
    q_sorted[n - 1] = p_values[order[n - 1]].min(1.0);
    for i in (0..n - 1).rev() {
        let adjusted = p_values[order[i]] * n_f64 / (i + 1) as f64;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    let mut q_values = vec![0.0; n];
    for (rank, &idx) in order.iter().enumerate() {
        q_values[idx] = q_sorted[rank];
    }
    q_values
}

/// Replace the p-values of an association matrix with BH q-values.
///
/// The family is the set of upper-triangle pairs; adjusted values are
/// written into both triangles.
pub fn adjust_associations(assoc: &mut AssociationMatrix, method: PAdjust) {
    if method == PAdjust::None {
        return;
    }

    let pairs: Vec<(usize, usize, f64)> = assoc
        .upper_pairs()
        .map(|(i, j, s)| (i, j, s.p_value))
        .collect();
    let raw: Vec<f64> = pairs.iter().map(|&(_, _, p)| p).collect();
    let adjusted = correct_bh(&raw);

    for (&(i, j, _), q) in pairs.iter().zip(adjusted) {
        assoc.p_values[(i, j)] = q;
        assoc.p_values[(j, i)] = q;
    }
}
