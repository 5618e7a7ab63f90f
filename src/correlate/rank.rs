//! Ranking with averaged ties.

/// 1-based ranks of `values`, ties receiving the mean of the ranks they span.
///
/// Ordering uses `f64::total_cmp` and a stable sort, so the result depends only
/// on the input values.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]].total_cmp(&values[order[start]]).is_eq() {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// An organism's ranked profile across the samples of one category.
#[derive(Debug, Clone)]
pub struct RankedProfile {
    pub ranks: Vec<f64>,
    /// Rank mean, cached for the correlation sums.
    pub mean: f64,
    /// True when every value ties, leaving the ranks with zero variance.
    pub constant: bool,
}

impl RankedProfile {
    pub fn new(values: &[f64]) -> Self {
        let ranks = average_ranks(values);
        let n = ranks.len();
        let mean = if n == 0 {
            0.0
        } else {
            ranks.iter().sum::<f64>() / n as f64
        };
        let constant = values.windows(2).all(|w| w[0].total_cmp(&w[1]).is_eq());
        Self {
            ranks,
            mean,
            constant,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
