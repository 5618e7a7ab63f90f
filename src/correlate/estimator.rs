//! Pairwise dependence estimation over every organism pair of a category.
//!
//! Each unordered pair (i, j), i < j, is an independent task: a pure function
//! of the two ranked profiles. Tasks fan out over rayon and their results are
//! written into both triangles of the [`AssociationMatrix`], so symmetry holds
//! by construction.

use super::rank::RankedProfile;
use super::spearman::spearman_ranked;
use crate::data::{AssociationMatrix, PairStat};
use crate::error::{CooccurError, Result};
use crate::normalize::RelativeAbundanceMatrix;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Receives progress of the pairwise loop.
///
/// Called once per completed pair with the running count. Under parallel
/// execution calls may arrive out of order; the largest value seen is `total`.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Emits a `debug!` event every `percent_step` percent of pairs.
#[derive(Debug, Clone)]
pub struct TracingProgress {
    label: String,
    percent_step: usize,
}

impl TracingProgress {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            percent_step: 10,
        }
    }

    pub fn with_step(mut self, percent_step: usize) -> Self {
        self.percent_step = percent_step.clamp(1, 100);
        self
    }
}

impl ProgressSink for TracingProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        let stride = (total * self.percent_step / 100).max(1);
        if completed % stride == 0 || completed == total {
            tracing::debug!(
                category = %self.label,
                completed,
                total,
                "pairwise correlation progress"
            );
        }
    }
}

/// Cooperative cancellation flag shared between a caller and the estimator.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observability and execution knobs. None of them change the result.
#[derive(Clone)]
pub struct EstimatorOptions<'a> {
    pub progress: Option<&'a dyn ProgressSink>,
    pub cancel: Option<CancelToken>,
    pub parallel: bool,
}

impl Default for EstimatorOptions<'_> {
    fn default() -> Self {
        Self {
            progress: None,
            cancel: None,
            parallel: true,
        }
    }
}

impl<'a> EstimatorOptions<'a> {
    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Ranked profiles of every organism in a relative-abundance matrix.
pub fn rank_profiles(rel: &RelativeAbundanceMatrix) -> Vec<RankedProfile> {
    (0..rel.n_taxa())
        .into_par_iter()
        .map(|i| RankedProfile::new(&rel.row(i)))
        .collect()
}

/// Association of organisms `i` and `j`.
#[inline]
pub fn pair_association(profiles: &[RankedProfile], i: usize, j: usize) -> PairStat {
    spearman_ranked(&profiles[i], &profiles[j])
}

/// Number of unordered pairs among `n` organisms.
#[inline]
pub fn n_pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Compute the full Spearman association matrix of a category.
///
/// # Errors
/// [`CooccurError::Cancelled`] if the token in `options` is set before all
/// pairs have been evaluated.
pub fn estimate_associations(
    rel: &RelativeAbundanceMatrix,
    options: &EstimatorOptions<'_>,
) -> Result<AssociationMatrix> {
    let n = rel.n_taxa();
    let profiles = rank_profiles(rel);
    let n_constant = profiles.iter().filter(|p| p.constant).count();

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();
    let total = pairs.len();
    tracing::debug!(
        n_taxa = n,
        n_samples = rel.n_samples(),
        n_constant,
        n_pairs = total,
        "estimating pairwise associations"
    );

    let completed = AtomicUsize::new(0);
    let evaluate = |&(i, j): &(usize, usize)| -> Result<(usize, usize, PairStat)> {
        if let Some(token) = &options.cancel {
            if token.is_cancelled() {
                return Err(CooccurError::Cancelled {
                    completed: completed.load(Ordering::Relaxed),
                    total,
                });
            }
        }
        let stat = pair_association(&profiles, i, j);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress) = options.progress {
            progress.on_progress(done, total);
        }
        Ok((i, j, stat))
    };

    let cells: Vec<(usize, usize, PairStat)> = if options.parallel {
        pairs.par_iter().map(evaluate).collect::<Result<_>>()?
    } else {
        pairs.iter().map(evaluate).collect::<Result<_>>()?
    };

    let mut assoc = AssociationMatrix::neutral(rel.taxon_ids.clone());
    for (i, j, stat) in cells {
        assoc.set_pair(i, j, stat);
    }
    Ok(assoc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CountMatrix;
    use crate::normalize::{norm_tss, ZeroTotalPolicy};
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn relative(rows: &[Vec<u64>]) -> RelativeAbundanceMatrix {
        let n_samples = rows[0].len();
        let counts = CountMatrix::from_rows(
            rows,
            (0..rows.len()).map(|i| format!("t{}", i)).collect(),
            (0..n_samples).map(|j| format!("s{}", j)).collect(),
        )
        .unwrap();
        norm_tss(&counts, ZeroTotalPolicy::Reject).unwrap()
    }

    fn example() -> RelativeAbundanceMatrix {
        // Every sample totals 100 so proportions track counts exactly.
        relative(&[
            vec![10, 20, 30, 35, 39, 5],
            vec![11, 21, 31, 36, 40, 6],
            vec![20, 20, 20, 20, 20, 20],
            vec![59, 39, 19, 9, 1, 69],
        ])
    }

    #[test]
    fn test_matrix_is_symmetric_and_bounded() {
        let assoc = estimate_associations(&example(), &EstimatorOptions::default()).unwrap();
        assert_eq!(assoc.dim(), 4);
        assert!(assoc.is_symmetric(0.0));
        for (_, _, s) in assoc.upper_pairs() {
            assert!((-1.0..=1.0).contains(&s.coefficient));
            assert!((0.0..=1.0).contains(&s.p_value));
        }
    }

    #[test]
    fn test_perfect_pair_and_constant_taxon() {
        let assoc = estimate_associations(&example(), &EstimatorOptions::default()).unwrap();
        let s01 = assoc.get(0, 1);
        assert_relative_eq!(s01.coefficient, 1.0, epsilon = 1e-12);
        assert!(s01.p_value < 1e-6);

        for k in [0, 1, 3] {
            assert!(assoc.get(2, k).is_neutral());
            assert!(assoc.get(k, 2).is_neutral());
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let rel = example();
        let par = estimate_associations(&rel, &EstimatorOptions::default()).unwrap();
        let seq = estimate_associations(&rel, &EstimatorOptions::default().sequential()).unwrap();
        assert_eq!(par.coefficients, seq.coefficients);
        assert_eq!(par.p_values, seq.p_values);
    }

    #[test]
    fn test_progress_reaches_total() {
        let seen = Mutex::new(Vec::new());
        let sink = |done: usize, total: usize| seen.lock().unwrap().push((done, total));
        let options = EstimatorOptions::default().with_progress(&sink);
        estimate_associations(&example(), &options).unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), n_pairs(4));
        assert!(seen.iter().all(|&(_, total)| total == 6));
        assert_eq!(seen.iter().map(|&(d, _)| d).max(), Some(6));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let options = EstimatorOptions::default().with_cancel(token);
        let err = estimate_associations(&example(), &options).unwrap_err();
        assert!(matches!(err, CooccurError::Cancelled { total: 6, .. }));
    }

    #[test]
    fn test_cancel_mid_run_sequential() {
        let token = CancelToken::new();
        let trigger = token.clone();
        let sink = move |done: usize, _total: usize| {
            if done == 2 {
                trigger.cancel();
            }
        };
        let options = EstimatorOptions::default()
            .with_progress(&sink)
            .with_cancel(token)
            .sequential();
        let err = estimate_associations(&example(), &options).unwrap_err();
        assert!(matches!(
            err,
            CooccurError::Cancelled {
                completed: 2,
                total: 6
            }
        ));
    }

    #[test]
    fn test_single_taxon_has_no_pairs() {
        let rel = relative(&[vec![3, 4, 5]]);
        let assoc = estimate_associations(&rel, &EstimatorOptions::default()).unwrap();
        assert_eq!(assoc.dim(), 1);
        assert_eq!(n_pairs(1), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Small count ranges force ties. Row `constant` holds a fixed count
        /// and the last row pads every sample to 1000, so the constant row has
        /// identical proportions everywhere.
        #[test]
        fn prop_symmetric_bounded_and_neutral_for_constant(
            (n_varying, n_samples, values) in (1usize..5, 3usize..12).prop_flat_map(|(t, s)| {
                (Just(t), Just(s), prop::collection::vec(0u64..6, t * s))
            }),
            constant_at in 0usize..5,
        ) {
            let mut rows: Vec<Vec<u64>> =
                values.chunks(n_samples).map(|c| c.to_vec()).collect();
            let constant = constant_at.min(n_varying);
            rows.insert(constant, vec![100; n_samples]);
            let filler: Vec<u64> = (0..n_samples)
                .map(|j| 1000 - rows.iter().map(|r| r[j]).sum::<u64>())
                .collect();
            rows.push(filler);

            let assoc = estimate_associations(&relative(&rows), &EstimatorOptions::default())
                .unwrap();
            prop_assert_eq!(assoc.dim(), n_varying + 2);
            prop_assert!(assoc.is_symmetric(0.0));
            for (i, j, s) in assoc.upper_pairs() {
                prop_assert!((-1.0..=1.0).contains(&s.coefficient));
                prop_assert!((0.0..=1.0).contains(&s.p_value));
                if i == constant || j == constant {
                    prop_assert!(s.is_neutral());
                }
            }
        }
    }
}
