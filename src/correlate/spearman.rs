//! Spearman rank correlation with a two-sided significance test.
//!
//! The coefficient is Pearson's r computed on averaged ranks, which handles
//! ties exactly. Significance uses the Student t approximation
//!
//! ```text
//! t = r · sqrt((n − 2) / (1 − r²)),   df = n − 2
//! ```
//!
//! Pairs where either profile is constant, or with fewer than three samples,
//! have no defined coefficient and yield [`PairStat::NEUTRAL`].

use super::rank::RankedProfile;
use crate::data::PairStat;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Smallest sample size for which the t approximation has a degree of freedom.
pub const MIN_SAMPLES: usize = 3;

/// Correlate two ranked profiles of equal length.
pub fn spearman_ranked(x: &RankedProfile, y: &RankedProfile) -> PairStat {
    let n = x.len();
    if n != y.len() || n < MIN_SAMPLES || x.constant || y.constant {
        return PairStat::NEUTRAL;
    }

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&rx, &ry) in x.ranks.iter().zip(&y.ranks) {
        let dx = rx - x.mean;
        let dy = ry - y.mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return PairStat::NEUTRAL;
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    if !r.is_finite() {
        return PairStat::NEUTRAL;
    }

    PairStat {
        coefficient: r,
        p_value: two_sided_p(r, n),
    }
}

/// Correlate two raw value vectors.
pub fn spearman(x: &[f64], y: &[f64]) -> PairStat {
    spearman_ranked(&RankedProfile::new(x), &RankedProfile::new(y))
}

/// Two-sided p-value of a correlation `r` over `n` observations.
pub fn two_sided_p(r: f64, n: usize) -> f64 {
    if n < MIN_SAMPLES {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return 0.0;
    }
    let t = r * (df / denom).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
