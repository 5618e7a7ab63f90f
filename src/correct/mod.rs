//! Multiple testing correction for the pairwise association tests.

pub mod bh;

pub use bh::{adjust_associations, correct_bh, PAdjust};
