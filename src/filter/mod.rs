//! Upstream guards applied to a category's counts before normalization.

pub mod library_size;
pub mod prevalence;

pub use library_size::{drop_empty_samples, filter_library_size};
pub use prevalence::{filter_prevalence, FilterResult};
