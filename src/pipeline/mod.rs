//! Pipeline composition and the multi-category comparator.

mod compare;
mod config;
mod output;
mod runner;

pub use compare::{compare_categories, NetworkComparison};
pub use config::NetworkConfig;
pub use output::CategoryNetwork;
pub use runner::NetworkPipeline;
