//! Data structures for co-occurrence network analysis.

mod association;
mod count_matrix;
mod metadata;
mod result;

pub use association::{AssociationMatrix, PairStat};
pub use count_matrix::CountMatrix;
pub use metadata::{Metadata, Variable, VariableType};
pub use result::{CategoryStatus, ComparisonRow, ComparisonTable, Metric, TopologyRecord};
