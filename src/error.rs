//! Error types for the cooccur-net library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum CooccurError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid count value '{value}' at row {row}, column {col}")]
    InvalidCount {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Sample ID mismatch: {0}")]
    SampleMismatch(String),

    #[error("Missing column '{0}' in metadata")]
    MissingColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Arithmetic that would produce an undefined value, such as dividing by
    /// a zero sample total.
    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The cleaned association matrix is not exactly symmetric.
    ///
    /// Averaging a cell with its transpose cannot leave an asymmetric result in
    /// IEEE arithmetic, so this always points at a logic or precision defect.
    #[error(
        "Association matrix not symmetric at ({row}, {col}): {upper} != {lower}"
    )]
    SymmetryViolation {
        row: usize,
        col: usize,
        upper: f64,
        lower: f64,
    },

    #[error("Pairwise estimation cancelled after {completed} of {total} pairs")]
    Cancelled { completed: usize, total: usize },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, CooccurError>;
