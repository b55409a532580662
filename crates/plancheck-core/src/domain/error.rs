//! Domain-level error taxonomy for plancheck.
//!
//! Only caller mistakes and unusable reference data surface here. Plan
//! defects are ordinary `FAIL` verdicts and malformed truth cells are
//! `TRUTH TABLE ERROR` verdicts; neither is an error.

/// Plancheck domain errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanCheckError {
    #[error("invalid case number {case}: must be between 1 and {cases}")]
    InvalidCaseNumber { case: usize, cases: usize },

    #[error("truth table is missing column: {0}")]
    MissingColumn(String),

    #[error("truth table column {column} has {actual} cells, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("truth table has no cases")]
    EmptyTruthTable,

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for plancheck domain operations.
pub type Result<T> = std::result::Result<T, PlanCheckError>;
