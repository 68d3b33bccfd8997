use std::path::PathBuf;
use thiserror::Error;

/// Error type for grid-mapper operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("projection setup failed: {0}")]
    ProjCreate(#[from] proj::ProjCreateError),

    #[error("projection transform failed: {0}")]
    Proj(#[from] proj::ProjError),

    #[error("coordinate length mismatch: {x_len} x values vs {y_len} y values")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("non-numeric value in column '{column}' at row {row}")]
    NonNumericValue { column: String, row: usize },

    #[error("empty prediction file: {0}")]
    EmptyPredictionFile(PathBuf),

    #[error("malformed prediction line in {path}: {line:?}")]
    MalformedPredictionLine { path: PathBuf, line: String },

    #[error("prediction file name is not <integer>.txt: {0}")]
    InvalidPredictionFileName(PathBuf),

    #[error("class index {index} out of range for {fields} fields in {path}")]
    ClassIndexOutOfRange {
        index: usize,
        fields: usize,
        path: PathBuf,
    },

    #[error("table is not valid JSON records (expected an array of objects)")]
    InvalidRecords,
}

/// Result type alias for grid-mapper operations
pub type Result<T> = std::result::Result<T, Error>;
