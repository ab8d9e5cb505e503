use thiserror::Error;

/// Convenience alias used throughout the data layer.
pub type Result<T, E = DataError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// DataError – everything the pipeline can refuse to do
// ---------------------------------------------------------------------------

/// Errors raised by the data pipeline.
///
/// Empty results are values, not errors: filtering or aggregating down to
/// zero rows returns an empty structure. Every variant here is terminal for
/// the operation that raised it and leaves any already-loaded dataset intact.
#[derive(Debug, Error)]
pub enum DataError {
    /// Source file missing, unreadable, or structurally malformed
    /// (missing column, unknown enum value, bad cell type).
    #[error("load error: {0}")]
    Load(String),

    /// A timestamp cell could not be parsed. The whole load is rejected so
    /// a partial dataset is never observable.
    #[error("parse error: {0}")]
    Parse(String),

    /// A derived field fell outside its legal range.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was requested with too little input to be meaningful.
    #[error("insufficient input: {0}")]
    InsufficientInput(String),
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Load(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Load(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Load(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for DataError {
    fn from(err: arrow::error::ArrowError) -> Self {
        DataError::Load(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for DataError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        DataError::Load(err.to_string())
    }
}
