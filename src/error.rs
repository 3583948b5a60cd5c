//! Error types for the parsing, splitting and export layers.

use thiserror::Error;

/// The ARFF text yielded no usable data rows.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no data rows parsed: {cause}")]
    NoDataRows { cause: String },
}

impl ParseError {
    pub fn no_data_rows(cause: impl Into<String>) -> Self {
        Self::NoDataRows {
            cause: cause.into(),
        }
    }
}

/// Errors raised while partitioning a table.
#[derive(Debug, Error)]
pub enum SplitError {
    /// A split fraction outside the open interval (0, 1).
    #[error("invalid {name}: {value} (must be in (0, 1))")]
    InvalidFraction { name: &'static str, value: f64 },

    /// Stratification cannot put every stratum into every group.
    /// Only raised under the strict policy.
    #[error("cannot stratify on '{column}': {reason}")]
    Stratification { column: String, reason: String },
}

/// Errors raised while writing split subsets to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
