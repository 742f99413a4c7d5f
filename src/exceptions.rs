//! ## Custom Errors for Tabular Prep
//!
//! This module defines the error type shared by every part of the library.
//! It uses the `thiserror` crate to derive the `Error` trait.
//! The `TabularPrepError` enum covers both the wrapped errors of the Arrow/DataFusion stack and
//! the column and shape problems the preprocessing pipeline detects before doing any work.
//!
//! The `TabularPrepResult` type alias is the result type returned throughout the library.
//!
//! ### Example
//!
//! ```rust
//! use tabular_prep::exceptions::{TabularPrepError, TabularPrepResult};
//!
//! fn require_target(columns: &[&str]) -> TabularPrepResult<()> {
//!     if columns.contains(&"target") {
//!         Ok(())
//!     } else {
//!         Err(TabularPrepError::MissingColumn("target".into()))
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Tabular Prep library.
#[derive(Debug, Error)]
pub enum TabularPrepError {
    /// Wraps underlying I/O errors.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    /// Wraps errors from Parquet.
    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    /// Indicates that an invalid parameter was provided (e.g., zero neighbours or a null id).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Indicates that the provided data format is unsupported (e.g., unknown file extension).
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Indicates that a requested column does not exist in the dataset.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Indicates that the id column holds the same value more than once.
    #[error("Duplicate index value '{value}' in column '{column}'")]
    DuplicateIndex { column: String, value: String },

    /// Indicates that no feature column is left after dropping the target, id and drop columns.
    #[error("Empty feature set: no feature columns left after dropping target, id and drop columns")]
    EmptyFeatureSet,

    /// Indicates that a column's values are neither numeric nor categorical.
    #[error("Type mismatch in column '{column}': {data_type} is neither numeric nor categorical")]
    TypeMismatch { column: String, data_type: String },

    /// Indicates that a category was not seen when the encoding was fit.
    #[error("Unseen category '{value}' in column '{column}'")]
    UnseenCategory { column: String, value: String },

    /// Indicates that a dataset's columns disagree with the columns an artifact was fit on.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// A convenient result type for Tabular Prep operations.
pub type TabularPrepResult<T> = std::result::Result<T, TabularPrepError>;
