//! Message sources for topic navigation

pub mod config;
pub mod index;
pub mod sources;
pub mod window;

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;
use tl_core::SourceError;

// Re-exports
pub use config::WindowConfig;
pub use index::MessageIndex;
pub use sources::{RangeSource, RecordBatchSource, TopicStats, WindowedSource};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has unsupported type {data_type}")]
    ColumnType { column: String, data_type: DataType },

    #[error("Invalid time in row {row}: {reason}")]
    InvalidTime { row: usize, reason: String },

    #[error("Other error: {0}")]
    Other(String),
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}

impl From<DataError> for SourceError {
    fn from(error: DataError) -> Self {
        SourceError::Other(error.to_string())
    }
}
