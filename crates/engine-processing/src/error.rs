use connectors::error::DbError;
use model::{
    core::{data_type::SqlType, value::Value},
    error::ModelError,
};
use thiserror::Error;

/// A single cell could not be converted for its destination column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Value {value:?} cannot be stored in a DECIMAL({precision},{scale}) column")]
    Decimal {
        value: Value,
        precision: u8,
        scale: u8,
    },

    #[error("Value {value:?} cannot be stored in a {target} column")]
    Temporal { value: Value, target: SqlType },

    #[error("Value {value:?} is out of range as nanoseconds since the Unix epoch")]
    TimestampRange { value: Value },
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Bulk copy into {table} failed: {source}")]
    BulkCopy {
        table: String,
        #[source]
        source: DbError,
    },
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to convert column '{column}' at row {row} (batch {batch}): {source}")]
    Conversion {
        batch: u64,
        row: u64,
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("Row source failed while filling batch {batch}: {source}")]
    Source {
        batch: u64,
        #[source]
        source: ModelError,
    },

    #[error("Failed to deliver batch {batch}: {source}")]
    Sink {
        batch: u64,
        #[source]
        source: SinkError,
    },

    #[error("Worker for batch {batch} did not complete: {reason}")]
    Worker { batch: u64, reason: String },
}

impl ProcessingError {
    /// Index of the batch the error belongs to, when there is one.
    pub fn batch(&self) -> Option<u64> {
        match self {
            ProcessingError::InvalidConfig(_) => None,
            ProcessingError::Conversion { batch, .. }
            | ProcessingError::Source { batch, .. }
            | ProcessingError::Sink { batch, .. }
            | ProcessingError::Worker { batch, .. } => Some(*batch),
        }
    }
}
