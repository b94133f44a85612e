use connectors::error::DbError;
use engine_processing::error::{ConversionError, ProcessingError, SinkError};
use model::error::ModelError;
use thiserror::Error;

/// Errors surfaced by a load. The first failure ends the load; statements
/// already committed stay committed.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Rejected before any destination call was made.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The table's presence conflicts with the exists policy.
    #[error("Table {table} {reason}")]
    DestinationState { table: String, reason: &'static str },

    #[error("Statement on {table} failed: {statement}: {source}")]
    DdlExecution {
        table: String,
        statement: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to convert column '{column}' at row {row} of batch {batch} for {table}: {source}")]
    Conversion {
        table: String,
        batch: u64,
        row: u64,
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error("Bulk transfer of batch {batch} into {table} failed: {source}")]
    BulkTransfer {
        table: String,
        batch: u64,
        #[source]
        source: SinkError,
    },

    /// Existence or metadata queries failed.
    #[error("Destination error on {table}: {source}")]
    Destination {
        table: String,
        #[source]
        source: DbError,
    },

    #[error("Row source failed in batch {batch} for {table}: {source}")]
    Source {
        table: String,
        batch: u64,
        #[source]
        source: ModelError,
    },

    /// A batch builder panicked or was cancelled.
    #[error("Worker for batch {batch} of {table} did not complete: {reason}")]
    Worker {
        table: String,
        batch: u64,
        reason: String,
    },
}

impl LoadError {
    /// Attaches the table name to a pipeline failure.
    pub fn from_processing(table: &str, err: ProcessingError) -> Self {
        let table = table.to_string();
        match err {
            ProcessingError::InvalidConfig(msg) => LoadError::InvalidConfiguration(msg),
            ProcessingError::Conversion {
                batch,
                row,
                column,
                source,
            } => LoadError::Conversion {
                table,
                batch,
                row,
                column,
                source,
            },
            ProcessingError::Source { batch, source } => LoadError::Source {
                table,
                batch,
                source,
            },
            ProcessingError::Sink { batch, source } => LoadError::BulkTransfer {
                table,
                batch,
                source,
            },
            ProcessingError::Worker { batch, reason } => LoadError::Worker {
                table,
                batch,
                reason,
            },
        }
    }

    /// True for errors raised before the destination was touched.
    pub fn is_configuration(&self) -> bool {
        matches!(self, LoadError::InvalidConfiguration(_))
    }
}
