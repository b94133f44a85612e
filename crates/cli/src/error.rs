use connectors::{
    error::{ConnectorError, DbError},
    file::csv::error::FileError,
};
use engine_runtime::error::LoadError;
use planner::error::PlanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read a file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to read the CSV input: {0}")]
    Csv(#[from] FileError),

    #[error("Failed to deserialize the options file as JSON: {0}")]
    OptionsDeserialize(#[from] serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid env file: {0}")]
    Config(String),

    #[error("Failed to connect: {0}")]
    Connect(#[from] ConnectorError),

    /// SQL Server driver error.
    #[error("SQL Server error: {0}")]
    Database(#[from] DbError),

    #[error("Failed to plan the table: {0}")]
    Plan(#[from] PlanError),

    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
