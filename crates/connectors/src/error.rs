use std::string::FromUtf8Error;
use thiserror::Error;

/// All errors coming from the database layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any error reported by the TDS driver or the server.
    #[error("SQL error: {0}")]
    Sql(#[from] tiberius::error::Error),

    /// UTF-8 decoding failed on some byte data.
    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// A value could not be encoded for its destination column.
    #[error("Cannot encode value for column '{column}': {reason}")]
    Encode { column: String, reason: String },

    /// The destination reported metadata we cannot work with.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Writing rows to the database failed at the application level.
    #[error("Write error: {0}")]
    Write(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    /// TCP connect failed.
    #[error("Connection failed: {0}")]
    Io(#[from] std::io::Error),

    /// The TDS handshake or login failed.
    #[error("Login failed: {0}")]
    Handshake(#[from] tiberius::error::Error),
}
