use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// Columns of a table do not all have the same number of values.
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name (compared case-insensitively).
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// The underlying row source failed while producing a row.
    #[error("Row source error: {0}")]
    Source(String),
}
