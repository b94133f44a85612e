use model::core::data_type::SourceType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// The source column type has no SQL Server counterpart.
    #[error("Unsupported source type {dtype} for column '{column}'")]
    UnsupportedType { column: String, dtype: SourceType },

    /// A table definition without any column cannot be created.
    #[error("Cannot create table {0} without columns")]
    NoColumns(String),
}
