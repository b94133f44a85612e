use crate::error::DbError;
use model::core::{column::ColumnDescriptor, data_type::SqlType};
use tiberius::Row;

pub const COL_NAME: &str = "column_name";
pub const COL_DATA_TYPE: &str = "data_type";
pub const COL_PRECISION: &str = "numeric_precision";
pub const COL_SCALE: &str = "numeric_scale";
pub const COL_MAX_LENGTH: &str = "max_length";
pub const COL_IS_NULLABLE: &str = "is_nullable";
pub const COL_IS_WRITABLE: &str = "is_writable";

/// Builds a descriptor from one row of the column metadata query.
pub fn descriptor_from_row(row: &Row) -> Result<ColumnDescriptor, DbError> {
    let name = row
        .try_get::<&str, _>(COL_NAME)?
        .ok_or_else(|| DbError::InvalidMetadata("column without a name".into()))?;
    let data_type = row
        .try_get::<&str, _>(COL_DATA_TYPE)?
        .ok_or_else(|| DbError::InvalidMetadata(format!("column '{name}' has no type")))?;

    let sql_type = SqlType::from_mssql_type(data_type);
    let mut descriptor = ColumnDescriptor::new(name, sql_type);

    if descriptor.sql_type.supports_precision() {
        let precision = row.try_get::<i32, _>(COL_PRECISION)?;
        let scale = row.try_get::<i32, _>(COL_SCALE)?;
        if let (Some(precision), Some(scale)) = (precision, scale) {
            descriptor = descriptor.with_precision(narrow(name, precision)?, narrow(name, scale)?);
        }
    }

    if let Some(max_length) = row.try_get::<i32, _>(COL_MAX_LENGTH)? {
        descriptor = descriptor.with_max_length(max_length);
    }

    if !row.try_get::<bool, _>(COL_IS_NULLABLE)?.unwrap_or(true) {
        descriptor = descriptor.not_null();
    }

    if !row.try_get::<bool, _>(COL_IS_WRITABLE)?.unwrap_or(true) {
        descriptor = descriptor.read_only();
    }

    Ok(descriptor)
}

fn narrow(column: &str, value: i32) -> Result<u8, DbError> {
    u8::try_from(value).map_err(|_| {
        DbError::InvalidMetadata(format!(
            "column '{column}' reports out of range precision or scale {value}"
        ))
    })
}
