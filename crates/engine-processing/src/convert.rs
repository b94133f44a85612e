//! Per-cell conversion from source values to destination wire values.

use crate::error::ConversionError;
use bigdecimal::BigDecimal;
use chrono::DateTime;
use model::core::{
    column::{ColumnCategory, ColumnDescriptor},
    value::Value,
};
use std::str::FromStr;

/// Converts one source cell for the destination column it is written to.
///
/// Cells without a descriptor, and cells of columns that need no special
/// treatment, pass through unchanged. Null is null for every column.
pub fn convert(value: Value, column: Option<&ColumnDescriptor>) -> Result<Value, ConversionError> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let Some(column) = column else {
        return Ok(value);
    };

    match column.category() {
        ColumnCategory::Bit => Ok(Value::Int(i64::from(value.is_truthy()))),
        ColumnCategory::Decimal { precision, scale } => to_decimal(value, precision, scale),
        ColumnCategory::Temporal(_) => to_temporal(value, column),
        ColumnCategory::Generic => Ok(value),
    }
}

fn to_decimal(value: Value, precision: u8, scale: u8) -> Result<Value, ConversionError> {
    let parsed = match &value {
        Value::Decimal(_) => return Ok(value),
        Value::Int(v) => Some(BigDecimal::from(*v)),
        Value::Uint(v) => Some(BigDecimal::from(*v)),
        // Shortest round-trip text, so 0.1 stays 0.1 instead of its binary expansion.
        Value::Float(v) if v.is_finite() => {
            BigDecimal::from_str(ryu::Buffer::new().format_finite(*v)).ok()
        }
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    };

    match parsed {
        Some(decimal) => Ok(Value::Decimal(decimal)),
        None => Err(ConversionError::Decimal {
            value,
            precision,
            scale,
        }),
    }
}

fn to_temporal(value: Value, column: &ColumnDescriptor) -> Result<Value, ConversionError> {
    let nanos = match &value {
        Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => return Ok(value),
        Value::Int(v) => Some(*v),
        Value::Uint(v) => Some(i64::try_from(*v).map_err(|_| ConversionError::TimestampRange {
            value: value.clone(),
        })?),
        Value::Float(v) if v.is_finite() => {
            if *v < i64::MIN as f64 || *v >= i64::MAX as f64 {
                return Err(ConversionError::TimestampRange { value });
            }
            Some(*v as i64)
        }
        _ => None,
    };

    match nanos {
        Some(nanos) => Ok(Value::Timestamp(
            DateTime::from_timestamp_nanos(nanos).naive_utc(),
        )),
        None => Err(ConversionError::Temporal {
            value,
            target: column.sql_type.clone(),
        }),
    }
}
