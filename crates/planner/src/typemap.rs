//! Maps source column types onto SQL Server column types.

use crate::{
    error::PlanError,
    query::ast::create_table::{ColumnDef, StringLength, TypeModifier},
};
use model::{
    core::data_type::{SourceType, SqlType},
    records::source::Field,
};
use std::collections::HashMap;

/// Longest bounded NVARCHAR SQL Server accepts.
pub const MAX_BOUNDED_NVARCHAR: usize = 4000;

/// Length used for string columns that only hold nulls.
pub const DEFAULT_NULL_STRING_LENGTH: usize = 50;

/// Decides the declared length of a string column.
pub trait StringSizing: Send + Sync {
    fn size(&self, field: &Field) -> StringLength;
}

/// Default sizing: explicit overrides first, then the longest observed value.
#[derive(Debug, Clone, Default)]
pub struct SampledStringSizing {
    overrides: HashMap<String, usize>,
}

impl SampledStringSizing {
    pub fn new(overrides: HashMap<String, usize>) -> Self {
        Self { overrides }
    }
}

impl StringSizing for SampledStringSizing {
    fn size(&self, field: &Field) -> StringLength {
        if let Some(&length) = self.overrides.get(&field.name) {
            return StringLength::Bounded(length);
        }

        if field.stats.non_null_count == 0 {
            return StringLength::Bounded(DEFAULT_NULL_STRING_LENGTH);
        }

        match field.stats.max_char_len {
            Some(len) if len <= MAX_BOUNDED_NVARCHAR => StringLength::Bounded(len.max(1)),
            _ => StringLength::Max,
        }
    }
}

/// Every string column becomes `NVARCHAR(MAX)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnboundedStringSizing;

impl StringSizing for UnboundedStringSizing {
    fn size(&self, _field: &Field) -> StringLength {
        StringLength::Max
    }
}

/// Maps one source field to a nullable destination column definition.
pub fn map_field(field: &Field, sizing: &dyn StringSizing) -> Result<ColumnDef, PlanError> {
    let (data_type, modifier) = match &field.dtype {
        SourceType::Int8 | SourceType::UInt8 => (SqlType::TinyInt, TypeModifier::None),
        SourceType::Int16 | SourceType::UInt16 => (SqlType::SmallInt, TypeModifier::None),
        SourceType::Int32 | SourceType::UInt32 => (SqlType::Int, TypeModifier::None),
        SourceType::Int64 | SourceType::UInt64 => (SqlType::BigInt, TypeModifier::None),
        SourceType::Float32 => (SqlType::Real, TypeModifier::None),
        SourceType::Float64 => (SqlType::Float, TypeModifier::None),
        SourceType::Boolean => (SqlType::Bit, TypeModifier::None),
        SourceType::Datetime => (SqlType::DateTime2, TypeModifier::None),
        SourceType::Date => (SqlType::Date, TypeModifier::None),
        SourceType::Time => (SqlType::Time, TypeModifier::None),
        SourceType::Duration => (SqlType::BigInt, TypeModifier::None),
        SourceType::Decimal { precision, scale } => (
            SqlType::Decimal,
            TypeModifier::Precision {
                precision: *precision,
                scale: *scale,
            },
        ),
        SourceType::Binary => (
            SqlType::VarBinary,
            TypeModifier::Length(StringLength::Max),
        ),
        SourceType::Utf8 | SourceType::Categorical => (
            SqlType::NVarChar,
            TypeModifier::Length(sizing.size(field)),
        ),
        SourceType::Uuid => (SqlType::UniqueIdentifier, TypeModifier::None),
        SourceType::Null => (
            SqlType::NVarChar,
            TypeModifier::Length(StringLength::Bounded(1)),
        ),
        SourceType::Object(_) => {
            return Err(PlanError::UnsupportedType {
                column: field.name.clone(),
                dtype: field.dtype.clone(),
            });
        }
    };

    Ok(ColumnDef {
        name: field.name.clone(),
        data_type,
        modifier,
        is_nullable: true,
    })
}
