use crate::core::data_type::SourceType;
use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use uuid::Uuid;

/// A single dynamically typed cell, as read from a source table or as
/// prepared for the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Boolean(bool),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.trim().parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Uint(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Decimal(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Uuid(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Time(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_string()),
            Value::Bytes(_) | Value::Null => None,
        }
    }

    /// Truthiness of a cell: zero, empty and null are false, everything else
    /// is true. NaN counts as true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Uint(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Decimal(v) => !v.is_zero(),
            Value::String(v) => !v.is_empty(),
            Value::Boolean(v) => *v,
            Value::Uuid(_) => true,
            Value::Bytes(v) => !v.is_empty(),
            Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => true,
            Value::Null => false,
        }
    }

    /// Number of characters for string cells, used by string sizing.
    pub fn char_len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            Value::Int(_) => SourceType::Int64,
            Value::Uint(_) => SourceType::UInt64,
            Value::Float(_) => SourceType::Float64,
            Value::Decimal(d) => {
                let (digits, exponent) = d.as_bigint_and_exponent();
                let mut precision = digits.to_string().trim_start_matches('-').len() as i64;
                if exponent < 0 {
                    precision -= exponent;
                }
                let scale = exponent.clamp(0, 38) as u8;
                SourceType::Decimal {
                    precision: (precision.clamp(1, 38) as u8).max(scale),
                    scale,
                }
            }
            Value::String(_) => SourceType::Utf8,
            Value::Boolean(_) => SourceType::Boolean,
            Value::Uuid(_) => SourceType::Uuid,
            Value::Bytes(_) => SourceType::Binary,
            Value::Date(_) => SourceType::Date,
            Value::Time(_) => SourceType::Time,
            Value::Timestamp(_) => SourceType::Datetime,
            Value::Null => SourceType::Null,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            Value::Int(_) => std::mem::size_of::<i64>(),
            Value::Uint(_) => std::mem::size_of::<u64>(),
            Value::Float(_) => std::mem::size_of::<f64>(),
            Value::Decimal(d) => d.digits() as usize / 2 + 1,
            Value::String(s) => s.len(),
            Value::Boolean(_) => std::mem::size_of::<bool>(),
            Value::Uuid(_) => 16,
            Value::Bytes(b) => b.len(),
            Value::Date(_) => std::mem::size_of::<NaiveDate>(),
            Value::Time(_) => std::mem::size_of::<NaiveTime>(),
            Value::Timestamp(_) => std::mem::size_of::<NaiveDateTime>(),
            Value::Null => 0,
        }
    }
}

/// A named cell inside a [`RowData`](crate::records::row::RowData).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: Arc<str>,
    pub value: Value,
}

impl FieldValue {
    pub fn new(name: impl Into<Arc<str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{}", u8::from(*v)),
            Value::Uuid(v) => write!(f, "'{v}'"),
            Value::Bytes(v) => {
                let hex = v
                    .iter()
                    .fold(String::new(), |acc, byte: &u8| acc + &format!("{byte:02X}"));
                write!(f, "0x{hex}")
            }
            Value::Date(v) => write!(f, "'{v}'"),
            Value::Time(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_value! {
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f32 => Float,
    f64 => Float,
    bool => Boolean,
    String => String,
    &str => String,
    BigDecimal => Decimal,
    Uuid => Uuid,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
