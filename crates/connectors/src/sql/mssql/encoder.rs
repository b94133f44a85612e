use crate::error::DbError;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use chrono::{DateTime as ChronoDateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use model::core::{column::ColumnDescriptor, data_type::SqlType, value::Value};
use std::{borrow::Cow, fmt, str::FromStr};
use tiberius::{
    ColumnData, IntoSql,
    numeric::Numeric,
    time::{DateTime, SmallDateTime},
};
use uuid::Uuid;

/// Encodes converted cells into TDS column data for a bulk load.
///
/// The encoder trusts the value converter for the coarse shape of each cell
/// and only narrows it to the exact width of the destination column.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlValueEncoder;

impl MssqlValueEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_value(
        &self,
        column: &ColumnDescriptor,
        value: &Value,
    ) -> Result<ColumnData<'static>, DbError> {
        if value.is_null() {
            return Ok(self.encode_null(column));
        }

        let encoded = match &column.sql_type {
            SqlType::Bit => ColumnData::Bit(Some(value.is_truthy())),
            SqlType::TinyInt => {
                let v = integer(column, value)?;
                ColumnData::U8(Some(narrow::<u8, _>(column, v)?))
            }
            SqlType::SmallInt => {
                let v = integer(column, value)?;
                ColumnData::I16(Some(narrow::<i16, _>(column, v)?))
            }
            SqlType::Int => {
                let v = integer(column, value)?;
                ColumnData::I32(Some(narrow::<i32, _>(column, v)?))
            }
            SqlType::BigInt => ColumnData::I64(Some(integer(column, value)?)),
            SqlType::Real => ColumnData::F32(Some(float(column, value)? as f32)),
            SqlType::Float | SqlType::Money | SqlType::SmallMoney => {
                ColumnData::F64(Some(float(column, value)?))
            }
            SqlType::Decimal | SqlType::Numeric => {
                ColumnData::Numeric(Some(numeric(column, value)?))
            }
            SqlType::Date => match value {
                Value::Date(d) => (*d).into_sql(),
                Value::Timestamp(ts) => ts.date().into_sql(),
                other => return Err(mismatch(column, other)),
            },
            SqlType::Time => match value {
                Value::Time(t) => (*t).into_sql(),
                Value::Timestamp(ts) => ts.time().into_sql(),
                other => return Err(mismatch(column, other)),
            },
            SqlType::DateTime2 => timestamp(column, value)?.into_sql(),
            SqlType::DateTime => ColumnData::DateTime(Some(legacy_datetime(
                column,
                timestamp(column, value)?,
            )?)),
            SqlType::SmallDateTime => ColumnData::SmallDateTime(Some(small_datetime(
                column,
                timestamp(column, value)?,
            )?)),
            SqlType::DateTimeOffset => {
                ChronoDateTime::<Utc>::from_naive_utc_and_offset(timestamp(column, value)?, Utc)
                    .into_sql()
            }
            SqlType::UniqueIdentifier => ColumnData::Guid(Some(guid(column, value)?)),
            SqlType::Binary | SqlType::VarBinary | SqlType::Image => match value {
                Value::Bytes(b) => ColumnData::Binary(Some(Cow::Owned(b.clone()))),
                Value::String(s) => ColumnData::Binary(Some(Cow::Owned(s.as_bytes().to_vec()))),
                other => return Err(mismatch(column, other)),
            },
            SqlType::Xml => ColumnData::String(Some(Cow::Owned(text(column, value)?))),
            SqlType::Char
            | SqlType::VarChar
            | SqlType::Text
            | SqlType::NChar
            | SqlType::NVarChar
            | SqlType::NText
            | SqlType::Other(_) => ColumnData::String(Some(Cow::Owned(text(column, value)?))),
        };

        Ok(encoded)
    }

    /// A NULL typed for the column, so the bulk stream can size it.
    pub fn encode_null(&self, column: &ColumnDescriptor) -> ColumnData<'static> {
        match column.sql_type {
            SqlType::Bit => ColumnData::Bit(None),
            SqlType::TinyInt => ColumnData::U8(None),
            SqlType::SmallInt => ColumnData::I16(None),
            SqlType::Int => ColumnData::I32(None),
            SqlType::BigInt => ColumnData::I64(None),
            SqlType::Real => ColumnData::F32(None),
            SqlType::Float | SqlType::Money | SqlType::SmallMoney => ColumnData::F64(None),
            SqlType::Decimal | SqlType::Numeric => ColumnData::Numeric(None),
            SqlType::Date => ColumnData::Date(None),
            SqlType::Time => ColumnData::Time(None),
            SqlType::DateTime2 => ColumnData::DateTime2(None),
            SqlType::DateTime => ColumnData::DateTime(None),
            SqlType::SmallDateTime => ColumnData::SmallDateTime(None),
            SqlType::DateTimeOffset => ColumnData::DateTimeOffset(None),
            SqlType::UniqueIdentifier => ColumnData::Guid(None),
            SqlType::Binary | SqlType::VarBinary | SqlType::Image => ColumnData::Binary(None),
            _ => ColumnData::String(None),
        }
    }
}

fn mismatch(column: &ColumnDescriptor, value: &Value) -> DbError {
    DbError::Encode {
        column: column.name.clone(),
        reason: format!("{} value is not valid for {}", value.source_type(), column.sql_type),
    }
}

fn integer(column: &ColumnDescriptor, value: &Value) -> Result<i64, DbError> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Uint(v) => narrow::<i64, _>(column, *v),
        Value::Boolean(v) => Ok(i64::from(*v)),
        Value::Float(v) if v.fract() == 0.0 => v.to_i64().ok_or_else(|| DbError::Encode {
            column: column.name.clone(),
            reason: format!("{v} is out of range for {}", column.sql_type),
        }),
        Value::Decimal(d) if d.is_integer() => d.to_i64().ok_or_else(|| mismatch(column, value)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| mismatch(column, value)),
        other => Err(mismatch(column, other)),
    }
}

fn narrow<T, V>(column: &ColumnDescriptor, v: V) -> Result<T, DbError>
where
    V: TryInto<T> + Copy + fmt::Display,
{
    v.try_into().map_err(|_| DbError::Encode {
        column: column.name.clone(),
        reason: format!("{v} is out of range for {}", column.sql_type),
    })
}

fn float(column: &ColumnDescriptor, value: &Value) -> Result<f64, DbError> {
    match value {
        Value::Decimal(d) => d.to_f64().ok_or_else(|| mismatch(column, value)),
        other => other.as_f64().ok_or_else(|| mismatch(column, other)),
    }
}

fn numeric(column: &ColumnDescriptor, value: &Value) -> Result<Numeric, DbError> {
    let decimal = match value {
        Value::Decimal(d) => d.clone(),
        Value::Int(v) => BigDecimal::from(*v),
        Value::Uint(v) => BigDecimal::from(*v),
        Value::Float(v) if v.is_finite() => BigDecimal::from_str(ryu::Buffer::new().format(*v))
            .map_err(|_| mismatch(column, value))?,
        Value::String(s) => BigDecimal::from_str(s.trim()).map_err(|_| mismatch(column, value))?,
        other => return Err(mismatch(column, other)),
    };

    let scale = column.scale.unwrap_or(0);
    let precision = column.precision.unwrap_or(38);
    let rounded = decimal.with_scale_round(i64::from(scale), RoundingMode::HalfUp);
    if rounded.digits() > u64::from(precision) {
        return Err(DbError::Encode {
            column: column.name.clone(),
            reason: format!("{decimal} does not fit DECIMAL({precision},{scale})"),
        });
    }

    let (digits, _) = rounded.as_bigint_and_exponent();
    let raw = digits.to_i128().ok_or_else(|| DbError::Encode {
        column: column.name.clone(),
        reason: format!("{decimal} does not fit a 38 digit decimal"),
    })?;

    Ok(Numeric::new_with_scale(raw, scale))
}

fn timestamp(column: &ColumnDescriptor, value: &Value) -> Result<NaiveDateTime, DbError> {
    match value {
        Value::Timestamp(ts) => Ok(*ts),
        Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
        other => Err(mismatch(column, other)),
    }
}

fn guid(column: &ColumnDescriptor, value: &Value) -> Result<Uuid, DbError> {
    match value {
        Value::Uuid(u) => Ok(*u),
        Value::String(s) => Uuid::parse_str(s.trim()).map_err(|_| mismatch(column, value)),
        Value::Bytes(b) => Uuid::from_slice(b).map_err(|_| mismatch(column, value)),
        other => Err(mismatch(column, other)),
    }
}

fn text(column: &ColumnDescriptor, value: &Value) -> Result<String, DbError> {
    value.as_string().ok_or_else(|| mismatch(column, value))
}

fn legacy_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

const TICKS_PER_DAY: u64 = 300 * 86_400;

/// `DATETIME` counts days since 1900-01-01 and 1/300 second ticks.
fn legacy_datetime(column: &ColumnDescriptor, ts: NaiveDateTime) -> Result<DateTime, DbError> {
    let mut days = (ts.date() - legacy_epoch()).num_days();
    let time = ts.time();
    let nanos = u64::from(time.num_seconds_from_midnight()) * 1_000_000_000
        + u64::from(time.nanosecond());
    let mut ticks = (nanos * 3 + 5_000_000) / 10_000_000;

    // Rounding the last tick of a day lands on midnight of the next one.
    if ticks >= TICKS_PER_DAY {
        days += 1;
        ticks -= TICKS_PER_DAY;
    }

    Ok(DateTime::new(narrow::<i32, _>(column, days)?, narrow::<u32, _>(column, ticks)?))
}

/// `SMALLDATETIME` counts days since 1900-01-01 and minutes since midnight.
fn small_datetime(
    column: &ColumnDescriptor,
    ts: NaiveDateTime,
) -> Result<SmallDateTime, DbError> {
    let days = (ts.date() - legacy_epoch()).num_days();
    let minutes = ts.time().num_seconds_from_midnight() / 60;

    Ok(SmallDateTime::new(
        narrow::<u16, _>(column, days)?,
        narrow::<u16, _>(column, minutes)?,
    ))
}
