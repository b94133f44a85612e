use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// Column types a source table can carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    Datetime,
    Date,
    Time,
    /// Stored as integer nanoseconds.
    Duration,
    Decimal { precision: u8, scale: u8 },
    Binary,
    Utf8,
    Categorical,
    Uuid,
    Null,
    /// A type the source knows about but that has no destination mapping.
    Object(String),
}

impl SourceType {
    pub fn is_string(&self) -> bool {
        matches!(self, SourceType::Utf8 | SourceType::Categorical)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Decimal { precision, scale } => write!(f, "Decimal({precision}, {scale})"),
            SourceType::Object(name) => write!(f, "Object({name})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// SQL Server column types as reported by `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    Decimal,
    Numeric,
    Money,
    SmallMoney,
    Date,
    Time,
    DateTime,
    DateTime2,
    SmallDateTime,
    DateTimeOffset,
    Char,
    VarChar,
    Text,
    NChar,
    NVarChar,
    NText,
    Binary,
    VarBinary,
    Image,
    UniqueIdentifier,
    Xml,
    Other(String),
}

lazy_static! {
    static ref MSSQL_TYPE_MAP: HashMap<&'static str, SqlType> = build_mssql_type_map();
}

impl SqlType {
    pub fn from_mssql_type(type_name: &str) -> Self {
        let normalized = type_name.trim().to_ascii_lowercase();
        MSSQL_TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .unwrap_or(SqlType::Other(normalized))
    }

    pub fn mssql_name(&self) -> Cow<'_, str> {
        match self {
            SqlType::Bit => Cow::Borrowed("BIT"),
            SqlType::TinyInt => Cow::Borrowed("TINYINT"),
            SqlType::SmallInt => Cow::Borrowed("SMALLINT"),
            SqlType::Int => Cow::Borrowed("INT"),
            SqlType::BigInt => Cow::Borrowed("BIGINT"),
            SqlType::Real => Cow::Borrowed("REAL"),
            SqlType::Float => Cow::Borrowed("FLOAT"),
            SqlType::Decimal => Cow::Borrowed("DECIMAL"),
            SqlType::Numeric => Cow::Borrowed("NUMERIC"),
            SqlType::Money => Cow::Borrowed("MONEY"),
            SqlType::SmallMoney => Cow::Borrowed("SMALLMONEY"),
            SqlType::Date => Cow::Borrowed("DATE"),
            SqlType::Time => Cow::Borrowed("TIME"),
            SqlType::DateTime => Cow::Borrowed("DATETIME"),
            SqlType::DateTime2 => Cow::Borrowed("DATETIME2"),
            SqlType::SmallDateTime => Cow::Borrowed("SMALLDATETIME"),
            SqlType::DateTimeOffset => Cow::Borrowed("DATETIMEOFFSET"),
            SqlType::Char => Cow::Borrowed("CHAR"),
            SqlType::VarChar => Cow::Borrowed("VARCHAR"),
            SqlType::Text => Cow::Borrowed("TEXT"),
            SqlType::NChar => Cow::Borrowed("NCHAR"),
            SqlType::NVarChar => Cow::Borrowed("NVARCHAR"),
            SqlType::NText => Cow::Borrowed("NTEXT"),
            SqlType::Binary => Cow::Borrowed("BINARY"),
            SqlType::VarBinary => Cow::Borrowed("VARBINARY"),
            SqlType::Image => Cow::Borrowed("IMAGE"),
            SqlType::UniqueIdentifier => Cow::Borrowed("UNIQUEIDENTIFIER"),
            SqlType::Xml => Cow::Borrowed("XML"),
            SqlType::Other(name) => Cow::Owned(name.to_ascii_uppercase()),
        }
    }

    pub fn supports_length(&self) -> bool {
        matches!(
            self,
            SqlType::Char
                | SqlType::VarChar
                | SqlType::NChar
                | SqlType::NVarChar
                | SqlType::Binary
                | SqlType::VarBinary
        )
    }

    pub fn supports_precision(&self) -> bool {
        matches!(self, SqlType::Decimal | SqlType::Numeric)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mssql_name())
    }
}

fn build_mssql_type_map() -> HashMap<&'static str, SqlType> {
    use SqlType::*;

    let entries = [
        ("bit", Bit),
        ("tinyint", TinyInt),
        ("smallint", SmallInt),
        ("int", Int),
        ("bigint", BigInt),
        ("real", Real),
        ("float", Float),
        ("decimal", Decimal),
        ("numeric", Numeric),
        ("money", Money),
        ("smallmoney", SmallMoney),
        ("date", Date),
        ("time", Time),
        ("datetime", DateTime),
        ("datetime2", DateTime2),
        ("smalldatetime", SmallDateTime),
        ("datetimeoffset", DateTimeOffset),
        ("char", Char),
        ("varchar", VarChar),
        ("text", Text),
        ("nchar", NChar),
        ("nvarchar", NVarChar),
        ("ntext", NText),
        ("binary", Binary),
        ("varbinary", VarBinary),
        ("image", Image),
        ("uniqueidentifier", UniqueIdentifier),
        ("xml", Xml),
    ];

    let mut map = HashMap::new();
    for (name, sql_type) in entries {
        map.insert(name, sql_type);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mssql_type_names() {
        assert_eq!(SqlType::from_mssql_type("DateTime2"), SqlType::DateTime2);
        assert_eq!(SqlType::from_mssql_type(" bit "), SqlType::Bit);
        assert_eq!(
            SqlType::from_mssql_type("geography"),
            SqlType::Other("geography".into())
        );
    }

    #[test]
    fn test_length_support() {
        assert!(SqlType::NVarChar.supports_length());
        assert!(!SqlType::Int.supports_length());
        assert!(SqlType::Numeric.supports_precision());
    }
}
