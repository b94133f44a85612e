use crate::core::data_type::SqlType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Destination-side metadata for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: SqlType,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    /// False for identity, computed and rowversion columns, which bulk
    /// copy skips.
    #[serde(default = "writable")]
    pub is_writable: bool,
}

fn writable() -> bool {
    true
}

/// How the value converter treats a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    Bit,
    Decimal { precision: u8, scale: u8 },
    Temporal(TemporalKind),
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    DateTime2,
    SmallDateTime,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            precision: None,
            scale: None,
            max_length: None,
            is_nullable: true,
            is_writable: true,
        }
    }

    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.is_writable = false;
        self
    }

    pub fn category(&self) -> ColumnCategory {
        match self.sql_type {
            SqlType::Bit => ColumnCategory::Bit,
            SqlType::Decimal | SqlType::Numeric => ColumnCategory::Decimal {
                precision: self.precision.unwrap_or(18),
                scale: self.scale.unwrap_or(0),
            },
            SqlType::Date => ColumnCategory::Temporal(TemporalKind::Date),
            SqlType::Time => ColumnCategory::Temporal(TemporalKind::Time),
            SqlType::DateTime => ColumnCategory::Temporal(TemporalKind::DateTime),
            SqlType::DateTime2 => ColumnCategory::Temporal(TemporalKind::DateTime2),
            SqlType::SmallDateTime => ColumnCategory::Temporal(TemporalKind::SmallDateTime),
            _ => ColumnCategory::Generic,
        }
    }
}

/// Destination columns keyed by lower-cased name, keeping ordinal order.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<ColumnDescriptor>,
    by_name: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.to_lowercase(), i))
            .collect();
        Self { columns, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| &self.columns[i])
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnDescriptor> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = ColumnDescriptor>>(iter: I) -> Self {
        ColumnMap::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let map = ColumnMap::new(vec![
            ColumnDescriptor::new("CustomerId", SqlType::Int),
            ColumnDescriptor::new("IsActive", SqlType::Bit),
        ]);

        assert_eq!(map.get("customerid").unwrap().sql_type, SqlType::Int);
        assert_eq!(map.get("ISACTIVE").unwrap().category(), ColumnCategory::Bit);
        assert!(map.get("missing").is_none());
        assert_eq!(map.columns()[0].name, "CustomerId");
    }

    #[test]
    fn test_categories() {
        let dec = ColumnDescriptor::new("amount", SqlType::Numeric).with_precision(10, 2);
        assert_eq!(
            dec.category(),
            ColumnCategory::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            ColumnDescriptor::new("at", SqlType::DateTime2).category(),
            ColumnCategory::Temporal(TemporalKind::DateTime2)
        );
        assert_eq!(
            ColumnDescriptor::new("name", SqlType::NVarChar).category(),
            ColumnCategory::Generic
        );
    }

    #[test]
    fn test_read_only_columns() {
        let id = ColumnDescriptor::new("id", SqlType::Int).not_null().read_only();
        assert!(!id.is_writable);
        assert!(!id.is_nullable);
        assert!(ColumnDescriptor::new("label", SqlType::NVarChar).is_writable);
    }
}
