use crate::{
    core::{
        data_type::SourceType,
        value::{FieldValue, Value},
    },
    error::ModelError,
    records::{
        row::RowData,
        source::{Field, FieldStats, RowSource, TableSchema},
    },
};
use std::{collections::HashSet, sync::Arc};

/// A named, typed column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: Arc<str>,
    pub dtype: SourceType,
    pub values: Vec<Value>,
}

impl Series {
    pub fn new(name: &str, dtype: SourceType, values: Vec<Value>) -> Self {
        Self {
            name: Arc::from(name),
            dtype,
            values,
        }
    }

    /// Builds a series whose type is taken from its first non-null value.
    pub fn infer(name: &str, values: Vec<Value>) -> Self {
        let dtype = values
            .iter()
            .find(|v| !v.is_null())
            .map(Value::source_type)
            .unwrap_or(SourceType::Null);
        Self::new(name, dtype, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> FieldStats {
        let null_count = self.values.iter().filter(|v| v.is_null()).count();
        let max_char_len = if self.dtype.is_string() {
            self.values.iter().filter_map(Value::char_len).max()
        } else {
            None
        };
        FieldStats {
            null_count,
            non_null_count: self.values.len() - null_count,
            max_char_len,
        }
    }

    fn field(&self) -> Field {
        Field {
            name: self.name.to_string(),
            dtype: self.dtype.clone(),
            stats: self.stats(),
        }
    }
}

/// An in-memory columnar table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Series>,
}

impl Table {
    pub fn new(columns: Vec<Series>) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for series in &columns {
            if !seen.insert(series.name.to_lowercase()) {
                return Err(ModelError::DuplicateColumn(series.name.to_string()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|s| s.len() != expected) {
                return Err(ModelError::ColumnLength {
                    column: bad.name.to_string(),
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Series::len)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema {
            fields: self.columns.iter().map(Series::field).collect(),
        }
    }

    /// Consumes the table into a one-pass row iterator.
    pub fn into_rows(self) -> TableRows {
        let schema = self.schema();
        let remaining = self.height();
        let columns = self
            .columns
            .into_iter()
            .map(|s| (s.name, s.values.into_iter()))
            .collect();
        TableRows {
            schema,
            columns,
            total: remaining,
            remaining,
        }
    }
}

/// Row-wise view over a consumed [`Table`].
pub struct TableRows {
    schema: TableSchema,
    columns: Vec<(Arc<str>, std::vec::IntoIter<Value>)>,
    total: usize,
    remaining: usize,
}

impl RowSource for TableRows {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn row_count(&self) -> usize {
        self.total
    }

    fn next_row(&mut self) -> Result<Option<RowData>, ModelError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let mut fields = Vec::with_capacity(self.columns.len());
        for (name, values) in self.columns.iter_mut() {
            let value = values.next().ok_or_else(|| {
                ModelError::Source(format!("column '{name}' ended before the table did"))
            })?;
            fields.push(FieldValue::new(name.clone(), value));
        }
        Ok(Some(RowData::new(fields)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Series::new("id", SourceType::Int32, vec![1.into(), 2.into(), 3.into()]),
            Series::new(
                "name",
                SourceType::Utf8,
                vec!["ann".into(), Value::Null, "bartholomew".into()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let err = Table::new(vec![
            Series::new("a", SourceType::Int64, vec![1.into()]),
            Series::new("b", SourceType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::ColumnLength { actual: 0, .. }));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = Table::new(vec![
            Series::new("Id", SourceType::Int64, vec![]),
            Series::new("id", SourceType::Int64, vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateColumn(_)));
    }

    #[test]
    fn test_schema_stats() {
        let schema = sample().schema();
        let name = schema.field("NAME").unwrap();
        assert_eq!(name.stats.null_count, 1);
        assert_eq!(name.stats.max_char_len, Some(11));
        assert_eq!(schema.field("id").unwrap().stats.max_char_len, None);
    }

    #[test]
    fn test_rows_come_out_in_order_once() {
        let mut rows = sample().into_rows();
        assert_eq!(rows.row_count(), 3);

        let first = rows.next_row().unwrap().unwrap();
        assert_eq!(first.get_value("id"), Value::Int(1));
        assert_eq!(&*first.field_values[1].name, "name");

        assert!(rows.next_row().unwrap().is_some());
        let third = rows.next_row().unwrap().unwrap();
        assert_eq!(third.get_value("name"), Value::String("bartholomew".into()));

        assert!(rows.next_row().unwrap().is_none());
        assert!(rows.next_row().unwrap().is_none());
    }

    #[test]
    fn test_infer_series_type() {
        let s = Series::infer("x", vec![Value::Null, Value::Float(1.5)]);
        assert_eq!(s.dtype, SourceType::Float64);
        assert_eq!(Series::infer("n", vec![Value::Null]).dtype, SourceType::Null);
    }
}
