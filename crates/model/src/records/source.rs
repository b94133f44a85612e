use crate::{core::data_type::SourceType, error::ModelError, records::row::RowData};
use serde::Serialize;

/// Per-column statistics computed over the whole source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldStats {
    pub null_count: usize,
    pub non_null_count: usize,
    /// Longest string value in characters, for string columns.
    pub max_char_len: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub dtype: SourceType,
    pub stats: FieldStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableSchema {
    pub fields: Vec<Field>,
}

impl TableSchema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// An ordered, one-pass sequence of records. There is no rewind: once
/// `next_row` returns `Ok(None)` the source is exhausted for good.
pub trait RowSource: Send {
    fn schema(&self) -> &TableSchema;

    /// Total number of rows the source will produce.
    fn row_count(&self) -> usize;

    fn next_row(&mut self) -> Result<Option<RowData>, ModelError>;

    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
