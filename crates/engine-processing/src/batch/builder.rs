use crate::{batch::dispenser::RowDispenser, convert::convert, error::ProcessingError};
use model::{
    core::column::{ColumnDescriptor, ColumnMap},
    records::batch::{Batch, WireRow},
};
use std::sync::Arc;
use tracing::trace;

/// Claims a slice of rows and converts it into a wire-ready [`Batch`].
pub struct BatchBuilder {
    batch_size: usize,
    columns: Arc<ColumnMap>,
}

impl BatchBuilder {
    pub fn new(batch_size: usize, columns: Arc<ColumnMap>) -> Self {
        Self {
            batch_size,
            columns,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Builds the batch for `ticket`. Blocks until the ticket's turn at the
    /// dispenser; conversion runs without holding the dispenser lock.
    pub fn build(&self, dispenser: &RowDispenser, ticket: u64) -> Result<Batch, ProcessingError> {
        let claim = dispenser
            .claim(ticket, self.batch_size)
            .map_err(|source| ProcessingError::Source {
                batch: ticket,
                source,
            })?;

        let Some(first) = claim.rows.first() else {
            return Ok(Batch::empty(ticket, claim.first_row));
        };

        let names: Arc<[String]> = first
            .field_values
            .iter()
            .map(|f| f.name.to_string())
            .collect();
        let descriptors: Vec<Option<&ColumnDescriptor>> =
            names.iter().map(|name| self.columns.get(name)).collect();

        let mut rows: Vec<WireRow> = Vec::with_capacity(claim.rows.len());
        for (offset, row) in claim.rows.into_iter().enumerate() {
            let mut wire = Vec::with_capacity(names.len());
            for (position, field) in row.into_iter().enumerate() {
                let descriptor = descriptors.get(position).copied().flatten();
                let converted = convert(field.value, descriptor).map_err(|source| {
                    ProcessingError::Conversion {
                        batch: ticket,
                        row: claim.first_row + offset as u64,
                        column: field.name.to_string(),
                        source,
                    }
                })?;
                wire.push(converted);
            }
            rows.push(wire);
        }

        trace!(batch = ticket, rows = rows.len(), "Built batch");
        Ok(Batch::new(ticket, claim.first_row, names, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use model::{
        core::{data_type::SourceType, data_type::SqlType, value::Value},
        records::table::{Series, Table},
    };

    fn dispenser() -> RowDispenser {
        let table = Table::new(vec![
            Series::new(
                "Flag",
                SourceType::Int64,
                vec![Value::Int(3), Value::Int(0), Value::Null],
            ),
            Series::new(
                "amount",
                SourceType::Utf8,
                vec!["1.5".into(), "2".into(), "oops".into()],
            ),
        ])
        .unwrap();
        RowDispenser::new(Box::new(table.into_rows()))
    }

    fn columns() -> Arc<ColumnMap> {
        Arc::new(ColumnMap::new(vec![
            ColumnDescriptor::new("flag", SqlType::Bit),
            ColumnDescriptor::new("AMOUNT", SqlType::Decimal).with_precision(10, 2),
        ]))
    }

    #[test]
    fn test_build_converts_with_case_insensitive_lookup() {
        let builder = BatchBuilder::new(2, columns());
        let batch = builder.build(&dispenser(), 0).unwrap();

        assert_eq!(batch.index, 0);
        assert_eq!(&*batch.columns, &["Flag".to_string(), "amount".to_string()]);
        assert_eq!(batch.rows[0][0], Value::Int(1));
        assert_eq!(batch.rows[1][0], Value::Int(0));
        assert!(matches!(batch.rows[0][1], Value::Decimal(_)));
    }

    #[test]
    fn test_conversion_error_names_row_and_column() {
        let dispenser = dispenser();
        let builder = BatchBuilder::new(2, columns());
        builder.build(&dispenser, 0).unwrap();

        let err = builder.build(&dispenser, 1).unwrap_err();
        match err {
            ProcessingError::Conversion {
                batch,
                row,
                column,
                source,
            } => {
                assert_eq!((batch, row, column.as_str()), (1, 2, "amount"));
                assert!(matches!(source, ConversionError::Decimal { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_source_yields_empty_batch() {
        let dispenser = dispenser();
        let builder = BatchBuilder::new(10, Arc::new(ColumnMap::default()));
        assert_eq!(builder.build(&dispenser, 0).unwrap().len(), 3);

        let empty = builder.build(&dispenser, 1).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.first_row, 3);
    }
}
