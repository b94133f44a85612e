use crate::error::SinkError;
use async_trait::async_trait;
use connectors::sql::base::destination::BulkDestination;
use model::{core::identifiers::TableRef, records::batch::Batch};
use tracing::{info, warn};

/// Sequential consumer of ordered batches.
#[async_trait]
pub trait BatchSink: Send {
    /// Writes one batch and returns the number of rows accepted.
    async fn send(&mut self, batch: &Batch) -> Result<u64, SinkError>;
}

/// Feeds batches to a destination's bulk-copy channel.
pub struct BulkSink<'a, D: BulkDestination + ?Sized> {
    destination: &'a mut D,
    table: TableRef,
    rows_per_batch: usize,
}

impl<'a, D: BulkDestination + ?Sized> BulkSink<'a, D> {
    pub fn new(destination: &'a mut D, table: TableRef, rows_per_batch: usize) -> Self {
        Self {
            destination,
            table,
            rows_per_batch,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }
}

#[async_trait]
impl<'a, D: BulkDestination + ?Sized> BatchSink for BulkSink<'a, D> {
    async fn send(&mut self, batch: &Batch) -> Result<u64, SinkError> {
        let start = std::time::Instant::now();

        let accepted = self
            .destination
            .bulk_copy(&self.table, batch, self.rows_per_batch)
            .await
            .map_err(|source| SinkError::BulkCopy {
                table: self.table.qualified(),
                source,
            })?;

        if accepted != batch.len() as u64 {
            warn!(
                table = %self.table,
                batch = batch.index,
                sent = batch.len(),
                accepted,
                "Destination reported a different row count than was sent"
            );
        }

        let duration = start.elapsed();
        let rows_per_sec = batch.len() as f64 / duration.as_secs_f64().max(f64::EPSILON);
        info!(
            table = %self.table,
            batch = batch.index,
            rows = batch.len(),
            duration_ms = duration.as_millis(),
            rows_per_sec = %format!("{:.2}", rows_per_sec),
            "Batch written"
        );

        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::error::DbError;
    use model::core::{column::ColumnDescriptor, value::Value};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingDestination {
        copies: Vec<(String, u64, usize, usize)>,
        fail: bool,
    }

    #[async_trait]
    impl BulkDestination for CountingDestination {
        async fn table_exists(&mut self, _table: &TableRef) -> Result<bool, DbError> {
            Ok(true)
        }

        async fn execute(&mut self, _sql: &str) -> Result<(), DbError> {
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), DbError> {
            Ok(())
        }

        async fn column_descriptors(
            &mut self,
            _table: &TableRef,
        ) -> Result<Vec<ColumnDescriptor>, DbError> {
            Ok(Vec::new())
        }

        async fn bulk_copy(
            &mut self,
            table: &TableRef,
            batch: &Batch,
            rows_per_batch: usize,
        ) -> Result<u64, DbError> {
            if self.fail {
                return Err(DbError::Write("connection reset".into()));
            }
            self.copies
                .push((table.qualified(), batch.index, batch.len(), rows_per_batch));
            Ok(batch.len() as u64)
        }
    }

    fn batch(index: u64, rows: usize) -> Batch {
        Batch::new(
            index,
            0,
            Arc::from(vec!["id".to_string()]),
            (0..rows).map(|i| vec![Value::Int(i as i64)]).collect(),
        )
    }

    #[tokio::test]
    async fn test_bulk_sink_forwards_batches() {
        let mut destination = CountingDestination::default();
        {
            let mut sink = BulkSink::new(&mut destination, TableRef::new(Some("dbo"), "t"), 500);
            assert_eq!(sink.send(&batch(0, 3)).await.unwrap(), 3);
            assert_eq!(sink.send(&batch(1, 2)).await.unwrap(), 2);
        }

        assert_eq!(
            destination.copies,
            vec![
                ("dbo.t".to_string(), 0, 3, 500),
                ("dbo.t".to_string(), 1, 2, 500)
            ]
        );
    }

    #[tokio::test]
    async fn test_bulk_sink_wraps_destination_errors() {
        let mut destination = CountingDestination {
            fail: true,
            ..Default::default()
        };
        let mut sink = BulkSink::new(&mut destination, TableRef::new(None, "t"), 10);

        let err = sink.send(&batch(0, 1)).await.unwrap_err();
        assert!(matches!(err, SinkError::BulkCopy { ref table, .. } if table == "t"));
    }
}
