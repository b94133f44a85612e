use crate::error::DbError;
use async_trait::async_trait;
use model::{
    core::{column::ColumnDescriptor, identifiers::TableRef},
    records::batch::Batch,
};

/// A database that can receive bulk-copied batches.
///
/// Every method takes `&mut self`: a destination is one connection and is
/// driven by a single caller at a time.
#[async_trait]
pub trait BulkDestination: Send {
    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, DbError>;

    /// Runs a statement that returns no rows.
    async fn execute(&mut self, sql: &str) -> Result<(), DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;

    /// Column metadata of an existing table, in ordinal order.
    async fn column_descriptors(
        &mut self,
        table: &TableRef,
    ) -> Result<Vec<ColumnDescriptor>, DbError>;

    /// Streams one batch through the bulk-copy channel and returns the number
    /// of rows the server accepted. `rows_per_batch` is a hint for the server.
    async fn bulk_copy(
        &mut self,
        table: &TableRef,
        batch: &Batch,
        rows_per_batch: usize,
    ) -> Result<u64, DbError>;
}

#[async_trait]
impl<T> BulkDestination for &mut T
where
    T: BulkDestination + ?Sized,
{
    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, DbError> {
        (**self).table_exists(table).await
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        (**self).execute(sql).await
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        (**self).commit().await
    }

    async fn column_descriptors(
        &mut self,
        table: &TableRef,
    ) -> Result<Vec<ColumnDescriptor>, DbError> {
        (**self).column_descriptors(table).await
    }

    async fn bulk_copy(
        &mut self,
        table: &TableRef,
        batch: &Batch,
        rows_per_batch: usize,
    ) -> Result<u64, DbError> {
        (**self).bulk_copy(table, batch, rows_per_batch).await
    }
}
