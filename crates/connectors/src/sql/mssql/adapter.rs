use crate::{
    error::{ConnectorError, DbError},
    sql::{
        base::destination::BulkDestination,
        mssql::{
            encoder::MssqlValueEncoder,
            metadata::descriptor_from_row,
            utils::{MssqlClient, connect_client},
        },
    },
};
use async_trait::async_trait;
use model::{
    core::{column::ColumnDescriptor, identifiers::TableRef},
    records::batch::Batch,
};
use planner::query::{dialect::SqlServer, renderer::quoted_table};
use std::collections::HashMap;
use tiberius::TokenRow;
use tracing::{debug, info};

const QUERY_TABLE_EXISTS_SQL: &str = include_str!("sql/table_exists.sql");
const QUERY_COLUMN_DESCRIPTORS_SQL: &str = include_str!("sql/column_descriptors.sql");
const QUERY_COMMIT_SQL: &str = include_str!("sql/commit.sql");

const DEFAULT_SCHEMA: &str = "dbo";

/// A single SQL Server connection used as a bulk-load destination.
///
/// Statements run in autocommit mode. Column metadata is cached per table
/// so every batch does not pay for a metadata round-trip.
pub struct MssqlAdapter {
    client: MssqlClient,
    encoder: MssqlValueEncoder,
    dialect: SqlServer,
    columns: HashMap<TableRef, Vec<ColumnDescriptor>>,
}

impl MssqlAdapter {
    pub async fn connect(conn_str: &str) -> Result<Self, ConnectorError> {
        let client = connect_client(conn_str).await?;
        Ok(MssqlAdapter {
            client,
            encoder: MssqlValueEncoder::new(),
            dialect: SqlServer,
            columns: HashMap::new(),
        })
    }

    /// Returns the server's `@@VERSION` banner.
    pub async fn server_version(&mut self) -> Result<String, DbError> {
        let row = self
            .client
            .simple_query("SELECT @@VERSION")
            .await?
            .into_row()
            .await?;

        let version = row
            .and_then(|r| r.get::<&str, _>(0).map(str::to_string))
            .unwrap_or_default();
        Ok(version)
    }

    fn quoted(&self, table: &TableRef) -> String {
        quoted_table(&self.dialect, table)
    }

    async fn fetch_descriptors(
        &mut self,
        table: &TableRef,
    ) -> Result<Vec<ColumnDescriptor>, DbError> {
        let schema = table.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);
        let rows = self
            .client
            .query(QUERY_COLUMN_DESCRIPTORS_SQL, &[&schema, &table.name.as_str()])
            .await?
            .into_first_result()
            .await?;

        let descriptors = rows
            .iter()
            .map(descriptor_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if descriptors.is_empty() {
            return Err(DbError::InvalidMetadata(format!(
                "table {table} has no visible columns"
            )));
        }

        debug!(table = %table, columns = descriptors.len(), "Fetched column metadata");
        self.columns.insert(table.clone(), descriptors.clone());
        Ok(descriptors)
    }
}

/// For each destination column, the position of the matching batch field.
fn column_positions<'a>(
    table: &TableRef,
    columns: &'a [ColumnDescriptor],
    fields: &[String],
) -> Result<Vec<(&'a ColumnDescriptor, Option<usize>)>, DbError> {
    for field in fields {
        match columns.iter().find(|c| c.name.eq_ignore_ascii_case(field)) {
            None => {
                return Err(DbError::InvalidMetadata(format!(
                    "column '{field}' does not exist in {table}"
                )));
            }
            Some(column) if !column.is_writable => {
                return Err(DbError::InvalidMetadata(format!(
                    "column '{field}' of {table} is generated by the server and cannot be loaded"
                )));
            }
            Some(_) => {}
        }
    }

    // Bulk insert rows carry only the writable columns, in table order.
    Ok(columns
        .iter()
        .filter(|c| c.is_writable)
        .map(|c| (c, fields.iter().position(|f| f.eq_ignore_ascii_case(&c.name))))
        .collect())
}

#[async_trait]
impl BulkDestination for MssqlAdapter {
    async fn table_exists(&mut self, table: &TableRef) -> Result<bool, DbError> {
        let quoted = self.quoted(table);
        let row = self
            .client
            .query(QUERY_TABLE_EXISTS_SQL, &[&quoted.as_str()])
            .await?
            .into_row()
            .await?;

        Ok(row.and_then(|r| r.get::<bool, _>(0)).unwrap_or(false))
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DbError> {
        debug!(%sql, "Executing statement");
        self.client.execute(sql, &[]).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.client.execute(QUERY_COMMIT_SQL, &[]).await?;
        Ok(())
    }

    async fn column_descriptors(
        &mut self,
        table: &TableRef,
    ) -> Result<Vec<ColumnDescriptor>, DbError> {
        self.fetch_descriptors(table).await
    }

    async fn bulk_copy(
        &mut self,
        table: &TableRef,
        batch: &Batch,
        rows_per_batch: usize,
    ) -> Result<u64, DbError> {
        if batch.is_empty() {
            return Ok(0);
        }

        if !self.columns.contains_key(table) {
            self.fetch_descriptors(table).await?;
        }
        let columns = self
            .columns
            .get(table)
            .ok_or_else(|| DbError::InvalidMetadata(format!("no metadata for {table}")))?;
        let positions = column_positions(table, columns, &batch.columns)?;

        let quoted = quoted_table(&self.dialect, table);
        debug!(
            table = %table,
            batch = batch.index,
            rows = batch.len(),
            rows_per_batch,
            "Starting bulk insert"
        );

        let mut request = self.client.bulk_insert(&quoted).await?;
        for row in &batch.rows {
            let mut token_row = TokenRow::new();
            for &(column, position) in &positions {
                let data = match position.and_then(|i| row.get(i)) {
                    Some(value) => self.encoder.encode_value(column, value)?,
                    None => self.encoder.encode_null(column),
                };
                token_row.push(data);
            }
            request.send(token_row).await?;
        }

        let result = request.finalize().await?;
        let total = result.total();
        info!(table = %table, batch = batch.index, rows = total, "Bulk insert finished");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::data_type::SqlType;

    #[test]
    fn test_column_positions_follow_destination_order() {
        let table = TableRef::new(Some("dbo"), "t");
        let columns = vec![
            ColumnDescriptor::new("id", SqlType::Int),
            ColumnDescriptor::new("Name", SqlType::NVarChar),
            ColumnDescriptor::new("created", SqlType::DateTime2),
        ];
        let fields = vec!["name".to_string(), "ID".to_string()];

        let positions = column_positions(&table, &columns, &fields).unwrap();
        let order: Vec<_> = positions.iter().map(|(c, p)| (c.name.as_str(), *p)).collect();
        assert_eq!(order, vec![("id", Some(1)), ("Name", Some(0)), ("created", None)]);
    }

    #[test]
    fn test_column_positions_reject_unknown_fields() {
        let table = TableRef::new(None, "t");
        let columns = vec![ColumnDescriptor::new("id", SqlType::Int)];
        let fields = vec!["id".to_string(), "extra".to_string()];

        let err = column_positions(&table, &columns, &fields).unwrap_err();
        assert!(matches!(err, DbError::InvalidMetadata(msg) if msg.contains("extra")));
    }

    #[test]
    fn test_column_positions_skip_identity_columns() {
        let table = TableRef::new(Some("dbo"), "orders");
        let columns = vec![
            ColumnDescriptor::new("id", SqlType::Int).not_null().read_only(),
            ColumnDescriptor::new("label", SqlType::NVarChar),
            ColumnDescriptor::new("version", SqlType::Binary).read_only(),
        ];
        let fields = vec!["label".to_string()];

        let positions = column_positions(&table, &columns, &fields).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].0.name, "label");
        assert_eq!(positions[0].1, Some(0));
    }

    #[test]
    fn test_column_positions_reject_values_for_identity_columns() {
        let table = TableRef::new(None, "orders");
        let columns = vec![
            ColumnDescriptor::new("id", SqlType::Int).read_only(),
            ColumnDescriptor::new("label", SqlType::NVarChar),
        ];
        let fields = vec!["id".to_string(), "label".to_string()];

        let err = column_positions(&table, &columns, &fields).unwrap_err();
        assert!(matches!(err, DbError::InvalidMetadata(msg) if msg.contains("'id'")));
    }
}
