//! Renders the statements a load issues before streaming rows.

use crate::{
    error::PlanError,
    query::{
        ast::{
            common::TableRef, delete::DeleteAll, reseed::ReseedIdentity,
            truncate::TruncateTable,
        },
        builder::{create_table::CreateTableBuilder, drop_table::DropTableBuilder},
        dialect::{Dialect, SqlServer},
        renderer::{quoted_table, to_sql},
    },
    typemap::{StringSizing, map_field},
};
use model::records::source::TableSchema;
use tracing::debug;

pub struct DdlPlanner<'a> {
    dialect: &'a dyn Dialect,
}

impl Default for DdlPlanner<'static> {
    fn default() -> Self {
        Self {
            dialect: &SqlServer,
        }
    }
}

impl<'a> DdlPlanner<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    /// `[schema].[name]`, the form every statement below uses.
    pub fn quoted(&self, table: &TableRef) -> String {
        quoted_table(self.dialect, table)
    }

    pub fn create_table(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        sizing: &dyn StringSizing,
    ) -> Result<String, PlanError> {
        if schema.is_empty() {
            return Err(PlanError::NoColumns(table.qualified()));
        }

        let mut builder = CreateTableBuilder::new(table.clone());
        for field in &schema.fields {
            let def = map_field(field, sizing)?;
            debug!(
                column = %def.name,
                source_type = %field.dtype,
                sql_type = %self.dialect.render_data_type(&def.data_type, &def.modifier),
                "Mapped column"
            );
            builder = builder.column_def(def);
        }

        Ok(to_sql(&builder.build(), self.dialect))
    }

    pub fn drop_table(&self, table: &TableRef) -> String {
        to_sql(&DropTableBuilder::new(table.clone()).build(), self.dialect)
    }

    pub fn delete_rows(&self, table: &TableRef) -> String {
        to_sql(
            &DeleteAll {
                table: table.clone(),
            },
            self.dialect,
        )
    }

    pub fn truncate(&self, table: &TableRef) -> String {
        to_sql(
            &TruncateTable {
                table: table.clone(),
            },
            self.dialect,
        )
    }

    pub fn reseed_identity(&self, table: &TableRef) -> String {
        to_sql(
            &ReseedIdentity {
                table: table.clone(),
                new_seed: 0,
            },
            self.dialect,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{table_ref, typemap::SampledStringSizing};
    use model::{
        core::{data_type::SourceType, value::Value},
        records::table::{Series, Table},
    };

    #[test]
    fn test_create_table_from_schema() {
        let table = Table::new(vec![
            Series::new("id", SourceType::Int64, vec![1.into(), 2.into()]),
            Series::new("label", SourceType::Utf8, vec!["ab".into(), "abcd".into()]),
            Series::new("empty", SourceType::Null, vec![Value::Null, Value::Null]),
        ])
        .unwrap();

        let sql = DdlPlanner::default()
            .create_table(
                &table_ref!("dbo", "t"),
                &table.schema(),
                &SampledStringSizing::default(),
            )
            .unwrap();

        assert_eq!(
            sql,
            "CREATE TABLE [dbo].[t] ([id] BIGINT NULL, [label] NVARCHAR(4) NULL, \
             [empty] NVARCHAR(1) NULL);"
        );
    }

    #[test]
    fn test_create_table_requires_columns() {
        let err = DdlPlanner::default()
            .create_table(
                &table_ref!("t"),
                &TableSchema::default(),
                &SampledStringSizing::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::NoColumns(_)));
    }

    #[test]
    fn test_refresh_statements() {
        let planner = DdlPlanner::default();
        let t = table_ref!("dbo", "orders");
        assert_eq!(planner.drop_table(&t), "DROP TABLE [dbo].[orders];");
        assert_eq!(planner.delete_rows(&t), "DELETE FROM [dbo].[orders];");
        assert_eq!(planner.truncate(&t), "TRUNCATE TABLE [dbo].[orders];");
        assert_eq!(
            planner.reseed_identity(&t),
            "DBCC CHECKIDENT ('[dbo].[orders]', RESEED, 0);"
        );
    }
}
