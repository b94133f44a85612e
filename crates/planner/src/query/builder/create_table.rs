use crate::query::ast::{
    common::TableRef,
    create_table::{ColumnDef, CreateTable, TypeModifier},
};
use model::core::data_type::SqlType;

#[derive(Debug, Clone)]
pub struct CreateTableBuilder {
    ast: CreateTable,
}

impl CreateTableBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: CreateTable {
                table,
                columns: Vec::new(),
            },
        }
    }

    /// Adds a nullable column.
    pub fn column(mut self, name: &str, data_type: SqlType, modifier: TypeModifier) -> Self {
        self.ast.columns.push(ColumnDef {
            name: name.to_string(),
            data_type,
            modifier,
            is_nullable: true,
        });
        self
    }

    pub fn column_def(mut self, def: ColumnDef) -> Self {
        self.ast.columns.push(def);
        self
    }

    pub fn build(self) -> CreateTable {
        self.ast
    }
}
