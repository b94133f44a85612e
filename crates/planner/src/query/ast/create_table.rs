//! Defines the AST for a CREATE TABLE statement.

use crate::query::ast::common::TableRef;
use model::core::data_type::SqlType;

/// Represents a complete CREATE TABLE statement.
#[derive(Debug, Clone)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: SqlType,
    pub modifier: TypeModifier,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeModifier {
    #[default]
    None,
    Length(StringLength),
    Precision { precision: u8, scale: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLength {
    Bounded(usize),
    Max,
}
