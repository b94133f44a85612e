use crate::query::ast::common::TableRef;

#[derive(Debug, Clone)]
pub struct TruncateTable {
    pub table: TableRef,
}
