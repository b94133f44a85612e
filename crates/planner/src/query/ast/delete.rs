use crate::query::ast::common::TableRef;

/// `DELETE FROM <table>` without a predicate: removes every row.
#[derive(Debug, Clone)]
pub struct DeleteAll {
    pub table: TableRef,
}
