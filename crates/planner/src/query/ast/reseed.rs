//! Defines the AST for resetting an identity column's seed.

use crate::query::ast::common::TableRef;

/// `DBCC CHECKIDENT ('<table>', RESEED, <value>)`
#[derive(Debug, Clone)]
pub struct ReseedIdentity {
    pub table: TableRef,
    pub new_seed: i64,
}
