//! Defines common, reusable AST nodes for building SQL statements.

pub use model::core::identifiers::TableRef;
