//! Defines the `Dialect` trait for database-specific SQL syntax.

use crate::query::ast::create_table::{StringLength, TypeModifier};
use model::core::data_type::SqlType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    ///
    /// - SQL Server uses brackets: `[my_column]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Renders a `SqlType` plus its length/precision into a type string.
    fn render_data_type(&self, data_type: &SqlType, modifier: &TypeModifier) -> String;

    /// Renders a string literal, escaping embedded quotes.
    fn quote_literal(&self, value: &str) -> String;

    /// Returns the name of the dialect (e.g., "SQL Server").
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn render_data_type(&self, data_type: &SqlType, modifier: &TypeModifier) -> String {
        let type_name = data_type.mssql_name().into_owned();
        match modifier {
            TypeModifier::Length(len) if data_type.supports_length() => match len {
                StringLength::Bounded(n) => format!("{type_name}({n})"),
                StringLength::Max => format!("{type_name}(MAX)"),
            },
            TypeModifier::Precision { precision, scale } if data_type.supports_precision() => {
                format!("{type_name}({precision},{scale})")
            }
            _ => type_name,
        }
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn name(&self) -> String {
        "SQL Server".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_brackets() {
        assert_eq!(SqlServer.quote_identifier("orders"), "[orders]");
        assert_eq!(SqlServer.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_render_data_type() {
        let d = SqlServer;
        assert_eq!(
            d.render_data_type(&SqlType::NVarChar, &TypeModifier::Length(StringLength::Max)),
            "NVARCHAR(MAX)"
        );
        assert_eq!(
            d.render_data_type(
                &SqlType::Decimal,
                &TypeModifier::Precision {
                    precision: 12,
                    scale: 3
                }
            ),
            "DECIMAL(12,3)"
        );
        // Modifiers that do not apply to a type are ignored.
        assert_eq!(
            d.render_data_type(&SqlType::Int, &TypeModifier::Length(StringLength::Bounded(4))),
            "INT"
        );
    }
}
