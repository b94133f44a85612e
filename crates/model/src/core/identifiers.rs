use serde::{Deserialize, Serialize};
use std::fmt;

/// A schema-qualified destination table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()).map(str::to_string),
            name: name.to_string(),
        }
    }

    /// `schema.name`, or just `name` when no schema is set.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        assert_eq!(TableRef::new(Some("dbo"), "orders").qualified(), "dbo.orders");
        assert_eq!(TableRef::new(Some(""), "orders").qualified(), "orders");
        assert_eq!(TableRef::new(None, "orders").to_string(), "orders");
    }
}
