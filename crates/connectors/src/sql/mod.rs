pub mod base;
pub mod mssql;
