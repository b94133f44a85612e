pub mod ddl;
pub mod error;
pub mod query;
pub mod typemap;
