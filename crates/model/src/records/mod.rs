pub mod batch;
pub mod row;
pub mod source;
pub mod table;
