pub mod common;
pub mod create_table;
pub mod delete;
pub mod drop_table;
pub mod reseed;
pub mod truncate;
