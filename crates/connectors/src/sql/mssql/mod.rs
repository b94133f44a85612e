pub mod adapter;
pub mod encoder;
pub mod metadata;
pub mod utils;
