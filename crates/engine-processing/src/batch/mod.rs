pub mod builder;
pub mod dispenser;
