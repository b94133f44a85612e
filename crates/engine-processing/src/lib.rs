pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod sink;
