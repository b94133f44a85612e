use crate::error::ProcessingError;

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_PREFETCH_DEPTH: usize = 2;
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Configuration for the batch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Batch builders allowed to run at the same time
    pub worker_count: usize,

    /// Batches requested ahead of the one being written
    pub prefetch_depth: usize,

    /// Maximum rows per batch
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl PipelineConfig {
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        let checks = [
            ("worker_count", self.worker_count),
            ("prefetch_depth", self.prefetch_depth),
            ("batch_size", self.batch_size),
        ];
        match checks.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ProcessingError::InvalidConfig(format!(
                "{name} must be at least 1"
            ))),
            None => Ok(()),
        }
    }
}
