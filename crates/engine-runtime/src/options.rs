use crate::error::LoadError;
use engine_processing::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_PREFETCH_DEPTH, DEFAULT_WORKER_COUNT, PipelineConfig,
};
use serde::Deserialize;
use std::{collections::HashMap, fmt, str::FromStr};

/// What to do when the destination table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ExistsPolicy {
    /// Keep the table and its rows.
    #[default]
    Append,
    /// Drop and recreate the table.
    Replace,
    /// Refuse to load.
    Fail,
    /// Delete every row, keeping the table.
    Delete,
    /// Truncate the table.
    Truncate,
}

impl ExistsPolicy {
    /// Only destructive refreshes may reset the identity seed.
    pub fn allows_identity_reset(&self) -> bool {
        matches!(self, ExistsPolicy::Delete | ExistsPolicy::Truncate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExistsPolicy::Append => "append",
            ExistsPolicy::Replace => "replace",
            ExistsPolicy::Fail => "fail",
            ExistsPolicy::Delete => "delete",
            ExistsPolicy::Truncate => "truncate",
        }
    }
}

impl FromStr for ExistsPolicy {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(ExistsPolicy::Append),
            "replace" => Ok(ExistsPolicy::Replace),
            "fail" => Ok(ExistsPolicy::Fail),
            "delete" => Ok(ExistsPolicy::Delete),
            "truncate" => Ok(ExistsPolicy::Truncate),
            other => Err(LoadError::InvalidConfiguration(format!(
                "unknown if_exists policy '{other}', expected one of append, replace, fail, delete, truncate"
            ))),
        }
    }
}

impl TryFrom<String> for ExistsPolicy {
    type Error = LoadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExistsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options of a single load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Destination schema
    pub schema: String,

    /// Rows per batch, also passed to the server as a hint
    pub batch_size: usize,

    pub if_exists: ExistsPolicy,

    /// Reseed the identity column after `delete`/`truncate`
    pub reset_identity: bool,

    /// Declared NVARCHAR length per column, overriding the sampled length
    #[serde(alias = "column_string_sizes")]
    pub string_sizes: HashMap<String, usize>,

    pub worker_count: usize,

    pub prefetch_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema: "dbo".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            if_exists: ExistsPolicy::default(),
            reset_identity: false,
            string_sizes: HashMap::new(),
            worker_count: DEFAULT_WORKER_COUNT,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
        }
    }
}

impl LoadOptions {
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_if_exists(mut self, policy: ExistsPolicy) -> Self {
        self.if_exists = policy;
        self
    }

    pub fn with_reset_identity(mut self, reset: bool) -> Self {
        self.reset_identity = reset;
        self
    }

    pub fn with_string_size(mut self, column: impl Into<String>, length: usize) -> Self {
        self.string_sizes.insert(column.into(), length);
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_batch_size(self.batch_size)
            .with_worker_count(self.worker_count)
            .with_prefetch_depth(self.prefetch_depth)
    }

    /// Checks everything that can be checked without the destination.
    pub fn validate(&self) -> Result<(), LoadError> {
        self.pipeline_config()
            .validate()
            .map_err(|e| LoadError::InvalidConfiguration(e.to_string()))?;

        if self.reset_identity && !self.if_exists.allows_identity_reset() {
            return Err(LoadError::InvalidConfiguration(format!(
                "reset_identity requires if_exists to be delete or truncate, got {}",
                self.if_exists
            )));
        }

        if let Some((column, _)) = self.string_sizes.iter().find(|(_, len)| **len == 0) {
            return Err(LoadError::InvalidConfiguration(format!(
                "string size for column '{column}' must be at least 1"
            )));
        }

        Ok(())
    }
}
