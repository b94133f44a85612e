use crate::{
    error::LoadError,
    options::{ExistsPolicy, LoadOptions},
};
use connectors::sql::base::destination::BulkDestination;
use engine_processing::{pipeline::scheduler::PipelineScheduler, sink::BulkSink};
use model::{
    core::{column::ColumnMap, identifiers::TableRef},
    records::source::{RowSource, TableSchema},
};
use planner::{
    ddl::DdlPlanner,
    typemap::{SampledStringSizing, StringSizing},
};
use std::{
    fmt,
    time::{Duration, Instant},
};
use tracing::{error, info};

/// Stages a load moves through. `Failed` is terminal and reachable from
/// every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Validating,
    Resolved { table_exists: bool },
    Prepared,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::Validating => write!(f, "validating"),
            LoadPhase::Resolved { table_exists } => {
                write!(f, "resolved (table exists: {table_exists})")
            }
            LoadPhase::Prepared => write!(f, "prepared"),
            LoadPhase::Streaming => write!(f, "streaming"),
            LoadPhase::Done => write!(f, "done"),
            LoadPhase::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: TableRef,
    pub rows: u64,
    pub batches: u64,
    pub bytes: u64,
    /// Whether the load issued a CREATE TABLE.
    pub table_created: bool,
    pub elapsed: Duration,
}

/// Tracks and logs phase transitions of one load.
struct PhaseTracker {
    table: String,
    current: LoadPhase,
}

impl PhaseTracker {
    fn new(table: String) -> Self {
        info!(table = %table, phase = %LoadPhase::Validating, "Load started");
        Self {
            table,
            current: LoadPhase::Validating,
        }
    }

    fn advance(&mut self, next: LoadPhase) {
        info!(table = %self.table, from = %self.current, to = %next, "Load phase changed");
        self.current = next;
    }
}

/// Loads an in-memory table into a destination table, creating or
/// refreshing the table according to the exists policy first.
pub struct BulkLoader<D: BulkDestination> {
    destination: D,
    planner: DdlPlanner<'static>,
    sizing: Option<Box<dyn StringSizing>>,
}

impl<D: BulkDestination> BulkLoader<D> {
    pub fn new(destination: D) -> Self {
        Self {
            destination,
            planner: DdlPlanner::default(),
            sizing: None,
        }
    }

    /// Replaces the default sizing, which samples string lengths and honours
    /// per-column overrides from the options.
    pub fn with_string_sizing(mut self, sizing: Box<dyn StringSizing>) -> Self {
        self.sizing = Some(sizing);
        self
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn into_inner(self) -> D {
        self.destination
    }

    pub async fn load(
        &mut self,
        source: Box<dyn RowSource>,
        table_name: &str,
        options: &LoadOptions,
    ) -> Result<LoadSummary, LoadError> {
        let table = TableRef::new(Some(options.schema.as_str()), table_name);
        let mut phases = PhaseTracker::new(table.qualified());

        match self.run(&mut phases, source, table, options).await {
            Ok(summary) => {
                phases.advance(LoadPhase::Done);
                info!(
                    table = %summary.table,
                    rows = summary.rows,
                    batches = summary.batches,
                    bytes = summary.bytes,
                    duration_ms = summary.elapsed.as_millis(),
                    "Load completed"
                );
                Ok(summary)
            }
            Err(err) => {
                phases.advance(LoadPhase::Failed);
                error!(table = %phases.table, error = %err, "Load failed");
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        phases: &mut PhaseTracker,
        source: Box<dyn RowSource>,
        table: TableRef,
        options: &LoadOptions,
    ) -> Result<LoadSummary, LoadError> {
        let start = Instant::now();
        let qualified = table.qualified();

        validate(source.as_ref(), &table, options)?;

        let exists = self
            .destination
            .table_exists(&table)
            .await
            .map_err(|source| LoadError::Destination {
                table: qualified.clone(),
                source,
            })?;
        phases.advance(LoadPhase::Resolved {
            table_exists: exists,
        });

        let statements = self.plan_statements(&table, source.schema(), exists, options)?;
        let table_created = options.if_exists == ExistsPolicy::Replace;
        for statement in &statements {
            self.execute_and_commit(&qualified, statement).await?;
        }
        phases.advance(LoadPhase::Prepared);

        let descriptors = self
            .destination
            .column_descriptors(&table)
            .await
            .map_err(|source| LoadError::Destination {
                table: qualified.clone(),
                source,
            })?;
        let columns = ColumnMap::new(descriptors);

        let scheduler = PipelineScheduler::new(options.pipeline_config())
            .map_err(|e| LoadError::from_processing(&qualified, e))?;

        phases.advance(LoadPhase::Streaming);
        let mut sink = BulkSink::new(&mut self.destination, table.clone(), options.batch_size);
        let summary = scheduler
            .run(source, columns, &mut sink)
            .await
            .map_err(|e| LoadError::from_processing(&qualified, e))?;

        Ok(LoadSummary {
            table,
            rows: summary.rows,
            batches: summary.batches,
            bytes: summary.bytes,
            table_created,
            elapsed: start.elapsed(),
        })
    }

    /// Statements to run before streaming, each committed on its own.
    fn plan_statements(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        exists: bool,
        options: &LoadOptions,
    ) -> Result<Vec<String>, LoadError> {
        let create = || -> Result<String, LoadError> {
            let sampled;
            let sizing: &dyn StringSizing = match &self.sizing {
                Some(sizing) => sizing.as_ref(),
                None => {
                    sampled = SampledStringSizing::new(options.string_sizes.clone());
                    &sampled
                }
            };
            self.planner
                .create_table(table, schema, sizing)
                .map_err(|e| LoadError::DdlExecution {
                    table: table.qualified(),
                    statement: format!("CREATE TABLE {}", self.planner.quoted(table)),
                    source: Box::new(e),
                })
        };

        // Only replace creates; every other policy needs the table in place.
        if !exists {
            return match options.if_exists {
                ExistsPolicy::Replace => Ok(vec![create()?]),
                _ => Err(LoadError::DestinationState {
                    table: table.qualified(),
                    reason: "does not exist",
                }),
            };
        }

        let reseed = options.reset_identity.then(|| self.planner.reseed_identity(table));
        let statements = match options.if_exists {
            ExistsPolicy::Append => Vec::new(),
            ExistsPolicy::Fail => {
                return Err(LoadError::DestinationState {
                    table: table.qualified(),
                    reason: "already exists",
                });
            }
            ExistsPolicy::Replace => vec![self.planner.drop_table(table), create()?],
            ExistsPolicy::Delete => std::iter::once(self.planner.delete_rows(table))
                .chain(reseed)
                .collect(),
            ExistsPolicy::Truncate => std::iter::once(self.planner.truncate(table))
                .chain(reseed)
                .collect(),
        };
        Ok(statements)
    }

    async fn execute_and_commit(&mut self, table: &str, statement: &str) -> Result<(), LoadError> {
        let failed = |source: connectors::error::DbError| LoadError::DdlExecution {
            table: table.to_string(),
            statement: statement.to_string(),
            source: Box::new(source),
        };

        self.destination.execute(statement).await.map_err(failed)?;
        self.destination.commit().await.map_err(failed)?;
        info!(table, statement, "Statement committed");
        Ok(())
    }
}

fn validate(source: &dyn RowSource, table: &TableRef, options: &LoadOptions) -> Result<(), LoadError> {
    if table.name.trim().is_empty() {
        return Err(LoadError::InvalidConfiguration(
            "table name must not be empty".into(),
        ));
    }
    if source.schema().is_empty() || source.is_empty() {
        return Err(LoadError::InvalidConfiguration(format!(
            "source for {table} has no rows to load"
        )));
    }
    options.validate()
}

/// Loads `source` into `table_name` through a borrowed destination.
pub async fn load<D>(
    source: Box<dyn RowSource>,
    destination: &mut D,
    table_name: &str,
    options: &LoadOptions,
) -> Result<LoadSummary, LoadError>
where
    D: BulkDestination + ?Sized,
{
    BulkLoader::new(destination)
        .load(source, table_name, options)
        .await
}
