use crate::{
    batch::{builder::BatchBuilder, dispenser::RowDispenser},
    config::PipelineConfig,
    error::ProcessingError,
    metrics::{Metrics, MetricsSnapshot},
    sink::BatchSink,
};
use model::{
    core::column::ColumnMap,
    records::{batch::Batch, source::RowSource},
};
use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, info, warn};

/// Outcome of a completed pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    pub rows: u64,
    pub batches: u64,
    pub bytes: u64,
    pub empty_batches: u64,
    pub elapsed: Duration,
}

impl PipelineSummary {
    fn from_metrics(snapshot: MetricsSnapshot, elapsed: Duration) -> Self {
        Self {
            rows: snapshot.records_processed,
            batches: snapshot.batches_processed,
            bytes: snapshot.bytes_transferred,
            empty_batches: snapshot.empty_batches,
            elapsed,
        }
    }
}

/// A batch being built on the blocking pool.
struct PipelineTask {
    ticket: u64,
    handle: JoinHandle<Result<Batch, ProcessingError>>,
}

impl PipelineTask {
    async fn join(self) -> Result<Batch, ProcessingError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(ProcessingError::Worker {
                batch: self.ticket,
                reason: err.to_string(),
            }),
        }
    }
}

/// Shared state of one run.
struct RunState {
    dispenser: Arc<RowDispenser>,
    builder: Arc<BatchBuilder>,
    permits: Arc<Semaphore>,
    queue: VecDeque<PipelineTask>,
    next_ticket: u64,
    /// Counters of this run only.
    metrics: Metrics,
}

/// Builds batches on a bounded worker pool while the sink writes, and hands
/// them to the sink strictly in source order.
///
/// At most `prefetch_depth` batches are outstanding. The oldest one is
/// always awaited first, so a fast later batch waits for a slow earlier one.
pub struct PipelineScheduler {
    config: PipelineConfig,
    metrics: Metrics,
}

impl PipelineScheduler {
    pub fn new(config: PipelineConfig) -> Result<Self, ProcessingError> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: Metrics::new(),
        })
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Streams the whole source into `sink`.
    ///
    /// Every submitted task is awaited before this returns, on success and on
    /// failure. The first error wins; later ones are logged.
    pub async fn run<S>(
        &self,
        source: Box<dyn RowSource>,
        columns: ColumnMap,
        sink: &mut S,
    ) -> Result<PipelineSummary, ProcessingError>
    where
        S: BatchSink + ?Sized,
    {
        let start = Instant::now();
        let mut state = RunState {
            dispenser: Arc::new(RowDispenser::new(source)),
            builder: Arc::new(BatchBuilder::new(self.config.batch_size, Arc::new(columns))),
            permits: Arc::new(Semaphore::new(self.config.worker_count)),
            queue: VecDeque::with_capacity(self.config.prefetch_depth),
            next_ticket: 0,
            metrics: Metrics::new(),
        };

        info!(
            workers = self.config.worker_count,
            prefetch = self.config.prefetch_depth,
            batch_size = self.config.batch_size,
            "Starting batch pipeline"
        );

        let outcome = self.drive(&mut state, sink).await;
        if outcome.is_err() {
            state.metrics.increment_failures(1);
            state.dispenser.abort();
        }

        let drained = Self::drain(&mut state.queue).await;
        let snapshot = state.metrics.snapshot();
        self.metrics.absorb(&snapshot);
        outcome?;
        drained?;

        let summary = PipelineSummary::from_metrics(snapshot, start.elapsed());
        info!(
            rows = summary.rows,
            batches = summary.batches,
            bytes = summary.bytes,
            empty_batches = summary.empty_batches,
            elapsed_ms = summary.elapsed.as_millis(),
            "Batch pipeline finished"
        );
        Ok(summary)
    }

    async fn drive<S>(&self, state: &mut RunState, sink: &mut S) -> Result<(), ProcessingError>
    where
        S: BatchSink + ?Sized,
    {
        for _ in 0..self.config.prefetch_depth {
            if state.dispenser.is_exhausted() {
                break;
            }
            let task = self.submit(state).await?;
            state.queue.push_back(task);
        }

        while let Some(task) = state.queue.pop_front() {
            let batch = task.join().await?;

            if batch.is_empty() {
                debug!(batch = batch.index, "Skipping empty batch");
                state.metrics.increment_empty_batches(1);
            } else {
                sink.send(&batch)
                    .await
                    .map_err(|source| ProcessingError::Sink {
                        batch: batch.index,
                        source,
                    })?;
                state.metrics.increment_records(batch.len() as u64);
                state.metrics.increment_bytes(batch.size_bytes() as u64);
                state.metrics.increment_batches(1);
            }

            if !state.dispenser.is_exhausted() {
                let task = self.submit(state).await?;
                state.queue.push_back(task);
            }
        }

        Ok(())
    }

    /// Takes a worker permit in submission order, then starts the builder
    /// for the next ticket on the blocking pool.
    async fn submit(&self, state: &mut RunState) -> Result<PipelineTask, ProcessingError> {
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let permit = state
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|err| ProcessingError::Worker {
                batch: ticket,
                reason: err.to_string(),
            })?;

        let dispenser = state.dispenser.clone();
        let builder = state.builder.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            builder.build(&dispenser, ticket)
        });

        debug!(batch = ticket, "Submitted batch");
        Ok(PipelineTask { ticket, handle })
    }

    async fn drain(queue: &mut VecDeque<PipelineTask>) -> Result<(), ProcessingError> {
        let mut first_error = None;
        while let Some(task) = queue.pop_front() {
            if let Err(err) = task.join().await {
                warn!(error = %err, "Outstanding batch failed during shutdown");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use async_trait::async_trait;
    use connectors::error::DbError;
    use model::{
        core::{
            column::ColumnDescriptor,
            data_type::{SourceType, SqlType},
            value::Value,
        },
        error::ModelError,
        records::{
            row::RowData,
            source::TableSchema,
            table::{Series, Table},
        },
    };

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Batch>,
        fail_on: Option<u64>,
        delay: Option<Duration>,
    }

    impl RecordingSink {
        fn sizes(&self) -> Vec<usize> {
            self.batches.iter().map(Batch::len).collect()
        }

        fn ids(&self) -> Vec<i64> {
            self.batches
                .iter()
                .flat_map(|b| b.rows.iter())
                .map(|row| match row[0] {
                    Value::Int(v) => v,
                    ref other => panic!("unexpected {other:?}"),
                })
                .collect()
        }
    }

    #[async_trait]
    impl BatchSink for RecordingSink {
        async fn send(&mut self, batch: &Batch) -> Result<u64, SinkError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on == Some(batch.index) {
                return Err(SinkError::BulkCopy {
                    table: "dbo.t".into(),
                    source: DbError::Write("connection reset".into()),
                });
            }
            self.batches.push(batch.clone());
            Ok(batch.len() as u64)
        }
    }

    fn id_source(n: i64) -> Box<dyn RowSource> {
        let table = Table::new(vec![Series::new(
            "id",
            SourceType::Int64,
            (0..n).map(Value::Int).collect(),
        )])
        .unwrap();
        Box::new(table.into_rows())
    }

    fn scheduler(batch_size: usize, workers: usize, prefetch: usize) -> PipelineScheduler {
        PipelineScheduler::new(
            PipelineConfig::default()
                .with_batch_size(batch_size)
                .with_worker_count(workers)
                .with_prefetch_depth(prefetch),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_default_batches_for_12001_rows() {
        let mut sink = RecordingSink::default();
        let summary = PipelineScheduler::new(PipelineConfig::default())
            .unwrap()
            .run(id_source(12_001), ColumnMap::default(), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.sizes(), vec![5000, 5000, 2001]);
        assert_eq!(summary.rows, 12_001);
        assert_eq!(summary.batches, 3);
        assert_eq!(sink.ids(), (0..12_001).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_preserved_for_any_configuration() {
        let configs = [
            (1, 4, 2),
            (7, 3, 5),
            (100, 1, 1),
            (64, 8, 8),
            (333, 2, 3),
            (1000, 4, 2),
            (5000, 4, 2),
        ];

        for (batch_size, workers, prefetch) in configs {
            let mut sink = RecordingSink {
                delay: Some(Duration::from_micros(50)),
                ..Default::default()
            };
            scheduler(batch_size, workers, prefetch)
                .run(id_source(1000), ColumnMap::default(), &mut sink)
                .await
                .unwrap();

            assert_eq!(
                sink.ids(),
                (0..1000).collect::<Vec<_>>(),
                "batch_size={batch_size} workers={workers} prefetch={prefetch}"
            );
            let indices: Vec<u64> = sink.batches.iter().map(|b| b.index).collect();
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
            assert!(sink.batches.iter().all(|b| b.len() <= batch_size));
        }
    }

    #[tokio::test]
    async fn test_summary_counts_only_its_own_run() {
        let scheduler = scheduler(4, 2, 2);

        for _ in 0..2 {
            let mut sink = RecordingSink::default();
            let summary = scheduler
                .run(id_source(10), ColumnMap::default(), &mut sink)
                .await
                .unwrap();
            assert_eq!(summary.rows, 10);
            assert_eq!(summary.batches, 3);
        }

        let total = scheduler.metrics().snapshot();
        assert_eq!(total.records_processed, 20);
        assert_eq!(total.batches_processed, 6);
    }

    #[tokio::test]
    async fn test_empty_source_sends_nothing() {
        let mut sink = RecordingSink::default();
        let summary = scheduler(10, 2, 2)
            .run(id_source(0), ColumnMap::default(), &mut sink)
            .await
            .unwrap();

        assert!(sink.batches.is_empty());
        assert_eq!(summary.rows, 0);
        assert!(summary.empty_batches >= 1);
    }

    #[tokio::test]
    async fn test_conversion_error_stops_delivery() {
        let values = (0..1000)
            .map(|i| {
                if i == 700 {
                    Value::String("not a number".into())
                } else {
                    Value::Int(i)
                }
            })
            .collect();
        let table = Table::new(vec![Series::new("amount", SourceType::Utf8, values)]).unwrap();
        let columns = ColumnMap::new(vec![
            ColumnDescriptor::new("amount", SqlType::Decimal).with_precision(18, 0),
        ]);

        let mut sink = RecordingSink::default();
        let err = scheduler(100, 4, 4)
            .run(Box::new(table.into_rows()), columns, &mut sink)
            .await
            .unwrap_err();

        match err {
            ProcessingError::Conversion { batch, row, .. } => assert_eq!((batch, row), (7, 700)),
            other => panic!("unexpected {other:?}"),
        }
        let delivered: Vec<u64> = sink.batches.iter().map(|b| b.index).collect();
        assert_eq!(delivered, (0..7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_sink_error_is_returned() {
        let mut sink = RecordingSink {
            fail_on: Some(2),
            ..Default::default()
        };
        let err = scheduler(10, 2, 3)
            .run(id_source(100), ColumnMap::default(), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessingError::Sink { batch: 2, .. }));
        assert_eq!(sink.sizes(), vec![10, 10]);
    }

    struct BrokenSource {
        schema: TableSchema,
        emitted: usize,
    }

    impl RowSource for BrokenSource {
        fn schema(&self) -> &TableSchema {
            &self.schema
        }

        fn row_count(&self) -> usize {
            50
        }

        fn next_row(&mut self) -> Result<Option<RowData>, ModelError> {
            if self.emitted == 25 {
                return Err(ModelError::Source("truncated input".into()));
            }
            self.emitted += 1;
            Ok(Some(RowData::new(vec![model::core::value::FieldValue::new(
                "id",
                Value::Int(self.emitted as i64),
            )])))
        }
    }

    #[tokio::test]
    async fn test_source_error_is_returned() {
        let mut sink = RecordingSink::default();
        let source = Box::new(BrokenSource {
            schema: TableSchema::default(),
            emitted: 0,
        });
        let err = scheduler(10, 2, 2)
            .run(source, ColumnMap::default(), &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessingError::Source { batch: 2, .. }));
        assert_eq!(sink.sizes(), vec![10, 10]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(PipelineScheduler::new(PipelineConfig::default().with_worker_count(0)).is_err());
    }
}
