//! Stage executor: chunked read → transform → persist with bounded retries.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info};

use questhub_core::config::BatchConfig;
use questhub_core::types::RunId;

use crate::context::RunContext;
use crate::error::{BatchError, BatchResult};
use crate::paged::ChunkReader;
use crate::retry::RetryPolicy;
use crate::stage::Stage;

/// Lifecycle of one stage execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not started yet.
    Idle,
    /// Processing chunks.
    Running,
    /// Every chunk committed.
    Completed,
    /// Stopped on an error.
    Failed,
}

/// What one stage execution did.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Stage name.
    pub stage: String,
    /// Final status.
    pub status: StageStatus,
    /// Chunks read.
    pub chunks: u64,
    /// Items read.
    pub read_count: u64,
    /// Outputs persisted.
    pub write_count: u64,
    /// Items filtered out by the transform.
    pub filter_count: u64,
    /// Extra transform attempts across all items.
    pub transform_retries: u64,
    /// Extra persist attempts across all chunks.
    pub persist_retries: u64,
    /// Wall time of the stage.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Failure message, if the stage failed.
    pub error: Option<String>,
}

impl StageReport {
    /// Fresh report for `stage`.
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Idle,
            chunks: 0,
            read_count: 0,
            write_count: 0,
            filter_count: 0,
            transform_retries: 0,
            persist_retries: 0,
            duration: Duration::ZERO,
            error: None,
        }
    }
}

/// Runs stages chunk by chunk.
///
/// Chunks run strictly one after another. Read errors fail the stage at
/// once; transform errors are retried per item and persist errors per
/// chunk, each against its own budget.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    chunk_size: usize,
    retry: RetryPolicy,
}

impl StageExecutor {
    /// Executor applying `retry` to both phases, each with its own budget.
    pub fn new(chunk_size: usize, retry: RetryPolicy) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            retry,
        }
    }

    /// Executor configured from `batch`.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.chunk_size, RetryPolicy::from_config(config))
    }

    /// Execute `stage` to a terminal state, filling in `report`.
    pub async fn execute<S: Stage>(
        &self,
        stage: &S,
        ctx: &mut RunContext,
        report: &mut StageReport,
    ) -> BatchResult<()> {
        let run_id = ctx.run_id();
        let started = Instant::now();
        report.status = StageStatus::Running;
        info!(run_id = %run_id, stage = stage.name(), "Stage started");

        let mut result = self.run_chunks(stage, ctx, report, run_id).await;
        let status = if result.is_ok() {
            StageStatus::Completed
        } else {
            StageStatus::Failed
        };

        if let Err(e) = stage.after_stage(ctx, status).await {
            let hook_err = BatchError::hook("after_stage", stage.name(), e);
            if result.is_ok() {
                result = Err(hook_err);
            } else {
                error!(
                    run_id = %run_id,
                    stage = stage.name(),
                    error = %hook_err,
                    "Cleanup after failed stage also failed"
                );
            }
        }
        ctx.clear_stage();

        report.duration = started.elapsed();
        match &result {
            Ok(()) => {
                report.status = StageStatus::Completed;
                info!(
                    run_id = %run_id,
                    stage = stage.name(),
                    chunks = report.chunks,
                    read = report.read_count,
                    written = report.write_count,
                    filtered = report.filter_count,
                    duration_ms = report.duration.as_millis() as u64,
                    "Stage completed"
                );
            }
            Err(e) => {
                report.status = StageStatus::Failed;
                report.error = Some(e.to_string());
                error!(
                    run_id = %run_id,
                    stage = stage.name(),
                    kind = e.label(),
                    error = %e,
                    "Stage failed"
                );
            }
        }
        result
    }

    async fn run_chunks<S: Stage>(
        &self,
        stage: &S,
        ctx: &mut RunContext,
        report: &mut StageReport,
        run_id: RunId,
    ) -> BatchResult<()> {
        stage
            .before_stage(ctx)
            .await
            .map_err(|e| BatchError::hook("before_stage", stage.name(), e))?;

        let source = stage.source(ctx).await.map_err(|e| BatchError::Read {
            stage: stage.name().to_string(),
            source: e,
        })?;
        let mut reader = ChunkReader::new(source, self.chunk_size);

        loop {
            let items = reader.read_chunk().await.map_err(|e| BatchError::Read {
                stage: stage.name().to_string(),
                source: e,
            })?;
            if items.is_empty() {
                return Ok(());
            }

            report.chunks += 1;
            report.read_count += items.len() as u64;
            debug!(
                run_id = %run_id,
                stage = stage.name(),
                chunk = report.chunks,
                items = items.len(),
                "Processing chunk"
            );

            let committed = self.process_chunk(stage, ctx, &items, report).await;
            let boundary = stage.after_chunk(ctx, committed.is_ok());
            committed?;
            boundary.map_err(|e| BatchError::hook("after_chunk", stage.name(), e))?;
        }
    }

    async fn process_chunk<S: Stage>(
        &self,
        stage: &S,
        ctx: &mut RunContext,
        items: &[S::Item],
        report: &mut StageReport,
    ) -> BatchResult<()> {
        let outputs = self.transform_chunk(stage, ctx, items, report).await?;

        if !outputs.is_empty() {
            let (_, attempts) = self
                .retry
                .run("persist", || stage.write(&outputs))
                .await
                .map_err(|exhausted| {
                    if exhausted.error.is_conflict() {
                        BatchError::DuplicateUnlock {
                            stage: stage.name().to_string(),
                            source: exhausted.error,
                        }
                    } else {
                        BatchError::Persist {
                            stage: stage.name().to_string(),
                            attempts: exhausted.attempts,
                            source: exhausted.error,
                        }
                    }
                })?;
            report.persist_retries += u64::from(attempts - 1);
            report.write_count += outputs.len() as u64;
        }

        stage
            .after_write(&outputs, ctx)
            .map_err(|e| BatchError::hook("after_write", stage.name(), e))
    }

    async fn transform_chunk<S: Stage>(
        &self,
        stage: &S,
        ctx: &RunContext,
        items: &[S::Item],
        report: &mut StageReport,
    ) -> BatchResult<Vec<S::Output>> {
        let mut outputs = Vec::with_capacity(items.len());
        for item in items {
            let (output, attempts) = self
                .retry
                .run("transform", || stage.process(item, ctx))
                .await
                .map_err(|exhausted| BatchError::Transform {
                    stage: stage.name().to_string(),
                    attempts: exhausted.attempts,
                    source: exhausted.error,
                })?;
            report.transform_retries += u64::from(attempts - 1);
            match output {
                Some(output) => outputs.push(output),
                None => report.filter_count += 1,
            }
        }
        Ok(outputs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
