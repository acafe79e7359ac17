//! Pipeline orchestration: an ordered run of stages with run-level hooks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use questhub_core::result::AppResult;
use questhub_core::types::RunId;

use crate::context::RunContext;
use crate::error::{BatchError, BatchResult};
use crate::executor::{StageExecutor, StageReport, StageStatus};
use crate::stage::Stage;

/// Lifecycle of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run-level hooks are running.
    Starting,
    /// Stages are running.
    Running,
    /// Every stage completed.
    Completed,
    /// A hook or a stage failed.
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Outcome of one pipeline run, returned to whoever triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Pipeline name.
    pub pipeline: String,
    /// Terminal status.
    pub status: RunStatus,
    /// One report per stage that was started.
    pub stages: Vec<StageReport>,
    /// Wall time of the run.
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Failure message, if the run failed.
    pub error: Option<String>,
    /// User ids carried by the fan-out call, zero when none was made.
    pub fanned_out: usize,
}

impl RunReport {
    fn new(run_id: RunId, pipeline: &str) -> Self {
        Self {
            run_id,
            pipeline: pipeline.to_string(),
            status: RunStatus::Starting,
            stages: Vec::new(),
            duration: Duration::ZERO,
            error: None,
            fanned_out: 0,
        }
    }

    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// The stage that stopped the run, if any.
    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.status == StageStatus::Failed)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Hooks around a whole run.
///
/// `before_run` hooks run in registration order before any stage; the first
/// failure fails the run and no stage executes. `after_run` hooks always run
/// once the run is terminal; their errors are logged and do not change the
/// status.
#[async_trait]
pub trait RunListener: Send + Sync {
    /// Listener name used in logs.
    fn name(&self) -> &str;

    /// Prepare run-scope context.
    async fn before_run(&self, _ctx: &mut RunContext) -> AppResult<()> {
        Ok(())
    }

    /// React to the terminal run.
    async fn after_run(&self, _ctx: &RunContext, _report: &mut RunReport) -> AppResult<()> {
        Ok(())
    }
}

/// A stage with its item types erased so stages of different shapes can
/// share one pipeline.
#[async_trait]
trait RunnableStage: Send + Sync {
    fn name(&self) -> &str;

    async fn run(
        &self,
        executor: &StageExecutor,
        ctx: &mut RunContext,
        report: &mut StageReport,
    ) -> BatchResult<()>;
}

#[async_trait]
impl<S: Stage> RunnableStage for S {
    fn name(&self) -> &str {
        Stage::name(self)
    }

    async fn run(
        &self,
        executor: &StageExecutor,
        ctx: &mut RunContext,
        report: &mut StageReport,
    ) -> BatchResult<()> {
        executor.execute(self, ctx, report).await
    }
}

/// An ordered, linear sequence of stages.
pub struct Pipeline {
    name: String,
    executor: StageExecutor,
    stages: Vec<Box<dyn RunnableStage>>,
    listeners: Vec<Arc<dyn RunListener>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder(name: impl Into<String>, executor: StageExecutor) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            executor,
            stages: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run with a fresh context.
    pub async fn run(&self) -> RunReport {
        let mut ctx = RunContext::new();
        self.run_with(&mut ctx).await
    }

    /// Run with a caller-provided context, which is left in its final state.
    pub async fn run_with(&self, ctx: &mut RunContext) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new(ctx.run_id(), &self.name);
        info!(
            run_id = %report.run_id,
            pipeline = %self.name,
            stages = self.stages.len(),
            "Run starting"
        );

        let outcome = match self.before_run(ctx).await {
            Ok(()) => {
                report.status = RunStatus::Running;
                self.run_stages(ctx, &mut report).await
            }
            Err(e) => Err(e),
        };

        report.status = match &outcome {
            Ok(()) => RunStatus::Completed,
            Err(_) => RunStatus::Failed,
        };
        report.error = outcome.err().map(|e| e.to_string());

        for listener in &self.listeners {
            if let Err(e) = listener.after_run(ctx, &mut report).await {
                warn!(
                    run_id = %report.run_id,
                    listener = listener.name(),
                    error = %e,
                    "after_run hook failed"
                );
            }
        }

        report.duration = started.elapsed();
        match report.status {
            RunStatus::Completed => info!(
                run_id = %report.run_id,
                pipeline = %self.name,
                duration_ms = report.duration.as_millis() as u64,
                fanned_out = report.fanned_out,
                "Run completed"
            ),
            _ => error!(
                run_id = %report.run_id,
                pipeline = %self.name,
                error = report.error.as_deref().unwrap_or("unknown"),
                "Run failed"
            ),
        }
        report
    }

    async fn before_run(&self, ctx: &mut RunContext) -> BatchResult<()> {
        for listener in &self.listeners {
            listener
                .before_run(ctx)
                .await
                .map_err(|e| BatchError::hook("before_run", listener.name(), e))?;
        }
        Ok(())
    }

    async fn run_stages(&self, ctx: &mut RunContext, report: &mut RunReport) -> BatchResult<()> {
        for stage in &self.stages {
            let mut stage_report = StageReport::new(stage.name());
            let result = stage.run(&self.executor, ctx, &mut stage_report).await;
            report.stages.push(stage_report);
            result?;
        }
        Ok(())
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    name: String,
    executor: StageExecutor,
    stages: Vec<Box<dyn RunnableStage>>,
    listeners: Vec<Arc<dyn RunListener>>,
}

impl PipelineBuilder {
    /// Append a stage.
    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Register a run listener.
    pub fn listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Finish building.
    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            executor: self.executor,
            stages: self.stages,
            listeners: self.listeners,
        }
    }
}
