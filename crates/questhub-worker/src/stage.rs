//! The stage contract and its lifecycle hooks.

use async_trait::async_trait;

use questhub_core::result::AppResult;

use crate::context::RunContext;
use crate::executor::StageStatus;
use crate::paged::PagedSource;

/// One phase of a pipeline run: read, transform, and persist over chunks.
///
/// The executor drives a stage like this:
///
/// 1. `before_stage` once, then `source` once.
/// 2. Per chunk: `process` for every item, `write` for the produced
///    outputs, `after_write`, then `after_chunk`.
/// 3. `after_stage` once, whether the stage completed or failed.
///
/// Stage-scope context is wiped by the executor after `after_stage`.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Item read from the source.
    type Item: Send + Sync + 'static;
    /// Result of processing one item.
    type Output: Send + Sync + 'static;

    /// Stage name used in logs and reports.
    fn name(&self) -> &str;

    /// Open the paged input of this execution.
    async fn source(&self, ctx: &RunContext) -> AppResult<PagedSource<Self::Item>>;

    /// Seed stage-scope context before the first chunk.
    async fn before_stage(&self, _ctx: &mut RunContext) -> AppResult<()> {
        Ok(())
    }

    /// Transform one item. `None` filters the item out of the chunk.
    async fn process(&self, item: &Self::Item, ctx: &RunContext)
    -> AppResult<Option<Self::Output>>;

    /// Persist the outputs of one chunk. Not called for an empty chunk.
    async fn write(&self, outputs: &[Self::Output]) -> AppResult<()>;

    /// Called after a successful persist, or after a chunk whose items were
    /// all filtered out.
    fn after_write(&self, _outputs: &[Self::Output], _ctx: &mut RunContext) -> AppResult<()> {
        Ok(())
    }

    /// Stage-scope list that `after_chunk` merges upward.
    fn accumulator_key(&self) -> Option<&'static str> {
        None
    }

    /// Called at every chunk boundary, with `complete` set when the chunk
    /// committed.
    ///
    /// The default merges the accumulator into run scope only for a complete
    /// chunk, then removes the stage-scope entry in every case, so a chunk
    /// contributes at most once.
    fn after_chunk(&self, ctx: &mut RunContext, complete: bool) -> AppResult<()> {
        let Some(key) = self.accumulator_key() else {
            return Ok(());
        };
        let merged = if complete {
            ctx.merge_list_stage_into_run(key).map(|_| ())
        } else {
            Ok(())
        };
        ctx.remove_stage(key);
        merged
    }

    /// Called once after the last chunk.
    async fn after_stage(&self, _ctx: &mut RunContext, _status: StageStatus) -> AppResult<()> {
        Ok(())
    }
}
