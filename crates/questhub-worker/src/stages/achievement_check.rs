//! Direct check: unlock one achievement type for every user already past
//! the pinned target.

use std::sync::Arc;

use async_trait::async_trait;

use questhub_core::result::AppResult;
use questhub_core::types::UserId;
use questhub_database::store::{UnlockStore, UserMetricStore};
use questhub_entity::achievement::Achievement;
use questhub_service::{AchievementEvaluator, UnlockOutcome};

use super::notified_users;
use crate::context::{RunContext, keys};
use crate::paged::PagedSource;
use crate::stage::Stage;

/// Pages users whose metric meets the pinned target, evaluates each one,
/// and writes unlocks with their notifications.
pub struct AchievementCheckStage {
    evaluator: AchievementEvaluator,
    unlocks: Arc<dyn UnlockStore>,
    metrics: Arc<dyn UserMetricStore>,
    page_size: u64,
}

impl AchievementCheckStage {
    /// Creates the stage.
    pub fn new(
        evaluator: AchievementEvaluator,
        unlocks: Arc<dyn UnlockStore>,
        metrics: Arc<dyn UserMetricStore>,
        page_size: u64,
    ) -> Self {
        Self {
            evaluator,
            unlocks,
            metrics,
            page_size,
        }
    }
}

#[async_trait]
impl Stage for AchievementCheckStage {
    type Item = UserId;
    type Output = UnlockOutcome;

    fn name(&self) -> &str {
        "achievement-check"
    }

    async fn source(&self, ctx: &RunContext) -> AppResult<PagedSource<UserId>> {
        let target: Achievement = ctx.require_run(keys::TARGET_ACHIEVEMENT)?;
        let (kind, threshold) = (target.achievement_type, target.target_value);
        let metrics = Arc::clone(&self.metrics);
        Ok(PagedSource::new(self.page_size, move |page| {
            let metrics = Arc::clone(&metrics);
            async move {
                metrics
                    .find_users_with_metric_at_least(kind, threshold, &page)
                    .await
            }
        }))
    }

    async fn process(
        &self,
        user_id: &UserId,
        ctx: &RunContext,
    ) -> AppResult<Option<UnlockOutcome>> {
        let target: Achievement = ctx.require_run(keys::TARGET_ACHIEVEMENT)?;
        self.evaluator.check_and_unlock_for(&target, *user_id).await
    }

    async fn write(&self, outcomes: &[UnlockOutcome]) -> AppResult<()> {
        let (unlocks, notifications): (Vec<_>, Vec<_>) = outcomes
            .iter()
            .map(|o| (o.unlock.clone(), o.notification.clone()))
            .unzip();
        self.unlocks
            .insert_with_notifications(&unlocks, &notifications)
            .await
    }

    fn after_write(&self, outcomes: &[UnlockOutcome], ctx: &mut RunContext) -> AppResult<()> {
        ctx.put_stage(keys::NOTIFIED_USER_IDS, &notified_users(outcomes))
    }

    fn accumulator_key(&self) -> Option<&'static str> {
        Some(keys::NOTIFIED_USER_IDS)
    }
}
