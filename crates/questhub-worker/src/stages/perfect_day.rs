//! Perfect-day check: find yesterday's perfect-day users, bump their
//! counters, then unlock the first perfect-day achievement each one reaches.
//!
//! The three stages hand their results to each other through run-scope user
//! lists, so every stage only ever sees what the previous one committed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use questhub_core::result::AppResult;
use questhub_core::types::UserId;
use questhub_database::store::{UnlockStore, UserMetricStore};
use questhub_entity::achievement::Achievement;
use questhub_service::{AchievementEvaluator, UnlockOutcome};

use super::notified_users;
use crate::context::{RunContext, keys};
use crate::paged::PagedSource;
use crate::stage::Stage;

/// Users recorded in run scope under `key` by an earlier stage.
fn committed_users(ctx: &RunContext, key: &str, page_size: u64) -> AppResult<PagedSource<UserId>> {
    let users: Vec<UserId> = ctx.get_run(key)?.unwrap_or_default();
    Ok(PagedSource::from_vec(users, page_size))
}

/// Collects the users who completed every quest they had on `date`.
pub struct PerfectDayDiscoveryStage {
    metrics: Arc<dyn UserMetricStore>,
    date: NaiveDate,
    page_size: u64,
}

impl PerfectDayDiscoveryStage {
    /// Creates the stage for `date`.
    pub fn new(metrics: Arc<dyn UserMetricStore>, date: NaiveDate, page_size: u64) -> Self {
        Self {
            metrics,
            date,
            page_size,
        }
    }
}

#[async_trait]
impl Stage for PerfectDayDiscoveryStage {
    type Item = UserId;
    type Output = UserId;

    fn name(&self) -> &str {
        "perfect-day-discovery"
    }

    async fn source(&self, _ctx: &RunContext) -> AppResult<PagedSource<UserId>> {
        let metrics = Arc::clone(&self.metrics);
        let date = self.date;
        Ok(PagedSource::new(self.page_size, move |page| {
            let metrics = Arc::clone(&metrics);
            async move { metrics.find_perfect_day_users(date, &page).await }
        }))
    }

    async fn process(&self, user_id: &UserId, _ctx: &RunContext) -> AppResult<Option<UserId>> {
        Ok(Some(*user_id))
    }

    async fn write(&self, user_ids: &[UserId]) -> AppResult<()> {
        debug!(date = %self.date, users = user_ids.len(), "Perfect-day users found");
        Ok(())
    }

    fn after_write(&self, user_ids: &[UserId], ctx: &mut RunContext) -> AppResult<()> {
        ctx.put_stage(keys::PERFECT_DAY_USER_IDS, user_ids)
    }

    fn accumulator_key(&self) -> Option<&'static str> {
        Some(keys::PERFECT_DAY_USER_IDS)
    }
}

/// Adds one perfect day to the counters of every discovered user.
///
/// The write is a per-column increment, never a full-row save, so counters
/// that upstream events move while the stage runs are left alone.
pub struct PerfectDayIncrementStage {
    metrics: Arc<dyn UserMetricStore>,
    page_size: u64,
}

impl PerfectDayIncrementStage {
    /// Creates the stage.
    pub fn new(metrics: Arc<dyn UserMetricStore>, page_size: u64) -> Self {
        Self { metrics, page_size }
    }
}

#[async_trait]
impl Stage for PerfectDayIncrementStage {
    type Item = UserId;
    type Output = UserId;

    fn name(&self) -> &str {
        "perfect-day-increment"
    }

    async fn source(&self, ctx: &RunContext) -> AppResult<PagedSource<UserId>> {
        committed_users(ctx, keys::PERFECT_DAY_USER_IDS, self.page_size)
    }

    async fn process(&self, user_id: &UserId, _ctx: &RunContext) -> AppResult<Option<UserId>> {
        Ok(Some(*user_id))
    }

    async fn write(&self, user_ids: &[UserId]) -> AppResult<()> {
        self.metrics.increment_perfect_days(user_ids).await
    }

    fn after_write(&self, user_ids: &[UserId], ctx: &mut RunContext) -> AppResult<()> {
        ctx.put_stage(keys::INCREMENTED_USER_IDS, user_ids)
    }

    fn accumulator_key(&self) -> Option<&'static str> {
        Some(keys::INCREMENTED_USER_IDS)
    }
}

/// Unlocks at most one perfect-day achievement per incremented user.
pub struct PerfectDayUnlockStage {
    evaluator: AchievementEvaluator,
    unlocks: Arc<dyn UnlockStore>,
    page_size: u64,
}

impl PerfectDayUnlockStage {
    /// Creates the stage.
    pub fn new(evaluator: AchievementEvaluator, unlocks: Arc<dyn UnlockStore>, page_size: u64) -> Self {
        Self {
            evaluator,
            unlocks,
            page_size,
        }
    }
}

#[async_trait]
impl Stage for PerfectDayUnlockStage {
    type Item = UserId;
    type Output = UnlockOutcome;

    fn name(&self) -> &str {
        "perfect-day-unlock"
    }

    async fn source(&self, ctx: &RunContext) -> AppResult<PagedSource<UserId>> {
        committed_users(ctx, keys::INCREMENTED_USER_IDS, self.page_size)
    }

    async fn before_stage(&self, ctx: &mut RunContext) -> AppResult<()> {
        let candidates: Vec<Achievement> = ctx
            .get_run(keys::PERFECT_DAY_ACHIEVEMENTS)?
            .unwrap_or_default();
        ctx.put_stage(keys::CANDIDATE_ACHIEVEMENTS, &candidates)
    }

    async fn process(
        &self,
        user_id: &UserId,
        ctx: &RunContext,
    ) -> AppResult<Option<UnlockOutcome>> {
        let candidates: Vec<Achievement> = ctx
            .get_stage(keys::CANDIDATE_ACHIEVEMENTS)?
            .unwrap_or_default();
        self.evaluator
            .check_first_achievable(&candidates, *user_id)
            .await
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
