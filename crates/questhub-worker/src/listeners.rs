//! Run listeners that pin achievements into run-scope context.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::types::AchievementId;
use questhub_database::store::AchievementStore;
use questhub_entity::achievement::AchievementType;

use crate::context::{RunContext, keys};
use crate::pipeline::RunListener;

/// Loads the achievement of a direct check once per run.
pub struct PinTargetAchievement {
    achievements: Arc<dyn AchievementStore>,
    achievement_id: AchievementId,
}

impl PinTargetAchievement {
    /// Pin `achievement_id` under [`keys::TARGET_ACHIEVEMENT`].
    pub fn new(achievements: Arc<dyn AchievementStore>, achievement_id: AchievementId) -> Self {
        Self {
            achievements,
            achievement_id,
        }
    }
}

#[async_trait]
impl RunListener for PinTargetAchievement {
    fn name(&self) -> &str {
        "pin-target-achievement"
    }

    async fn before_run(&self, ctx: &mut RunContext) -> AppResult<()> {
        let achievement = self
            .achievements
            .find_by_id(self.achievement_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Achievement {} not found", self.achievement_id))
            })?;
        info!(
            run_id = %ctx.run_id(),
            achievement_id = %achievement.id,
            achievement_type = %achievement.achievement_type,
            target_value = achievement.target_value,
            "Target achievement pinned"
        );
        ctx.put_run(keys::TARGET_ACHIEVEMENT, &achievement)
    }
}

/// Loads every active perfect-day achievement once per run.
pub struct PinPerfectDayAchievements {
    achievements: Arc<dyn AchievementStore>,
}

impl PinPerfectDayAchievements {
    /// Pin the list under [`keys::PERFECT_DAY_ACHIEVEMENTS`].
    pub fn new(achievements: Arc<dyn AchievementStore>) -> Self {
        Self { achievements }
    }
}

#[async_trait]
impl RunListener for PinPerfectDayAchievements {
    fn name(&self) -> &str {
        "pin-perfect-day-achievements"
    }

    async fn before_run(&self, ctx: &mut RunContext) -> AppResult<()> {
        let candidates = self
            .achievements
            .find_active_by_type(AchievementType::PerfectDayCount)
            .await?;
        info!(
            run_id = %ctx.run_id(),
            candidates = candidates.len(),
            "Perfect-day achievements pinned"
        );
        ctx.put_run(keys::PERFECT_DAY_ACHIEVEMENTS, &candidates)
    }
}
