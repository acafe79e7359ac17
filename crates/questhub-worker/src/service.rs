//! Entry points that assemble and trigger the achievement pipelines.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use questhub_core::config::BatchConfig;
use questhub_core::traits::PushNotifier;
use questhub_core::types::AchievementId;
use questhub_database::DatabasePool;
use questhub_database::store::{AchievementStore, UnlockStore, UserMetricStore};
use questhub_service::AchievementEvaluator;

use crate::executor::StageExecutor;
use crate::fanout::NotificationFanOut;
use crate::listeners::{PinPerfectDayAchievements, PinTargetAchievement};
use crate::pipeline::{Pipeline, RunReport};
use crate::stages::{
    AchievementCheckStage, PerfectDayDiscoveryStage, PerfectDayIncrementStage,
    PerfectDayUnlockStage,
};

/// Name of the pipeline run after an achievement is created or changed.
pub const DIRECT_CHECK_PIPELINE: &str = "achievement-direct-check";
/// Name of the daily perfect-day pipeline.
pub const PERFECT_DAY_PIPELINE: &str = "perfect-day-check";

/// Owns the stores and settings shared by every run and builds a fresh
/// pipeline per trigger.
#[derive(Clone)]
pub struct AchievementBatch {
    achievements: Arc<dyn AchievementStore>,
    unlocks: Arc<dyn UnlockStore>,
    metrics: Arc<dyn UserMetricStore>,
    evaluator: AchievementEvaluator,
    notifier: Arc<dyn PushNotifier>,
    config: BatchConfig,
}

impl std::fmt::Debug for AchievementBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementBatch")
            .field("notifier", &self.notifier)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AchievementBatch {
    /// Create a batch over separate stores.
    pub fn new(
        achievements: Arc<dyn AchievementStore>,
        unlocks: Arc<dyn UnlockStore>,
        metrics: Arc<dyn UserMetricStore>,
        notifier: Arc<dyn PushNotifier>,
        config: BatchConfig,
    ) -> Self {
        let evaluator = AchievementEvaluator::new(
            Arc::clone(&achievements),
            Arc::clone(&unlocks),
            Arc::clone(&metrics),
        );
        Self {
            achievements,
            unlocks,
            metrics,
            evaluator,
            notifier,
            config,
        }
    }

    /// Create a batch over one value that implements every store.
    pub fn with_store<S>(store: Arc<S>, notifier: Arc<dyn PushNotifier>, config: BatchConfig) -> Self
    where
        S: AchievementStore + UnlockStore + UserMetricStore,
    {
        Self::new(store.clone(), store.clone(), store, notifier, config)
    }

    /// Create a batch over the PostgreSQL repositories.
    pub fn from_database(
        db: &DatabasePool,
        notifier: Arc<dyn PushNotifier>,
        config: BatchConfig,
    ) -> Self {
        Self::new(
            Arc::new(db.achievements()),
            Arc::new(db.unlocks()),
            Arc::new(db.metrics()),
            notifier,
            config,
        )
    }

    /// Batch settings.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Unlock the type of `achievement_id` for every user already past it.
    pub fn direct_check_pipeline(&self, achievement_id: AchievementId) -> Pipeline {
        Pipeline::builder(DIRECT_CHECK_PIPELINE, StageExecutor::from_config(&self.config))
            .listener(Arc::new(PinTargetAchievement::new(
                Arc::clone(&self.achievements),
                achievement_id,
            )))
            .listener(Arc::new(NotificationFanOut::new(Arc::clone(&self.notifier))))
            .stage(AchievementCheckStage::new(
                self.evaluator.clone(),
                Arc::clone(&self.unlocks),
                Arc::clone(&self.metrics),
                self.config.page_size,
            ))
            .build()
    }

    /// Count the perfect day of `date` and unlock what it earns.
    pub fn perfect_day_pipeline(&self, date: NaiveDate) -> Pipeline {
        Pipeline::builder(PERFECT_DAY_PIPELINE, StageExecutor::from_config(&self.config))
            .listener(Arc::new(PinPerfectDayAchievements::new(Arc::clone(
                &self.achievements,
            ))))
            .listener(Arc::new(NotificationFanOut::new(Arc::clone(&self.notifier))))
            .stage(PerfectDayDiscoveryStage::new(
                Arc::clone(&self.metrics),
                date,
                self.config.page_size,
            ))
            .stage(PerfectDayIncrementStage::new(
                Arc::clone(&self.metrics),
                self.config.page_size,
            ))
            .stage(PerfectDayUnlockStage::new(
                self.evaluator.clone(),
                Arc::clone(&self.unlocks),
                self.config.page_size,
            ))
            .build()
    }

    /// Run the direct check for `achievement_id`.
    pub async fn run_direct_check(&self, achievement_id: AchievementId) -> RunReport {
        info!(achievement_id = %achievement_id, "Direct achievement check triggered");
        self.direct_check_pipeline(achievement_id).run().await
    }

    /// Run the perfect-day check for `date`.
    pub async fn run_perfect_day_check(&self, date: NaiveDate) -> RunReport {
        info!(date = %date, "Perfect-day check triggered");
        self.perfect_day_pipeline(date).run().await
    }
}
