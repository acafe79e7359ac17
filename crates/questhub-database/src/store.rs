//! Storage traits consumed by the achievement batch.
//!
//! Both the PostgreSQL repositories and [`crate::MemoryStore`] implement
//! these. Bulk writes are all-or-nothing: a uniqueness violation is reported
//! as [`questhub_core::error::ErrorKind::Conflict`] and nothing is written.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use questhub_core::result::AppResult;
use questhub_core::types::{AchievementId, PageRequest, UserId};
use questhub_entity::achievement::{Achievement, AchievementType, AchievementUnlock};
use questhub_entity::metric::UserMetric;
use questhub_entity::notification::Notification;

/// Achievement definitions.
#[async_trait]
pub trait AchievementStore: Send + Sync + 'static {
    /// Look up one achievement.
    async fn find_by_id(&self, id: AchievementId) -> AppResult<Option<Achievement>>;

    /// Active achievements of a type, in storage order (not sorted by target).
    async fn find_active_by_type(
        &self,
        achievement_type: AchievementType,
    ) -> AppResult<Vec<Achievement>>;

    /// The active achievement of `achievement_type` with the smallest target
    /// that `user_id` has not unlocked yet.
    async fn find_next_locked(
        &self,
        achievement_type: AchievementType,
        user_id: UserId,
    ) -> AppResult<Option<Achievement>>;

    /// Insert a new achievement. Conflict if `(type, target)` is taken.
    async fn create(&self, achievement: &Achievement) -> AppResult<Achievement>;

    /// Persist activate / inactivate / edit changes.
    async fn update(&self, achievement: &Achievement) -> AppResult<Achievement>;
}

/// Achievement unlock records.
#[async_trait]
pub trait UnlockStore: Send + Sync + 'static {
    /// Every achievement `user_id` has unlocked.
    async fn unlocked_ids_for_user(&self, user_id: UserId) -> AppResult<HashSet<AchievementId>>;

    /// Write unlocks and their notifications in one transaction, unlocks first.
    ///
    /// Conflict if any `(achievement, user)` pair is already unlocked, or
    /// appears twice in `unlocks`.
    async fn insert_with_notifications(
        &self,
        unlocks: &[AchievementUnlock],
        notifications: &[Notification],
    ) -> AppResult<()>;

    /// Unlocks of one user, oldest first.
    async fn unlocks_for_user(&self, user_id: UserId) -> AppResult<Vec<AchievementUnlock>>;
}

/// Per-user metric counters.
#[async_trait]
pub trait UserMetricStore: Send + Sync + 'static {
    /// The counters of one user.
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<UserMetric>>;

    /// One page of users whose counter for `achievement_type` is at least
    /// `threshold`, ordered by user id.
    async fn find_users_with_metric_at_least(
        &self,
        achievement_type: AchievementType,
        threshold: i64,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>>;

    /// One page of users who completed every quest they had on `date`,
    /// ordered by user id.
    async fn find_perfect_day_users(
        &self,
        date: NaiveDate,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>>;

    /// Add one perfect day to each user's counter in one transaction.
    ///
    /// Only the perfect-day column changes, so counters moved concurrently by
    /// upstream events survive. Users without a record start from zero.
    async fn increment_perfect_days(&self, user_ids: &[UserId]) -> AppResult<()>;
}
