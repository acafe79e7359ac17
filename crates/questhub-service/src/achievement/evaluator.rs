//! Unlock decisions.
//!
//! Two shapes are supported. The single check looks only at the smallest
//! locked target of a type; the multi check scans a candidate list in the
//! order it was given and takes the first reachable entry. Candidates are
//! deliberately not sorted there, so the result depends on list order.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::types::{AchievementId, UserId};
use questhub_database::store::{AchievementStore, UnlockStore, UserMetricStore};
use questhub_entity::achievement::{Achievement, AchievementUnlock};
use questhub_entity::metric::UserMetric;
use questhub_entity::notification::Notification;

use crate::notification::compose_unlock_notification;

/// An unlock together with the notification announcing it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockOutcome {
    /// The record to persist.
    pub unlock: AchievementUnlock,
    /// The notification to persist with it.
    pub notification: Notification,
}

impl UnlockOutcome {
    fn new(achievement: &Achievement, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            unlock: AchievementUnlock::new(achievement.id, user_id, now),
            notification: compose_unlock_notification(achievement, user_id, now),
        }
    }
}

/// First candidate, in iteration order, whose target `current` reaches.
pub fn first_achievable(candidates: &[Achievement], current: i64) -> Option<&Achievement> {
    candidates.iter().find(|a| a.can_achieve(current))
}

/// Decides which achievement a user unlocks.
#[derive(Clone)]
pub struct AchievementEvaluator {
    achievements: Arc<dyn AchievementStore>,
    unlocks: Arc<dyn UnlockStore>,
    metrics: Arc<dyn UserMetricStore>,
}

impl std::fmt::Debug for AchievementEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementEvaluator").finish_non_exhaustive()
    }
}

impl AchievementEvaluator {
    /// Creates a new evaluator over the given stores.
    pub fn new(
        achievements: Arc<dyn AchievementStore>,
        unlocks: Arc<dyn UnlockStore>,
        metrics: Arc<dyn UserMetricStore>,
    ) -> Self {
        Self {
            achievements,
            unlocks,
            metrics,
        }
    }

    /// Check `user_id` against the type of `achievement_id`.
    pub async fn check_and_unlock(
        &self,
        achievement_id: AchievementId,
        user_id: UserId,
    ) -> AppResult<Option<UnlockOutcome>> {
        let target = self
            .achievements
            .find_by_id(achievement_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Achievement {achievement_id} not found")))?;
        self.check_and_unlock_for(&target, user_id).await
    }

    /// Check `user_id` against the smallest still-locked active achievement
    /// of `target`'s type.
    ///
    /// Only that one achievement is considered per call. When none is left
    /// the empty placeholder takes its place and nothing unlocks.
    pub async fn check_and_unlock_for(
        &self,
        target: &Achievement,
        user_id: UserId,
    ) -> AppResult<Option<UnlockOutcome>> {
        let candidate = self
            .achievements
            .find_next_locked(target.achievement_type, user_id)
            .await?
            .unwrap_or_else(|| Achievement::empty(target.achievement_type));

        let value = self
            .current_metric(user_id)
            .await?
            .metric_value(target.achievement_type);

        if !candidate.can_achieve(value) {
            debug!(
                user_id = %user_id,
                achievement_type = %target.achievement_type,
                value,
                "No achievement reached"
            );
            return Ok(None);
        }

        debug!(
            user_id = %user_id,
            achievement_id = %candidate.id,
            target_value = candidate.target_value,
            value,
            "Achievement reached"
        );
        Ok(Some(UnlockOutcome::new(&candidate, user_id)))
    }

    /// Check `user_id` against a candidate list of one type.
    ///
    /// Candidates the user already holds are dropped first; the first
    /// remaining one the metric reaches is unlocked. At most one unlock
    /// results per call.
    pub async fn check_first_achievable(
        &self,
        candidates: &[Achievement],
        user_id: UserId,
    ) -> AppResult<Option<UnlockOutcome>> {
        let Some(achievement_type) = candidates.first().map(|a| a.achievement_type) else {
            return Ok(None);
        };

        let held = self.unlocks.unlocked_ids_for_user(user_id).await?;
        let locked: Vec<Achievement> = candidates
            .iter()
            .filter(|a| !held.contains(&a.id))
            .cloned()
            .collect();

        let value = self
            .current_metric(user_id)
            .await?
            .metric_value(achievement_type);

        Ok(first_achievable(&locked, value).map(|a| UnlockOutcome::new(a, user_id)))
    }

    /// Stored counters, or fresh ones for a user without a record.
    async fn current_metric(&self, user_id: UserId) -> AppResult<UserMetric> {
        Ok(self
            .metrics
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| UserMetric::new(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questhub_core::error::ErrorKind;
    use questhub_database::MemoryStore;
    use questhub_entity::achievement::AchievementType;

    fn evaluator(store: &MemoryStore) -> AchievementEvaluator {
        let store = Arc::new(store.clone());
        AchievementEvaluator::new(store.clone(), store.clone(), store)
    }

    async fn seed(store: &MemoryStore, kind: AchievementType, target: i64) -> Achievement {
        let achievement = Achievement::new(format!("{kind} {target}"), "", kind, target).unwrap();
        store.create(&achievement).await.unwrap()
    }

    async fn user_with(store: &MemoryStore, edit: impl FnOnce(&mut UserMetric)) -> UserId {
        let mut metric = UserMetric::new(UserId::new());
        edit(&mut metric);
        let user_id = metric.user_id;
        store.insert_metric(metric).await;
        user_id
    }

    #[test]
    fn test_first_achievable_keeps_iteration_order() {
        let kind = AchievementType::PerfectDayCount;
        let candidates = vec![
            Achievement::new("five", "", kind, 5).unwrap(),
            Achievement::new("one", "", kind, 1).unwrap(),
        ];
        assert_eq!(first_achievable(&candidates, 5).map(|a| a.target_value), Some(5));
        assert_eq!(first_achievable(&candidates, 3).map(|a| a.target_value), Some(1));
        assert!(first_achievable(&candidates, 0).is_none());
        assert!(first_achievable(&[], 100).is_none());
    }

    #[tokio::test]
    async fn test_direct_check_unlocks_only_smallest_target() {
        let store = MemoryStore::new();
        let one = seed(&store, AchievementType::CompletionCount, 1).await;
        seed(&store, AchievementType::CompletionCount, 2).await;
        let user = user_with(&store, |m| m.completion_count = 1).await;

        let outcome = evaluator(&store)
            .check_and_unlock(one.id, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.unlock.achievement_id, one.id);
        assert_eq!(outcome.unlock.user_id, user);
        assert_eq!(outcome.notification.user_id, user);
    }

    #[tokio::test]
    async fn test_direct_check_moves_to_next_target_after_unlock() {
        let store = MemoryStore::new();
        let one = seed(&store, AchievementType::CompletionCount, 1).await;
        let two = seed(&store, AchievementType::CompletionCount, 2).await;
        let user = user_with(&store, |m| m.completion_count = 5).await;
        let eval = evaluator(&store);

        let first = eval.check_and_unlock(one.id, user).await.unwrap().unwrap();
        store
            .insert_with_notifications(&[first.unlock], &[first.notification])
            .await
            .unwrap();

        let second = eval.check_and_unlock(one.id, user).await.unwrap().unwrap();
        assert_eq!(second.unlock.achievement_id, two.id);
    }

    #[tokio::test]
    async fn test_direct_check_with_nothing_left_uses_empty_placeholder() {
        let store = MemoryStore::new();
        let only = seed(&store, AchievementType::UserLevel, 2).await;
        let user = user_with(&store, |m| m.user_level = 9).await;
        let eval = evaluator(&store);

        let outcome = eval.check_and_unlock(only.id, user).await.unwrap().unwrap();
        store
            .insert_with_notifications(&[outcome.unlock], &[])
            .await
            .unwrap();

        assert!(eval.check_and_unlock(only.id, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_direct_check_below_target_unlocks_nothing() {
        let store = MemoryStore::new();
        let ten = seed(&store, AchievementType::RegistrationCount, 10).await;
        let user = user_with(&store, |m| m.registration_count = 9).await;
        assert!(evaluator(&store)
            .check_and_unlock(ten.id, user)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_direct_check_unknown_achievement_is_not_found() {
        let store = MemoryStore::new();
        let err = evaluator(&store)
            .check_and_unlock(AchievementId::new(), UserId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_multi_check_skips_held_achievements() {
        let store = MemoryStore::new();
        let one = seed(&store, AchievementType::PerfectDayCount, 1).await;
        let three = seed(&store, AchievementType::PerfectDayCount, 3).await;
        let user = user_with(&store, |m| m.perfect_day_count = 3).await;
        store
            .insert_with_notifications(&[AchievementUnlock::new(one.id, user, Utc::now())], &[])
            .await
            .unwrap();

        let candidates = store
            .find_active_by_type(AchievementType::PerfectDayCount)
            .await
            .unwrap();
        let outcome = evaluator(&store)
            .check_first_achievable(&candidates, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.unlock.achievement_id, three.id);
    }
}
