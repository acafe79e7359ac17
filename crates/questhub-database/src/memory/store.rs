//! In-memory store implementing every storage trait.
//!
//! Semantics match the PostgreSQL repositories: achievements iterate in
//! insertion order, pages are ordered by user id, and bulk writes either
//! apply fully or not at all.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::types::{AchievementId, PageRequest, UserId};
use questhub_entity::achievement::{Achievement, AchievementType, AchievementUnlock};
use questhub_entity::metric::UserMetric;
use questhub_entity::notification::Notification;

use crate::store::{AchievementStore, UnlockStore, UserMetricStore};

#[derive(Debug, Default)]
struct MemoryState {
    achievements: Vec<Achievement>,
    unlocks: Vec<AchievementUnlock>,
    metrics: BTreeMap<UserId, UserMetric>,
    notifications: Vec<Notification>,
    /// `(user, day)` -> `(quests, completed quests)`.
    quest_days: BTreeMap<(UserId, NaiveDate), (u32, u32)>,
}

impl MemoryState {
    fn is_unlocked(&self, achievement_id: AchievementId, user_id: UserId) -> bool {
        self.unlocks
            .iter()
            .any(|u| u.achievement_id == achievement_id && u.user_id == user_id)
    }
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace the counters of one user.
    pub async fn insert_metric(&self, metric: UserMetric) {
        self.state.write().await.metrics.insert(metric.user_id, metric);
    }

    /// Record one quest of `user_id` on `date`.
    pub async fn record_quest(&self, user_id: UserId, date: NaiveDate, completed: bool) {
        let mut state = self.state.write().await;
        let entry = state.quest_days.entry((user_id, date)).or_insert((0, 0));
        entry.0 += 1;
        if completed {
            entry.1 += 1;
        }
    }

    /// Every unlock record, in insertion order.
    pub async fn unlocks(&self) -> Vec<AchievementUnlock> {
        self.state.read().await.unlocks.clone()
    }

    /// Every notification, in insertion order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }
}

#[async_trait]
impl AchievementStore for MemoryStore {
    async fn find_by_id(&self, id: AchievementId) -> AppResult<Option<Achievement>> {
        let state = self.state.read().await;
        Ok(state.achievements.iter().find(|a| a.id == id).cloned())
    }

    async fn find_active_by_type(
        &self,
        achievement_type: AchievementType,
    ) -> AppResult<Vec<Achievement>> {
        let state = self.state.read().await;
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.active && a.achievement_type == achievement_type)
            .cloned()
            .collect())
    }

    async fn find_next_locked(
        &self,
        achievement_type: AchievementType,
        user_id: UserId,
    ) -> AppResult<Option<Achievement>> {
        let state = self.state.read().await;
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.active && a.achievement_type == achievement_type)
            .filter(|a| !state.is_unlocked(a.id, user_id))
            .min_by_key(|a| a.target_value)
            .cloned())
    }

    async fn create(&self, achievement: &Achievement) -> AppResult<Achievement> {
        let mut state = self.state.write().await;
        let taken = state.achievements.iter().any(|a| {
            a.achievement_type == achievement.achievement_type
                && a.target_value == achievement.target_value
        });
        if taken {
            return Err(AppError::conflict(format!(
                "Achievement {} with target {} already exists",
                achievement.achievement_type, achievement.target_value
            )));
        }
        state.achievements.push(achievement.clone());
        Ok(achievement.clone())
    }

    async fn update(&self, achievement: &Achievement) -> AppResult<Achievement> {
        let mut state = self.state.write().await;
        let taken = state.achievements.iter().any(|a| {
            a.id != achievement.id
                && a.achievement_type == achievement.achievement_type
                && a.target_value == achievement.target_value
        });
        if taken {
            return Err(AppError::conflict(format!(
                "Achievement {} with target {} already exists",
                achievement.achievement_type, achievement.target_value
            )));
        }
        let slot = state
            .achievements
            .iter_mut()
            .find(|a| a.id == achievement.id)
            .ok_or_else(|| AppError::not_found(format!("Achievement {} not found", achievement.id)))?;
        *slot = achievement.clone();
        Ok(achievement.clone())
    }
}

#[async_trait]
impl UnlockStore for MemoryStore {
    async fn unlocked_ids_for_user(&self, user_id: UserId) -> AppResult<HashSet<AchievementId>> {
        let state = self.state.read().await;
        Ok(state
            .unlocks
            .iter()
            .filter(|u| u.user_id == user_id)
            .map(|u| u.achievement_id)
            .collect())
    }

    async fn insert_with_notifications(
        &self,
        unlocks: &[AchievementUnlock],
        notifications: &[Notification],
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut batch = HashSet::new();
        for unlock in unlocks {
            let pair = (unlock.achievement_id, unlock.user_id);
            if state.is_unlocked(pair.0, pair.1) || !batch.insert(pair) {
                return Err(AppError::conflict(format!(
                    "User {} already unlocked achievement {}",
                    unlock.user_id, unlock.achievement_id
                )));
            }
        }
        state.unlocks.extend_from_slice(unlocks);
        state.notifications.extend_from_slice(notifications);
        Ok(())
    }

    async fn unlocks_for_user(&self, user_id: UserId) -> AppResult<Vec<AchievementUnlock>> {
        let state = self.state.read().await;
        Ok(state
            .unlocks
            .iter()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserMetricStore for MemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<UserMetric>> {
        Ok(self.state.read().await.metrics.get(&user_id).cloned())
    }

    async fn find_users_with_metric_at_least(
        &self,
        achievement_type: AchievementType,
        threshold: i64,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        let state = self.state.read().await;
        let matching: Vec<UserId> = state
            .metrics
            .values()
            .filter(|m| m.metric_value(achievement_type) >= threshold)
            .map(|m| m.user_id)
            .collect();
        Ok(page.slice(&matching).to_vec())
    }

    async fn find_perfect_day_users(
        &self,
        date: NaiveDate,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        let state = self.state.read().await;
        let matching: Vec<UserId> = state
            .quest_days
            .iter()
            .filter(|((_, day), (total, completed))| *day == date && *total > 0 && total == completed)
            .map(|((user_id, _), _)| *user_id)
            .collect();
        Ok(page.slice(&matching).to_vec())
    }

    async fn increment_perfect_days(&self, user_ids: &[UserId]) -> AppResult<()> {
        let mut state = self.state.write().await;
        for user_id in user_ids {
            state
                .metrics
                .entry(*user_id)
                .or_insert_with(|| UserMetric::new(*user_id))
                .increment_perfect_day();
        }
        Ok(())
    }
}
