//! Shared test helpers for pipeline integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use questhub_core::config::BatchConfig;
use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::traits::PushNotifier;
use questhub_core::types::{AchievementId, PageRequest, UserId};
use questhub_database::MemoryStore;
use questhub_database::store::{AchievementStore, UnlockStore, UserMetricStore};
use questhub_entity::achievement::{Achievement, AchievementType, AchievementUnlock};
use questhub_entity::metric::UserMetric;
use questhub_entity::notification::Notification;
use questhub_worker::AchievementBatch;

/// Consume one injected failure from `budget`, if any is left.
fn take(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// A [`MemoryStore`] that fails on demand.
#[derive(Debug, Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    /// Every paged user query fails.
    pub fail_reads: AtomicBool,
    /// Metric lookups made while transforming fail this many times.
    pub lookup_failures: AtomicU32,
    /// Chunk writes fail this many times.
    pub write_failures: AtomicU32,
    /// Once set, every write after `healthy_writes` more succeed fails.
    pub break_writes: AtomicBool,
    pub healthy_writes: AtomicU32,
    /// Another writer stores the same unlocks just before ours.
    pub race_unlocks: AtomicBool,
    /// An upstream completion lands on each user just before the increment.
    pub race_completions: AtomicBool,
}

impl FaultyStore {
    fn write_fails(&self) -> bool {
        if take(&self.write_failures) {
            return true;
        }
        self.break_writes.load(Ordering::SeqCst) && !take(&self.healthy_writes)
    }
}

#[async_trait]
impl AchievementStore for FaultyStore {
    async fn find_by_id(&self, id: AchievementId) -> AppResult<Option<Achievement>> {
        self.inner.find_by_id(id).await
    }

    async fn find_active_by_type(
        &self,
        achievement_type: AchievementType,
    ) -> AppResult<Vec<Achievement>> {
        self.inner.find_active_by_type(achievement_type).await
    }

    async fn find_next_locked(
        &self,
        achievement_type: AchievementType,
        user_id: UserId,
    ) -> AppResult<Option<Achievement>> {
        self.inner.find_next_locked(achievement_type, user_id).await
    }

    async fn create(&self, achievement: &Achievement) -> AppResult<Achievement> {
        self.inner.create(achievement).await
    }

    async fn update(&self, achievement: &Achievement) -> AppResult<Achievement> {
        AchievementStore::update(&self.inner, achievement).await
    }
}

#[async_trait]
impl UnlockStore for FaultyStore {
    async fn unlocked_ids_for_user(&self, user_id: UserId) -> AppResult<HashSet<AchievementId>> {
        self.inner.unlocked_ids_for_user(user_id).await
    }

    async fn insert_with_notifications(
        &self,
        unlocks: &[AchievementUnlock],
        notifications: &[Notification],
    ) -> AppResult<()> {
        if self.write_fails() {
            return Err(AppError::database("injected write failure"));
        }
        if self.race_unlocks.load(Ordering::SeqCst) {
            self.inner.insert_with_notifications(unlocks, &[]).await?;
        }
        self.inner
            .insert_with_notifications(unlocks, notifications)
            .await
    }

    async fn unlocks_for_user(&self, user_id: UserId) -> AppResult<Vec<AchievementUnlock>> {
        self.inner.unlocks_for_user(user_id).await
    }
}

#[async_trait]
impl UserMetricStore for FaultyStore {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<UserMetric>> {
        if take(&self.lookup_failures) {
            return Err(AppError::database("injected lookup failure"));
        }
        self.inner.find_by_user(user_id).await
    }

    async fn find_users_with_metric_at_least(
        &self,
        achievement_type: AchievementType,
        threshold: i64,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::database("injected read failure"));
        }
        self.inner
            .find_users_with_metric_at_least(achievement_type, threshold, page)
            .await
    }

    async fn find_perfect_day_users(
        &self,
        date: NaiveDate,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::database("injected read failure"));
        }
        self.inner.find_perfect_day_users(date, page).await
    }

    async fn increment_perfect_days(&self, user_ids: &[UserId]) -> AppResult<()> {
        if self.write_fails() {
            return Err(AppError::database("injected write failure"));
        }
        if self.race_completions.load(Ordering::SeqCst) {
            for user_id in user_ids {
                if let Some(mut metric) = self.inner.find_by_user(*user_id).await? {
                    metric.completion_count += 1;
                    self.inner.insert_metric(metric).await;
                }
            }
        }
        self.inner.increment_perfect_days(user_ids).await
    }
}

/// Push client that remembers every call.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<Vec<UserId>>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    /// User lists of every call made so far.
    pub fn calls(&self) -> Vec<Vec<UserId>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushNotifier for RecordingNotifier {
    async fn notify_new_notifications(&self, user_ids: &[UserId]) -> AppResult<()> {
        self.calls.lock().unwrap().push(user_ids.to_vec());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_service("push service down"));
        }
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    pub store: Arc<FaultyStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub batch: AchievementBatch,
}

impl TestApp {
    /// Small chunks and pages so every run crosses several boundaries.
    pub fn new() -> Self {
        Self::with_config(BatchConfig {
            chunk_size: 2,
            page_size: 3,
            max_attempts: 3,
            ..BatchConfig::default()
        })
    }

    pub fn with_config(config: BatchConfig) -> Self {
        let store = Arc::new(FaultyStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let batch = AchievementBatch::with_store(
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn PushNotifier>,
            config,
        );
        Self {
            store,
            notifier,
            batch,
        }
    }

    pub async fn create_achievement(&self, kind: AchievementType, target: i64) -> Achievement {
        let achievement = Achievement::new(format!("{kind} {target}"), "", kind, target).unwrap();
        self.store.inner.create(&achievement).await.unwrap()
    }

    /// Seed a user whose counter for `kind` is `value`.
    pub async fn seed_user(&self, kind: AchievementType, value: i64) -> UserId {
        let user_id = UserId::new();
        let mut metric = UserMetric::new(user_id);
        match kind {
            AchievementType::RegistrationCount => metric.registration_count = value,
            AchievementType::CompletionCount => metric.completion_count = value,
            AchievementType::ContinuousRegistrationDays => metric.max_registration_streak = value,
            AchievementType::ContinuousCompletionDays => metric.max_completion_streak = value,
            AchievementType::PerfectDayCount => metric.perfect_day_count = value,
            AchievementType::UserLevel => metric.user_level = value,
        }
        metric.updated_at = Utc::now();
        self.store.inner.insert_metric(metric).await;
        user_id
    }

    pub async fn metric(&self, user_id: UserId) -> UserMetric {
        self.store.inner.find_by_user(user_id).await.unwrap().unwrap()
    }

    pub async fn unlocked(&self, user_id: UserId) -> Vec<AchievementId> {
        self.store
            .inner
            .unlocks_for_user(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.achievement_id)
            .collect()
    }
}

pub fn sorted(mut ids: Vec<UserId>) -> Vec<UserId> {
    ids.sort();
    ids
}
