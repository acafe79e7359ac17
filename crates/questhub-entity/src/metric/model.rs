//! User metric record model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use questhub_core::types::id::UserId;

use crate::achievement::AchievementType;

/// Per-user counters that achievement thresholds are measured against.
///
/// Registration and completion events update the counters as they happen;
/// the achievement batch reads them and only ever bumps the perfect-day count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserMetric {
    /// Owner of the counters.
    pub user_id: UserId,
    /// Total quests registered.
    pub registration_count: i64,
    /// Total quests completed.
    pub completion_count: i64,
    /// Current run of consecutive registration days.
    pub current_registration_streak: i64,
    /// Longest run of consecutive registration days.
    pub max_registration_streak: i64,
    /// Day of the most recent registration.
    pub last_registration_date: Option<NaiveDate>,
    /// Current run of consecutive completion days.
    pub current_completion_streak: i64,
    /// Longest run of consecutive completion days.
    pub max_completion_streak: i64,
    /// Day of the most recent completion.
    pub last_completion_date: Option<NaiveDate>,
    /// Days on which every quest of the day was completed.
    pub perfect_day_count: i64,
    /// The user's level.
    pub user_level: i64,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl UserMetric {
    /// Fresh counters for a new user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            registration_count: 0,
            completion_count: 0,
            current_registration_streak: 0,
            max_registration_streak: 0,
            last_registration_date: None,
            current_completion_streak: 0,
            max_completion_streak: 0,
            last_completion_date: None,
            perfect_day_count: 0,
            user_level: 1,
            updated_at: Utc::now(),
        }
    }

    /// The counter an achievement of `achievement_type` is compared against.
    ///
    /// Continuous-day types use the longest streak reached.
    pub fn metric_value(&self, achievement_type: AchievementType) -> i64 {
        match achievement_type {
            AchievementType::RegistrationCount => self.registration_count,
            AchievementType::CompletionCount => self.completion_count,
            AchievementType::ContinuousRegistrationDays => self.max_registration_streak,
            AchievementType::ContinuousCompletionDays => self.max_completion_streak,
            AchievementType::PerfectDayCount => self.perfect_day_count,
            AchievementType::UserLevel => self.user_level,
        }
    }

    /// Count a quest registration made on `date`.
    pub fn record_registration(&mut self, date: NaiveDate) {
        self.registration_count += 1;
        if let Some(streak) = next_streak(
            self.last_registration_date,
            self.current_registration_streak,
            date,
        ) {
            self.current_registration_streak = streak;
            self.max_registration_streak = self.max_registration_streak.max(streak);
            self.last_registration_date = Some(date);
        }
        self.updated_at = Utc::now();
    }

    /// Count a quest completion made on `date`.
    pub fn record_completion(&mut self, date: NaiveDate) {
        self.completion_count += 1;
        if let Some(streak) = next_streak(
            self.last_completion_date,
            self.current_completion_streak,
            date,
        ) {
            self.current_completion_streak = streak;
            self.max_completion_streak = self.max_completion_streak.max(streak);
            self.last_completion_date = Some(date);
        }
        self.updated_at = Utc::now();
    }

    /// Count one more perfect day.
    pub fn increment_perfect_day(&mut self) {
        self.perfect_day_count += 1;
        self.updated_at = Utc::now();
    }
}

/// Streak after an event on `date`, or `None` for an event older than `last`.
fn next_streak(last: Option<NaiveDate>, current: i64, date: NaiveDate) -> Option<i64> {
    match last {
        None => Some(1),
        Some(last) if date < last => None,
        Some(last) if date == last => Some(current.max(1)),
        Some(last) if last.succ_opt() == Some(date) => Some(current + 1),
        Some(_) => Some(1),
    }
}
