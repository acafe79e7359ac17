//! User metric repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use questhub_core::error::{AppError, ErrorKind};
use questhub_core::result::AppResult;
use questhub_core::types::{PageRequest, UserId};
use questhub_entity::achievement::AchievementType;
use questhub_entity::metric::UserMetric;

use super::write_error;
use crate::store::UserMetricStore;

/// Repository for per-user metric counters and the quest days behind them.
#[derive(Debug, Clone)]
pub struct UserMetricRepository {
    pool: PgPool,
}

impl UserMetricRepository {
    /// Create a new user metric repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Column holding the counter for `achievement_type`.
fn metric_column(achievement_type: AchievementType) -> &'static str {
    match achievement_type {
        AchievementType::RegistrationCount => "registration_count",
        AchievementType::CompletionCount => "completion_count",
        AchievementType::ContinuousRegistrationDays => "max_registration_streak",
        AchievementType::ContinuousCompletionDays => "max_completion_streak",
        AchievementType::PerfectDayCount => "perfect_day_count",
        AchievementType::UserLevel => "user_level",
    }
}

#[async_trait]
impl UserMetricStore for UserMetricRepository {
    async fn find_by_user(&self, user_id: UserId) -> AppResult<Option<UserMetric>> {
        sqlx::query_as::<_, UserMetric>("SELECT * FROM user_metrics WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user metric", e))
    }

    async fn find_users_with_metric_at_least(
        &self,
        achievement_type: AchievementType,
        threshold: i64,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        let sql = format!(
            "SELECT user_id FROM user_metrics WHERE {} >= $1 ORDER BY user_id LIMIT $2 OFFSET $3",
            metric_column(achievement_type)
        );
        sqlx::query_scalar::<_, UserId>(&sql)
            .bind(threshold)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to page users by metric", e)
            })
    }

    async fn find_perfect_day_users(
        &self,
        date: NaiveDate,
        page: &PageRequest,
    ) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM quests WHERE quest_date = $1 \
             GROUP BY user_id HAVING bool_and(completed) \
             ORDER BY user_id LIMIT $2 OFFSET $3",
        )
        .bind(date)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to page perfect-day users", e)
        })
    }

    async fn increment_perfect_days(&self, user_ids: &[UserId]) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        for user_id in user_ids {
            sqlx::query(
                "INSERT INTO user_metrics (user_id, perfect_day_count, updated_at) \
                 VALUES ($1, 1, NOW()) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                  perfect_day_count = user_metrics.perfect_day_count + 1, \
                  updated_at = NOW()",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error("Failed to increment perfect days", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| write_error("Failed to commit perfect-day increments", e))
    }
}
