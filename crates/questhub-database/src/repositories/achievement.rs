//! Achievement repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use questhub_core::error::{AppError, ErrorKind};
use questhub_core::result::AppResult;
use questhub_core::types::{AchievementId, UserId};
use questhub_entity::achievement::{Achievement, AchievementType};

use super::write_error;
use crate::store::AchievementStore;

/// Repository for achievement definitions.
#[derive(Debug, Clone)]
pub struct AchievementRepository {
    pool: PgPool,
}

impl AchievementRepository {
    /// Create a new achievement repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementStore for AchievementRepository {
    async fn find_by_id(&self, id: AchievementId) -> AppResult<Option<Achievement>> {
        sqlx::query_as::<_, Achievement>("SELECT * FROM achievements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find achievement", e)
            })
    }

    async fn find_active_by_type(
        &self,
        achievement_type: AchievementType,
    ) -> AppResult<Vec<Achievement>> {
        sqlx::query_as::<_, Achievement>(
            "SELECT * FROM achievements WHERE achievement_type = $1 AND active \
             ORDER BY created_at, id",
        )
        .bind(achievement_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active achievements", e)
        })
    }

    async fn find_next_locked(
        &self,
        achievement_type: AchievementType,
        user_id: UserId,
    ) -> AppResult<Option<Achievement>> {
        sqlx::query_as::<_, Achievement>(
            "SELECT a.* FROM achievements a \
             WHERE a.achievement_type = $1 AND a.active \
             AND NOT EXISTS (SELECT 1 FROM achievement_unlocks u \
                             WHERE u.achievement_id = a.id AND u.user_id = $2) \
             ORDER BY a.target_value ASC LIMIT 1",
        )
        .bind(achievement_type)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find next locked achievement", e)
        })
    }

    async fn create(&self, achievement: &Achievement) -> AppResult<Achievement> {
        sqlx::query_as::<_, Achievement>(
            "INSERT INTO achievements \
             (id, title, description, achievement_type, target_value, active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(achievement.id)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(achievement.achievement_type)
        .bind(achievement.target_value)
        .bind(achievement.active)
        .bind(achievement.created_at)
        .bind(achievement.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to create achievement", e))
    }

    async fn update(&self, achievement: &Achievement) -> AppResult<Achievement> {
        sqlx::query_as::<_, Achievement>(
            "UPDATE achievements SET title = $2, description = $3, target_value = $4, \
             active = $5, updated_at = $6 WHERE id = $1 RETURNING *",
        )
        .bind(achievement.id)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(achievement.target_value)
        .bind(achievement.active)
        .bind(achievement.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("Failed to update achievement", e))?
        .ok_or_else(|| AppError::not_found(format!("Achievement {} not found", achievement.id)))
    }
}
