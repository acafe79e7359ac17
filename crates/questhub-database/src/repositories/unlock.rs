//! Achievement unlock repository implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use questhub_core::error::{AppError, ErrorKind};
use questhub_core::result::AppResult;
use questhub_core::types::{AchievementId, UserId};
use questhub_entity::achievement::AchievementUnlock;
use questhub_entity::notification::Notification;

use super::write_error;
use crate::store::UnlockStore;

/// Repository for achievement unlock records.
#[derive(Debug, Clone)]
pub struct UnlockRepository {
    pool: PgPool,
}

impl UnlockRepository {
    /// Create a new unlock repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnlockStore for UnlockRepository {
    async fn unlocked_ids_for_user(&self, user_id: UserId) -> AppResult<HashSet<AchievementId>> {
        let ids = sqlx::query_scalar::<_, AchievementId>(
            "SELECT achievement_id FROM achievement_unlocks WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list unlocked ids", e))?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_with_notifications(
        &self,
        unlocks: &[AchievementUnlock],
        notifications: &[Notification],
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to open transaction", e))?;

        for unlock in unlocks {
            sqlx::query(
                "INSERT INTO achievement_unlocks (id, achievement_id, user_id, unlocked_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(unlock.id)
            .bind(unlock.achievement_id)
            .bind(unlock.user_id)
            .bind(unlock.unlocked_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error("Failed to insert unlock", e))?;
        }

        for notification in notifications {
            super::notification::insert_one(&mut tx, notification).await?;
        }

        tx.commit()
            .await
            .map_err(|e| write_error("Failed to commit unlocks", e))?;

        debug!(
            unlocks = unlocks.len(),
            notifications = notifications.len(),
            "Unlock batch written"
        );
        Ok(())
    }

    async fn unlocks_for_user(&self, user_id: UserId) -> AppResult<Vec<AchievementUnlock>> {
        sqlx::query_as::<_, AchievementUnlock>(
            "SELECT * FROM achievement_unlocks WHERE user_id = $1 ORDER BY unlocked_at, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list unlocks", e))
    }
}
