//! Achievement unlock record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use questhub_core::types::id::{AchievementId, UnlockId, UserId};

/// Proof that a user reached an achievement. One per `(achievement, user)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AchievementUnlock {
    /// Unique record identifier.
    pub id: UnlockId,
    /// The unlocked achievement.
    pub achievement_id: AchievementId,
    /// The user who unlocked it.
    pub user_id: UserId,
    /// When the unlock was recorded.
    pub unlocked_at: DateTime<Utc>,
}

impl AchievementUnlock {
    /// Create a record for `user_id` unlocking `achievement_id` at `unlocked_at`.
    pub fn new(achievement_id: AchievementId, user_id: UserId, unlocked_at: DateTime<Utc>) -> Self {
        Self {
            id: UnlockId::new(),
            achievement_id,
            user_id,
            unlocked_at,
        }
    }
}
