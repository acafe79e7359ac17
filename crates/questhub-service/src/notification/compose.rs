//! Notification text for achievement unlocks.

use chrono::{DateTime, Utc};
use serde_json::json;

use questhub_core::types::UserId;
use questhub_entity::achievement::Achievement;
use questhub_entity::notification::{Notification, NotificationType};

/// Title shared by every unlock notification.
pub const UNLOCK_TITLE: &str = "Achievement unlocked";

/// Build the notification telling `user_id` they unlocked `achievement`.
pub fn compose_unlock_notification(
    achievement: &Achievement,
    user_id: UserId,
    created_at: DateTime<Utc>,
) -> Notification {
    Notification::new(
        user_id,
        NotificationType::Achievement,
        UNLOCK_TITLE,
        format!("You unlocked the achievement '{}'.", achievement.title),
        json!({
            "achievementId": achievement.id,
            "achievementType": achievement.achievement_type,
            "targetValue": achievement.target_value,
        }),
        created_at,
    )
}
