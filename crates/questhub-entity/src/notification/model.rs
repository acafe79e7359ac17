//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use questhub_core::types::id::{NotificationId, UserId};

use super::kind::NotificationType;

/// A notification waiting for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Type tag.
    pub notification_type: NotificationType,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub content: String,
    /// Opaque structured data for the client (JSON).
    pub metadata: serde_json::Value,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the user confirmed (read) the notification.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the user deleted the notification.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Create an unconfirmed notification.
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        title: impl Into<String>,
        content: impl Into<String>,
        metadata: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            notification_type,
            title: title.into(),
            content: content.into(),
            metadata,
            created_at,
            confirmed_at: None,
            deleted_at: None,
        }
    }

    /// Check if the notification has been confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    /// Check if the notification has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Mark as confirmed. The first confirmation time is kept.
    pub fn confirm(&mut self, at: DateTime<Utc>) {
        self.confirmed_at.get_or_insert(at);
    }

    /// Soft-delete. The first deletion time is kept.
    pub fn delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at.get_or_insert(at);
    }
}
