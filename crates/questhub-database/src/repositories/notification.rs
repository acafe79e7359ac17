//! Notification row writes, used inside the unlock transaction.

use sqlx::{Postgres, Transaction};

use questhub_core::result::AppResult;
use questhub_entity::notification::Notification;

use super::write_error;

/// Insert one notification inside an open transaction.
pub(crate) async fn insert_one(
    tx: &mut Transaction<'_, Postgres>,
    notification: &Notification,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO notifications \
         (id, user_id, notification_type, title, content, metadata, created_at, confirmed_at, deleted_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(notification.id)
    .bind(notification.user_id)
    .bind(notification.notification_type)
    .bind(&notification.title)
    .bind(&notification.content)
    .bind(&notification.metadata)
    .bind(notification.created_at)
    .bind(notification.confirmed_at)
    .bind(notification.deleted_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| write_error("Failed to insert notification", e))?;
    Ok(())
}
