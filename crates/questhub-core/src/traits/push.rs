//! Outbound trigger for the external real-time push service.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// Signals the push service that users have new notifications waiting.
///
/// The pipeline calls this at most once per completed run, with every
/// notified user in a single call. Delivery is the push service's concern.
#[async_trait]
pub trait PushNotifier: Send + Sync + std::fmt::Debug + 'static {
    /// Send one "new notifications" signal carrying all user ids.
    async fn notify_new_notifications(&self, user_ids: &[UserId]) -> AppResult<()>;
}
