//! Single "new notifications" signal after a completed run.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use questhub_core::result::AppResult;
use questhub_core::traits::PushNotifier;
use questhub_core::types::UserId;

use crate::context::{RunContext, keys};
use crate::pipeline::{RunListener, RunReport, RunStatus};

/// Tells the push service which users have new notifications.
///
/// Only a completed run with a non-empty accumulated list triggers the call,
/// and then exactly once with the whole list. A failed call is logged and
/// not retried.
pub struct NotificationFanOut {
    notifier: Arc<dyn PushNotifier>,
}

impl std::fmt::Debug for NotificationFanOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFanOut")
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl NotificationFanOut {
    /// Fan out the users accumulated under [`keys::NOTIFIED_USER_IDS`].
    pub fn new(notifier: Arc<dyn PushNotifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl RunListener for NotificationFanOut {
    fn name(&self) -> &str {
        "notification-fan-out"
    }

    async fn after_run(&self, ctx: &RunContext, report: &mut RunReport) -> AppResult<()> {
        if report.status != RunStatus::Completed {
            debug!(run_id = %report.run_id, status = %report.status, "Run not completed, fan-out skipped");
            return Ok(());
        }

        let user_ids: Vec<UserId> = ctx.get_run(keys::NOTIFIED_USER_IDS)?.unwrap_or_default();
        if user_ids.is_empty() {
            debug!(run_id = %report.run_id, "No users to notify");
            return Ok(());
        }

        report.fanned_out = user_ids.len();
        match self.notifier.notify_new_notifications(&user_ids).await {
            Ok(()) => info!(
                run_id = %report.run_id,
                users = user_ids.len(),
                "Push service notified"
            ),
            Err(e) => error!(
                run_id = %report.run_id,
                users = user_ids.len(),
                error = %e,
                "Push notification dispatch failed"
            ),
        }
        Ok(())
    }
}
