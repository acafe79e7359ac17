//! Concrete stages of the achievement pipelines.

pub mod achievement_check;
pub mod perfect_day;

pub use achievement_check::AchievementCheckStage;
pub use perfect_day::{PerfectDayDiscoveryStage, PerfectDayIncrementStage, PerfectDayUnlockStage};

use questhub_core::types::UserId;
use questhub_service::UnlockOutcome;

/// Users whose outcome carried a notification.
pub(crate) fn notified_users(outcomes: &[UnlockOutcome]) -> Vec<UserId> {
    outcomes.iter().map(|o| o.notification.user_id).collect()
}
