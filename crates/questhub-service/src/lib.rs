//! # questhub-service
//!
//! Decision logic of the achievement batch. The evaluator decides which
//! achievement, if any, a user unlocks; the notification module turns an
//! unlock into the record the user is shown.
//!
//! Services receive their stores at construction time as `Arc<dyn ...>`
//! so the same logic runs on PostgreSQL and on the in-memory store.

pub mod achievement;
pub mod notification;

pub use achievement::{AchievementEvaluator, UnlockOutcome, first_achievable};
pub use notification::compose_unlock_notification;
