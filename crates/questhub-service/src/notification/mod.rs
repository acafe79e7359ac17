//! Notifications produced by the achievement batch.

pub mod compose;

pub use compose::compose_unlock_notification;
