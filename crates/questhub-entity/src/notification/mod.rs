//! Notification domain entities.

pub mod kind;
pub mod model;

pub use kind::NotificationType;
pub use model::Notification;
