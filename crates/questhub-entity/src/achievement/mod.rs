//! Achievement domain entities.

pub mod kind;
pub mod model;
pub mod unlock;

pub use kind::AchievementType;
pub use model::{Achievement, meets_target};
pub use unlock::AchievementUnlock;
