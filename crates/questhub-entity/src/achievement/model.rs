//! Achievement entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use questhub_core::error::AppError;
use questhub_core::result::AppResult;
use questhub_core::types::id::AchievementId;

use super::kind::AchievementType;

/// Threshold rule shared by every achievement: reaching the target counts.
pub fn meets_target(target_value: i64, value: i64) -> bool {
    value >= target_value
}

/// A named milestone with a metric type and a numeric threshold.
///
/// `(achievement_type, target_value)` is unique among achievements. Rows are
/// never deleted; they are switched off with [`Achievement::inactivate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Achievement {
    /// Unique achievement identifier.
    pub id: AchievementId,
    /// Display title.
    pub title: String,
    /// Display description.
    pub description: String,
    /// Metric the threshold applies to.
    pub achievement_type: AchievementType,
    /// Positive threshold on the metric.
    pub target_value: i64,
    /// Whether the achievement can currently be unlocked.
    pub active: bool,
    /// When the achievement was created.
    pub created_at: DateTime<Utc>,
    /// When the achievement was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Achievement {
    /// Create a new active achievement.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        achievement_type: AchievementType,
        target_value: i64,
    ) -> AppResult<Self> {
        validate_target(target_value)?;
        let now = Utc::now();
        Ok(Self {
            id: AchievementId::new(),
            title: title.into(),
            description: description.into(),
            achievement_type,
            target_value,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Placeholder used when no locked achievement of a type remains.
    ///
    /// It carries a nil id and is never achievable.
    pub fn empty(achievement_type: AchievementType) -> Self {
        let now = Utc::now();
        Self {
            id: AchievementId::nil(),
            title: String::new(),
            description: String::new(),
            achievement_type,
            target_value: i64::MAX,
            active: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is the [`Achievement::empty`] placeholder.
    pub fn is_empty(&self) -> bool {
        self.id.is_nil()
    }

    /// Whether `value` satisfies this achievement's threshold.
    pub fn can_achieve(&self, value: i64) -> bool {
        !self.is_empty() && meets_target(self.target_value, value)
    }

    /// Make the achievement unlockable again.
    pub fn activate(&mut self) {
        self.active = true;
        self.updated_at = Utc::now();
    }

    /// Stop the achievement from being unlocked.
    pub fn inactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Replace the editable fields.
    pub fn update(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        target_value: i64,
    ) -> AppResult<()> {
        validate_target(target_value)?;
        self.title = title.into();
        self.description = description.into();
        self.target_value = target_value;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_target(target_value: i64) -> AppResult<()> {
    if target_value < 1 {
        return Err(AppError::validation(format!(
            "achievement target must be a positive integer, got {target_value}"
        )));
    }
    Ok(())
}
