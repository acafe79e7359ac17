//! Achievement metric type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The per-user counter an achievement threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "achievement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    /// Total quests registered.
    RegistrationCount,
    /// Total quests completed.
    CompletionCount,
    /// Consecutive days with at least one registration.
    ContinuousRegistrationDays,
    /// Consecutive days with at least one completion.
    ContinuousCompletionDays,
    /// Days on which every quest of the day was completed.
    PerfectDayCount,
    /// The user's level.
    UserLevel,
}

impl AchievementType {
    /// All metric types, in declaration order.
    pub const ALL: [AchievementType; 6] = [
        Self::RegistrationCount,
        Self::CompletionCount,
        Self::ContinuousRegistrationDays,
        Self::ContinuousCompletionDays,
        Self::PerfectDayCount,
        Self::UserLevel,
    ];

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistrationCount => "registration_count",
            Self::CompletionCount => "completion_count",
            Self::ContinuousRegistrationDays => "continuous_registration_days",
            Self::ContinuousCompletionDays => "continuous_completion_days",
            Self::PerfectDayCount => "perfect_day_count",
            Self::UserLevel => "user_level",
        }
    }
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AchievementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown achievement type '{s}'"))
    }
}
