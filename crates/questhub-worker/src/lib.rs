//! Achievement batch pipelines for QuestHub.
//!
//! This crate provides:
//! - A paged source and chunk reader over any backing query
//! - A two-level run / stage context
//! - A stage executor with bounded retries per phase
//! - The direct-check and perfect-day pipelines with their stages
//! - The notification fan-out, the HTTP push client, and the cron scheduler

pub mod context;
pub mod error;
pub mod executor;
pub mod fanout;
pub mod listeners;
pub mod paged;
pub mod pipeline;
pub mod push;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod stage;
pub mod stages;

pub use context::RunContext;
pub use error::{BatchError, BatchResult};
pub use executor::{StageExecutor, StageReport, StageStatus};
pub use fanout::NotificationFanOut;
pub use listeners::{PinPerfectDayAchievements, PinTargetAchievement};
pub use paged::{ChunkReader, PagedSource};
pub use pipeline::{Pipeline, RunListener, RunReport, RunStatus};
pub use push::{DisabledPushNotifier, HttpPushNotifier, notifier_from_config};
pub use retry::RetryPolicy;
pub use scheduler::{PerfectDayScheduler, previous_day};
pub use service::{AchievementBatch, DIRECT_CHECK_PIPELINE, PERFECT_DAY_PIPELINE};
pub use stage::Stage;
