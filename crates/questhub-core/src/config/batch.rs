//! Batch pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Chunking, retry, and scheduling settings for achievement pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of items processed per chunk (one commit point).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Page size requested from paged storage queries.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Total attempts per item (transform) or per chunk (persist).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between retry attempts in milliseconds.
    #[serde(default)]
    pub retry_backoff_ms: u64,
    /// Whether the periodic perfect-day run is scheduled.
    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,
    /// Cron expression (with seconds) for the perfect-day run.
    #[serde(default = "default_perfect_day_cron")]
    pub perfect_day_cron: String,
}

impl BatchConfig {
    /// Check that sizes and attempt budgets are usable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.chunk_size == 0 {
            return Err(AppError::configuration("batch.chunk_size must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(AppError::configuration("batch.page_size must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(AppError::configuration("batch.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            page_size: default_page_size(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: 0,
            scheduler_enabled: true,
            perfect_day_cron: default_perfect_day_cron(),
        }
    }
}

fn default_chunk_size() -> usize {
    10
}

fn default_page_size() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_perfect_day_cron() -> String {
    "0 5 0 * * *".to_string()
}
