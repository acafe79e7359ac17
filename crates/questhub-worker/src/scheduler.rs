//! Cron scheduler for the daily perfect-day run.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use questhub_core::error::AppError;

use crate::service::AchievementBatch;

/// Cron-based trigger for the perfect-day pipeline.
pub struct PerfectDayScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for PerfectDayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerfectDayScheduler").finish()
    }
}

/// The day before `today`, which is the day a run shortly after midnight checks.
pub fn previous_day(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

impl PerfectDayScheduler {
    /// Create a new scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Register the perfect-day run on `cron`, checking the previous UTC day.
    pub async fn register(&self, batch: Arc<AchievementBatch>, cron: &str) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let batch = Arc::clone(&batch);
            Box::pin(async move {
                let date = previous_day(Utc::now().date_naive());
                tracing::debug!(date = %date, "Scheduled perfect-day run firing");
                let report = batch.run_perfect_day_check(date).await;
                if !report.is_completed() {
                    tracing::error!(
                        run_id = %report.run_id,
                        error = report.error.as_deref().unwrap_or("unknown"),
                        "Scheduled perfect-day run failed"
                    );
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create perfect_day schedule: {}", e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add perfect_day schedule: {}", e))
        })?;

        tracing::info!(cron = %cron, "Registered: perfect_day_check");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
