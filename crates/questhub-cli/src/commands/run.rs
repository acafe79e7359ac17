//! One-off pipeline triggers.

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use questhub_core::error::AppError;
use questhub_core::types::AchievementId;
use questhub_worker::{AchievementBatch, notifier_from_config, previous_day};

/// Arguments for the run command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Pipeline to run
    #[command(subcommand)]
    pub command: RunCommand,
}

/// Pipelines that can be triggered by hand
#[derive(Debug, Subcommand)]
pub enum RunCommand {
    /// Unlock an achievement for every user already past its target
    Direct {
        /// Achievement id
        #[arg(short, long)]
        achievement: AchievementId,
    },
    /// Count perfect days and unlock what they earn
    PerfectDay {
        /// Day to check (YYYY-MM-DD), defaults to yesterday in UTC
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

/// Execute run commands
pub async fn execute(args: &RunArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let db = super::connect(&config).await?;
    let notifier = notifier_from_config(&config.push)?;
    let batch = AchievementBatch::from_database(&db, notifier, config.batch.clone());

    let report = match &args.command {
        RunCommand::Direct { achievement } => batch.run_direct_check(*achievement).await,
        RunCommand::PerfectDay { date } => {
            let date = date.unwrap_or_else(|| previous_day(Utc::now().date_naive()));
            batch.run_perfect_day_check(date).await
        }
    };
    db.close().await;

    output::print_report(&report, format);
    if !report.is_completed() {
        return Err(AppError::internal(format!(
            "Run {} did not complete",
            report.run_id
        )));
    }
    Ok(())
}
