//! QuestHub achievement batch daemon.
//!
//! Wires storage, the push client, and the perfect-day scheduler together
//! and runs until it is told to stop.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use questhub_core::config::AppConfig;
use questhub_core::error::AppError;
use questhub_database::DatabasePool;
use questhub_database::migration::run_migrations;
use questhub_worker::{AchievementBatch, PerfectDayScheduler, notifier_from_config};

#[tokio::main]
async fn main() {
    let env = std::env::var("QUESTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config, &env).await {
        tracing::error!("Batch daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig, env: &str) -> Result<(), AppError> {
    tracing::info!(env = %env, "Starting QuestHub batch v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;

    let notifier = notifier_from_config(&config.push)?;
    let batch = Arc::new(AchievementBatch::from_database(
        &db,
        notifier,
        config.batch.clone(),
    ));

    let mut scheduler = if config.batch.scheduler_enabled {
        let scheduler = PerfectDayScheduler::new().await?;
        scheduler
            .register(Arc::clone(&batch), &config.batch.perfect_day_cron)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::warn!("Perfect-day scheduler disabled, waiting for shutdown only");
        None
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db.close().await;

    tracing::info!("QuestHub batch stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
