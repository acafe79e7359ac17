//! Schema migrations embedded from the workspace `migrations/` directory.

use sqlx::PgPool;
use tracing::info;

use questhub_core::error::{AppError, ErrorKind};
use questhub_core::result::AppResult;

/// Apply every pending migration.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database schema is up to date");
    Ok(())
}
