//! PostgreSQL implementations of the storage traits.

pub mod achievement;
pub mod metric;
mod notification;
pub mod unlock;

pub use achievement::AchievementRepository;
pub use metric::UserMetricRepository;
pub use unlock::UnlockRepository;

use questhub_core::error::{AppError, ErrorKind};

/// Map a sqlx error from a write, reporting unique violations as conflicts.
pub(crate) fn write_error(context: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => ErrorKind::Conflict,
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}
