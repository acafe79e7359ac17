//! Bounded retry policy for the transform and persist phases.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use questhub_core::config::BatchConfig;
use questhub_core::error::{AppError, ErrorKind};

/// How many times an operation is attempted and which failures qualify.
///
/// `max_attempts` counts every attempt including the first. Errors whose
/// kind is in `permanent` fail on the first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
    permanent: Vec<ErrorKind>,
}

/// The last error of an operation that ran out of attempts.
#[derive(Debug, Clone)]
pub struct Exhausted {
    /// Last error seen.
    pub error: AppError,
    /// Attempts made.
    pub attempts: u32,
}

impl RetryPolicy {
    /// Retry up to `max_attempts` in total. Uniqueness conflicts and
    /// validation failures are permanent.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::ZERO,
            permanent: vec![ErrorKind::Conflict, ErrorKind::Validation],
        }
    }

    /// Policy from `batch.max_attempts` and `batch.retry_backoff_ms`.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.max_attempts).with_backoff(Duration::from_millis(config.retry_backoff_ms))
    }

    /// Wait `backoff` between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether `err` may be attempted again.
    pub fn is_retryable(&self, err: &AppError) -> bool {
        !self.permanent.contains(&err.kind)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// budget is used up. Returns the value and the attempts it took.
    pub async fn run<T, F, Fut>(&self, phase: &str, mut op: F) -> Result<(T, u32), Exhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok((value, attempt)),
                Err(error) if attempt < self.max_attempts && self.is_retryable(&error) => {
                    warn!(
                        phase,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(error) => {
                    return Err(Exhausted {
                        error,
                        attempts: attempt,
                    });
                }
            }
        }
    }
}
