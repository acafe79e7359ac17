//! Pipeline error taxonomy.

use questhub_core::error::AppError;

/// Why a stage or run stopped.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    /// The paged source failed. Never retried.
    #[error("Read failed in stage '{stage}': {source}")]
    Read {
        /// Stage that was reading.
        stage: String,
        /// Underlying cause.
        source: AppError,
    },

    /// An item kept failing to transform.
    #[error("Transform failed in stage '{stage}' after {attempts} attempt(s): {source}")]
    Transform {
        /// Stage that was transforming.
        stage: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Last error seen.
        source: AppError,
    },

    /// A chunk kept failing to persist.
    #[error("Persist failed in stage '{stage}' after {attempts} attempt(s): {source}")]
    Persist {
        /// Stage that was persisting.
        stage: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Last error seen.
        source: AppError,
    },

    /// Storage rejected an unlock the user already holds, which means two
    /// runs raced on the same user.
    #[error("Duplicate unlock in stage '{stage}': {source}")]
    DuplicateUnlock {
        /// Stage that was persisting.
        stage: String,
        /// The storage conflict.
        source: AppError,
    },

    /// A lifecycle hook failed.
    #[error("Hook '{hook}' failed for '{scope}': {source}")]
    Hook {
        /// Hook name, such as `before_stage`.
        hook: &'static str,
        /// Stage or listener the hook belongs to.
        scope: String,
        /// Underlying cause.
        source: AppError,
    },

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl BatchError {
    /// Wrap a hook failure.
    pub fn hook(hook: &'static str, scope: impl Into<String>, source: AppError) -> Self {
        Self::Hook {
            hook,
            scope: scope.into(),
            source,
        }
    }

    /// Short label for reports and log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read { .. } => "read",
            Self::Transform { .. } => "transform",
            Self::Persist { .. } => "persist",
            Self::DuplicateUnlock { .. } => "duplicate_unlock",
            Self::Hook { .. } => "hook",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result alias for pipeline operations.
pub type BatchResult<T> = Result<T, BatchError>;
