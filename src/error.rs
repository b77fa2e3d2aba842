//! Error types for streak operations.
//!
//! [`StreakError`] is what the repository and transfer codec return. Storage
//! failures are carried unmodified inside [`StreakError::StorageUnavailable`];
//! nothing is retried.

use thiserror::Error;

use crate::data::StoreError;

/// Errors surfaced to the caller of a streak operation.
#[derive(Debug, Error)]
pub enum StreakError {
    /// Malformed PIN, habit name, date or status. Rejected before storage is
    /// touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A PIN check failed.
    #[error("PIN does not match")]
    InvalidCredential,

    /// A habit with this name already exists.
    #[error("habit '{0}' already exists")]
    DuplicateHabit(String),

    /// The operation needs an existing habit.
    #[error("habit '{0}' not found")]
    NotFound(String),

    /// The store failed; the operation was aborted and may be retried.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    /// The exchange file could not be read or written.
    #[error("transfer file error: {0}")]
    Transfer(#[from] csv::Error),
}

impl StreakError {
    pub fn invalid(message: impl Into<String>) -> Self {
        StreakError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StreakError>;
