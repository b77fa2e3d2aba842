//! The [`Store`] trait defining the persistence contract for the tracker.
//!
//! Two record kinds are stored: the singleton PIN record and the collection of
//! named streak records. Both backends ([`SqliteStore`](super::SqliteStore) and
//! [`MemoryStore`](super::MemoryStore)) implement this trait with identical
//! semantics, so the repository can run against either.
//!
//! The trait is synchronous. A local SQLite file answers in microseconds and
//! there is a single writer per process; `&mut self` on every write already
//! serializes mutations within the process, and [`Store::update_streaks`]
//! runs inside a storage transaction so separate processes cannot interleave a
//! read-modify-write either.

use thiserror::Error;

use super::models::{CredentialRecord, StreakRecord};

/// Errors produced by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite call failed.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema setup could not be applied.
    #[error("schema migration failed: {0}")]
    Migration(String),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An insert collided with an existing primary key.
    #[error("record already exists: {0}")]
    Conflict(String),

    /// The backend refused the operation (closed, read-only, etc.).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The storage contract for credential and streak records.
pub trait Store {
    // -------------------------------------------------------------------
    // Credential collection ("pin")
    // -------------------------------------------------------------------

    /// Fetch the singleton credential record, if one has been set.
    fn get_pin(&self) -> Result<Option<CredentialRecord>, StoreError>;

    /// Upsert the singleton credential record.
    fn put_pin(&mut self, record: &CredentialRecord) -> Result<(), StoreError>;

    // -------------------------------------------------------------------
    // Streak collection ("streaks")
    // -------------------------------------------------------------------

    /// Fetch a streak record by name. A missing name is `Ok(None)`.
    fn get_streak(&self, name: &str) -> Result<Option<StreakRecord>, StoreError>;

    /// Upsert a streak record by name. An existing record keeps its
    /// enumeration position.
    fn put_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError>;

    /// Insert a new streak record, failing with [`StoreError::Conflict`] if
    /// the name is already taken.
    fn insert_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError>;

    /// Delete a streak record. Deleting a missing name is not an error.
    fn delete_streak(&mut self, name: &str) -> Result<(), StoreError>;

    /// All streak records in insertion order.
    fn list_streaks(&self) -> Result<Vec<StreakRecord>, StoreError>;

    /// Transactional read-modify-write over the named streak records.
    ///
    /// `f` is called once per name with the currently stored record (or
    /// `None`) and returns the record to write. If `f` fails for any name,
    /// nothing is written and the error is returned. The written records are
    /// returned in the order of `names`.
    fn update_streaks<F, E>(&mut self, names: &[&str], f: F) -> Result<Vec<StreakRecord>, E>
    where
        F: FnMut(&str, Option<StreakRecord>) -> Result<StreakRecord, E>,
        E: From<StoreError>;
}
