//! SQLite storage layer for the tracker database.
//!
//! Database schema:
//! - `pin` table: id (always 1), value
//! - `streaks` table: name (primary key), data (JSON object of day marks)
//!
//! Enumeration follows rowid, i.e. insertion order. Upserts use
//! `ON CONFLICT ... DO UPDATE` so an existing habit keeps its rowid.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use super::models::{CredentialRecord, DayMap, Pin, StreakRecord, CREDENTIAL_ID};
use super::schema::configure_and_migrate;
use super::store::{Store, StoreError};

/// Decode a `streaks` row into a record
fn streak_from_row(row: &Row) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn decode_streak(name: String, data_json: &str) -> Result<StreakRecord, StoreError> {
    let data: DayMap = serde_json::from_str(data_json)?;
    Ok(StreakRecord { name, data })
}

/// True if the error is a primary-key / unique constraint violation
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

const SELECT_STREAK: &str = "SELECT name, data FROM streaks WHERE name = ?1";
const UPSERT_STREAK: &str = "INSERT INTO streaks (name, data) VALUES (?1, ?2)
     ON CONFLICT(name) DO UPDATE SET data = excluded.data";

/// Durable store backed by a single SQLite file
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`, creating parent
    /// directories and applying pending migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let mut conn = Connection::open(path)?;
        configure_and_migrate(&mut conn)?;
        debug!(path = %path.display(), "opened streak database");
        Ok(SqliteStore {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        configure_and_migrate(&mut conn)?;
        Ok(SqliteStore { conn, path: None })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Store for SqliteStore {
    fn get_pin(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM pin WHERE id = ?1",
                params![CREDENTIAL_ID],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            None => Ok(None),
            Some(raw) => Pin::parse(&raw)
                .map(|pin| Some(CredentialRecord::new(pin)))
                .ok_or_else(|| {
                    StoreError::Unavailable("stored PIN record is malformed".to_string())
                }),
        }
    }

    fn put_pin(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO pin (id, value) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            params![record.id, record.value.as_str()],
        )?;
        debug!("stored PIN record");
        Ok(())
    }

    fn get_streak(&self, name: &str) -> Result<Option<StreakRecord>, StoreError> {
        let row = self
            .conn
            .query_row(SELECT_STREAK, params![name], streak_from_row)
            .optional()?;
        row.map(|(name, json)| decode_streak(name, &json))
            .transpose()
    }

    fn put_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(&record.data)?;
        self.conn
            .execute(UPSERT_STREAK, params![record.name, json])?;
        debug!(habit = %record.name, days = record.data.len(), "stored streak record");
        Ok(())
    }

    fn insert_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(&record.data)?;
        match self.conn.execute(
            "INSERT INTO streaks (name, data) VALUES (?1, ?2)",
            params![record.name, json],
        ) {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(StoreError::Conflict(record.name.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_streak(&mut self, name: &str) -> Result<(), StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM streaks WHERE name = ?1", params![name])?;
        debug!(habit = %name, removed, "deleted streak record");
        Ok(())
    }

    fn list_streaks(&self) -> Result<Vec<StreakRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, data FROM streaks ORDER BY rowid")?;
        let rows = stmt.query_map([], streak_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let (name, json) = row?;
            records.push(decode_streak(name, &json)?);
        }
        Ok(records)
    }

    fn update_streaks<F, E>(&mut self, names: &[&str], mut f: F) -> Result<Vec<StreakRecord>, E>
    where
        F: FnMut(&str, Option<StreakRecord>) -> Result<StreakRecord, E>,
        E: From<StoreError>,
    {
        // IMMEDIATE takes the write lock up front so the read below cannot go
        // stale before the write.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        let mut written = Vec::with_capacity(names.len());
        for &name in names {
            let current = tx
                .query_row(SELECT_STREAK, params![name], streak_from_row)
                .optional()
                .map_err(StoreError::from)?
                .map(|(name, json)| decode_streak(name, &json))
                .transpose()?;

            // Returning early drops `tx`, which rolls back.
            let updated = f(name, current)?;
            let json = serde_json::to_string(&updated.data).map_err(StoreError::from)?;
            tx.execute(UPSERT_STREAK, params![updated.name, json])
                .map_err(StoreError::from)?;
            written.push(updated);
        }

        tx.commit().map_err(StoreError::from)?;
        debug!(records = written.len(), "committed streak update");
        Ok(written)
    }
}
