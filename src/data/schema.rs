//! Schema migrations and connection setup for the SQLite backend.
//!
//! Migrations are embedded at compile time and tracked through SQLite's
//! `user_version` pragma, so opening an existing file is a no-op.

use std::time::Duration;

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use super::store::StoreError;

/// How long a writer waits on a lock held by another process
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// All schema migrations, applied in order.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(include_str!("migrations/001_initial_schema.sql"))])
}

/// Configure pragmas and bring the schema up to date.
pub fn configure_and_migrate(conn: &mut Connection) -> Result<(), StoreError> {
    // WAL is silently ignored for in-memory databases.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    migrations()
        .to_latest(conn)
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn test_migrate_twice_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        configure_and_migrate(&mut conn).unwrap();
        configure_and_migrate(&mut conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('pin', 'streaks')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
