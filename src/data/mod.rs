//! Data layer for the tracker's persisted records.
//!
//! Holds the record models, the [`Store`] contract, and its SQLite and
//! in-memory backends.

mod memory;
mod models;
mod schema;
mod storage;
mod store;

pub use memory::MemoryStore;
pub use models::{
    format_date, parse_date, CredentialRecord, DayMap, DayState, MarkState, Pin, StreakRecord,
};
pub use storage::SqliteStore;
pub use store::{Store, StoreError};
