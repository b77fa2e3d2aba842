//! In-memory implementation of [`Store`].
//!
//! Same semantics as the SQLite backend, including insertion-order
//! enumeration and all-or-nothing [`Store::update_streaks`]. Used by tests
//! and to preview an import (`import --dry-run`) against a scratch copy.

use indexmap::IndexMap;

use super::models::{CredentialRecord, StreakRecord};
use super::store::{Store, StoreError};

/// Ephemeral store holding records in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    pin: Option<CredentialRecord>,
    streaks: IndexMap<String, StreakRecord>,
    unavailable: bool,
}

impl MemoryStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a scratch store with existing records, preserving their order
    pub fn with_streaks(
        records: impl IntoIterator<Item = StreakRecord>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::default();
        for record in records {
            store.put_streak(&record)?;
        }
        Ok(store)
    }

    /// Make every subsequent operation fail, to exercise error paths
    #[cfg(test)]
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Store for MemoryStore {
    fn get_pin(&self) -> Result<Option<CredentialRecord>, StoreError> {
        self.check()?;
        Ok(self.pin.clone())
    }

    fn put_pin(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.check()?;
        self.pin = Some(record.clone());
        Ok(())
    }

    fn get_streak(&self, name: &str) -> Result<Option<StreakRecord>, StoreError> {
        self.check()?;
        Ok(self.streaks.get(name).cloned())
    }

    fn put_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError> {
        self.check()?;
        // IndexMap::insert keeps the original slot for an existing key
        self.streaks.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn insert_streak(&mut self, record: &StreakRecord) -> Result<(), StoreError> {
        self.check()?;
        if self.streaks.contains_key(&record.name) {
            return Err(StoreError::Conflict(record.name.clone()));
        }
        self.streaks.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn delete_streak(&mut self, name: &str) -> Result<(), StoreError> {
        self.check()?;
        self.streaks.shift_remove(name);
        Ok(())
    }

    fn list_streaks(&self) -> Result<Vec<StreakRecord>, StoreError> {
        self.check()?;
        Ok(self.streaks.values().cloned().collect())
    }

    fn update_streaks<F, E>(&mut self, names: &[&str], mut f: F) -> Result<Vec<StreakRecord>, E>
    where
        F: FnMut(&str, Option<StreakRecord>) -> Result<StreakRecord, E>,
        E: From<StoreError>,
    {
        self.check()?;

        // Stage every write first so a failure leaves the map untouched.
        // Later names see earlier staged writes, as they would inside a
        // SQLite transaction.
        let mut staged: IndexMap<String, StreakRecord> = IndexMap::new();
        let mut written = Vec::with_capacity(names.len());
        for &name in names {
            let current = staged
                .get(name)
                .or_else(|| self.streaks.get(name))
                .cloned();
            let updated = f(name, current)?;
            staged.insert(updated.name.clone(), updated.clone());
            written.push(updated);
        }

        for (name, record) in staged {
            self.streaks.insert(name, record);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::models::MarkState;

    #[test]
    fn test_enumeration_is_insertion_order() {
        let mut store = MemoryStore::new();
        for name in ["b", "a", "c"] {
            store.insert_streak(&StreakRecord::new(name)).unwrap();
        }
        store.delete_streak("a").unwrap();
        store.put_streak(&StreakRecord::new("d")).unwrap();

        let names: Vec<String> = store
            .list_streaks()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_seeded_store_keeps_order() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut run = StreakRecord::new("Run");
        run.apply(day, MarkState::Green);

        let store =
            MemoryStore::with_streaks([run.clone(), StreakRecord::new("Read")]).unwrap();
        let records = store.list_streaks().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], run);
        assert_eq!(records[1].name, "Read");
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let result: Result<_, StoreError> = store.update_streaks(&["x", "y"], |name, _| {
            if name == "y" {
                Err(StoreError::Unavailable("nope".to_string()))
            } else {
                let mut record = StreakRecord::new(name);
                record.apply(day, MarkState::Green);
                Ok(record)
            }
        });
        assert!(result.is_err());
        assert!(store.list_streaks().unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_fails_every_call() {
        let mut store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.get_pin().is_err());
        assert!(store.list_streaks().is_err());
        assert!(matches!(
            store.delete_streak("x"),
            Err(StoreError::Unavailable(_))
        ));
    }
}
