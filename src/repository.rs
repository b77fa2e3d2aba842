//! Habit and PIN operations over a [`Store`].
//!
//! The repository keeps no cached records: every operation reads what it
//! needs from the store, and every read-modify-write goes through
//! [`Store::update_streaks`] so it is applied atomically.

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::data::{
    parse_date, CredentialRecord, DayMap, DayState, MarkState, Pin, Store, StoreError,
    StreakRecord,
};
use crate::error::{Result, StreakError};
use crate::transfer::{export_rows, TransferRow};

/// Outcome of a merged import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Habits touched by the import
    pub habits: usize,
    /// Distinct day marks written
    pub days: usize,
    /// Habits that did not exist before the import
    pub created: Vec<String>,
}

/// Validate a PIN before any storage access
fn parse_pin(raw: &str) -> Result<Pin> {
    Pin::parse(raw).ok_or_else(|| {
        warn!("rejected malformed PIN");
        StreakError::invalid("PIN must be a 4-digit number")
    })
}

/// Trim a habit name and reject empty ones
fn normalize_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        warn!("rejected empty habit name");
        return Err(StreakError::invalid("habit name must not be empty"));
    }
    Ok(name)
}

fn parse_day(raw: &str) -> Result<NaiveDate> {
    parse_date(raw)
        .ok_or_else(|| StreakError::invalid(format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Domain operations for habits, day marks and the PIN
pub struct StreakRepository<S> {
    store: S,
}

impl<S: Store> StreakRepository<S> {
    pub fn new(store: S) -> Self {
        StreakRepository { store }
    }

    // -------------------------------------------------------------------
    // Credential
    // -------------------------------------------------------------------

    /// Whether a PIN has been set
    pub fn has_credential(&self) -> Result<bool> {
        Ok(self.store.get_pin()?.is_some())
    }

    /// Set (or overwrite) the PIN
    pub fn set_credential(&mut self, pin: &str) -> Result<()> {
        let pin = parse_pin(pin)?;
        self.store.put_pin(&CredentialRecord::new(pin))?;
        info!("PIN set");
        Ok(())
    }

    /// Check a PIN against the stored one. False when no PIN is set.
    pub fn verify_credential(&self, pin: &str) -> Result<bool> {
        let pin = parse_pin(pin)?;
        let matches = self
            .store
            .get_pin()?
            .is_some_and(|record| record.value == pin);
        debug!(matches, "verified PIN");
        Ok(matches)
    }

    /// Replace the PIN after verifying the current one
    pub fn change_credential(&mut self, old: &str, new: &str) -> Result<()> {
        let new = parse_pin(new)?;
        if !self.verify_credential(old)? {
            warn!("PIN change rejected: current PIN does not match");
            return Err(StreakError::InvalidCredential);
        }
        self.store.put_pin(&CredentialRecord::new(new))?;
        info!("PIN changed");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Habits
    // -------------------------------------------------------------------

    /// Habit names, sorted alphabetically
    pub fn list_habit_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .store
            .list_streaks()?
            .into_iter()
            .map(|record| record.name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// All habit records in store order
    pub fn list_habits(&self) -> Result<Vec<StreakRecord>> {
        Ok(self.store.list_streaks()?)
    }

    /// Create an empty habit. Returns the stored (trimmed) name.
    pub fn create_habit(&mut self, name: &str) -> Result<String> {
        let name = normalize_name(name)?;
        match self.store.insert_streak(&StreakRecord::new(name)) {
            Ok(()) => {
                info!(habit = %name, "created habit");
                Ok(name.to_string())
            }
            Err(StoreError::Conflict(existing)) => {
                warn!(habit = %existing, "habit already exists");
                Err(StreakError::DuplicateHabit(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a habit and all its day marks. Missing names are ignored.
    pub fn delete_habit(&mut self, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        self.store.delete_streak(name)?;
        info!(habit = %name, "deleted habit");
        Ok(())
    }

    /// A habit and its day marks, if it exists
    pub fn find_habit(&self, name: &str) -> Result<Option<StreakRecord>> {
        let name = normalize_name(name)?;
        Ok(self.store.get_streak(name)?)
    }

    /// Day marks of a habit; empty if the habit does not exist
    #[allow(dead_code)] // Used in tests
    pub fn get_habit_data(&self, name: &str) -> Result<DayMap> {
        Ok(self
            .find_habit(name)?
            .map(|record| record.data)
            .unwrap_or_default())
    }

    /// Set or clear the mark for one day of an existing habit
    pub fn mark_day(&mut self, name: &str, date: &str, state: MarkState) -> Result<StreakRecord> {
        let name = normalize_name(name)?;
        let date = parse_day(date)?;

        let written = self.store.update_streaks(
            &[name],
            |name: &str, current: Option<StreakRecord>| -> Result<StreakRecord> {
                let mut record = current.ok_or_else(|| StreakError::NotFound(name.to_string()))?;
                record.apply(date, state);
                Ok(record)
            },
        )?;
        debug!(habit = %name, %date, ?state, "marked day");

        written
            .into_iter()
            .next()
            .ok_or_else(|| StreakError::NotFound(name.to_string()))
    }

    /// Clear every day mark of an existing habit, keeping the habit
    pub fn reset_habit(&mut self, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        self.store.update_streaks(
            &[name],
            |name: &str, current: Option<StreakRecord>| -> Result<StreakRecord> {
                match current {
                    Some(record) => Ok(StreakRecord::new(record.name)),
                    None => Err(StreakError::NotFound(name.to_string())),
                }
            },
        )?;
        info!(habit = %name, "reset habit");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Bulk transfer
    // -------------------------------------------------------------------

    /// Every day mark of every habit as exchange rows
    pub fn export(&self) -> Result<Vec<TransferRow>> {
        let rows = export_rows(&self.store.list_streaks()?);
        info!(rows = rows.len(), "exported day marks");
        Ok(rows)
    }

    /// Merge imported rows into existing habits, creating missing ones.
    ///
    /// Every row is validated first; one bad date or status rejects the
    /// whole import before anything is written. Imported marks overwrite
    /// existing marks for the same day, other existing marks are kept. When a
    /// file repeats a day, its last row wins. All habits are written in a
    /// single transaction.
    pub fn merge_import(&mut self, rows: &[TransferRow]) -> Result<ImportSummary> {
        let mut groups: IndexMap<String, DayMap> = IndexMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let line = idx + 2; // header is line 1
            let name = normalize_name(&row.name)
                .map_err(|_| StreakError::invalid(format!("line {line}: empty habit name")))?;
            let date = parse_date(&row.date).ok_or_else(|| {
                StreakError::invalid(format!("line {line}: '{}' is not a YYYY-MM-DD date", row.date))
            })?;
            let state: DayState = row
                .status
                .trim()
                .parse()
                .map_err(|e| StreakError::invalid(format!("line {line}: {e}")))?;
            groups.entry(name.to_string()).or_default().insert(date, state);
        }

        if groups.is_empty() {
            info!("import contained no rows");
            return Ok(ImportSummary::default());
        }

        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        let mut created = Vec::new();
        self.store.update_streaks(
            &names,
            |name: &str, current: Option<StreakRecord>| -> Result<StreakRecord> {
                let mut record = current.unwrap_or_else(|| {
                    created.push(name.to_string());
                    StreakRecord::new(name)
                });
                if let Some(marks) = groups.get(name) {
                    record.data.extend(marks);
                }
                Ok(record)
            },
        )?;

        let summary = ImportSummary {
            habits: groups.len(),
            days: groups.values().map(DayMap::len).sum(),
            created,
        };
        info!(
            habits = summary.habits,
            days = summary.days,
            created = summary.created.len(),
            "merged import"
        );
        Ok(summary)
    }
}
