//! Data models representing the tracker's persisted records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed primary key of the singleton credential record
pub const CREDENTIAL_ID: i64 = 1;

/// Date format used for day keys and the exchange file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of digits in a PIN
const PIN_LEN: usize = 4;

/// The mark stored for one calendar day of a habit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    Green,
    Red,
}

impl DayState {
    pub fn as_str(self) -> &'static str {
        match self {
            DayState::Green => "green",
            DayState::Red => "red",
        }
    }
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(DayState::Green),
            "red" => Ok(DayState::Red),
            other => Err(format!("unknown day status '{other}'")),
        }
    }
}

/// The state requested when marking a day. `None` clears the mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkState {
    Green,
    Red,
    None,
}

impl MarkState {
    /// The persisted state, or `None` when the day should be unmarked
    pub fn day_state(self) -> Option<DayState> {
        match self {
            MarkState::Green => Some(DayState::Green),
            MarkState::Red => Some(DayState::Red),
            MarkState::None => None,
        }
    }
}

/// Day marks of one habit, keyed by calendar date
pub type DayMap = BTreeMap<NaiveDate, DayState>;

/// A named habit and its day marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub name: String,
    pub data: DayMap,
}

impl StreakRecord {
    /// Create an empty record for a new habit
    pub fn new(name: impl Into<String>) -> Self {
        StreakRecord {
            name: name.into(),
            data: DayMap::new(),
        }
    }

    /// Apply a mark to a single day
    pub fn apply(&mut self, date: NaiveDate, state: MarkState) {
        match state.day_state() {
            Some(day) => {
                self.data.insert(date, day);
            }
            None => {
                self.data.remove(&date);
            }
        }
    }
}

/// The singleton PIN record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: i64,
    pub value: Pin,
}

impl CredentialRecord {
    pub fn new(value: Pin) -> Self {
        CredentialRecord {
            id: CREDENTIAL_ID,
            value,
        }
    }
}

/// A validated 4-digit PIN
#[derive(Clone, PartialEq, Eq)]
pub struct Pin(String);

impl Pin {
    /// Validate a PIN string: exactly four ASCII decimal digits
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == PIN_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(Pin(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep PINs out of logs and debug output
impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Parse a `YYYY-MM-DD` day key
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Format a date as a `YYYY-MM-DD` day key
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_pin_parse() {
        assert!(Pin::parse("0000").is_some());
        assert!(Pin::parse("4821").is_some());
        assert!(Pin::parse("123").is_none());
        assert!(Pin::parse("12345").is_none());
        assert!(Pin::parse("12a4").is_none());
        assert!(Pin::parse(" 123").is_none());
        // Non-ASCII digits are rejected even though they are numeric
        assert!(Pin::parse("١٢٣٤").is_none());
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin = Pin::parse("4821").unwrap();
        assert_eq!(format!("{pin:?}"), "Pin(****)");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(parse_date("2023-02-29").is_none());
        assert!(parse_date("2024/01/01").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_apply_sets_and_clears() {
        let mut record = StreakRecord::new("Read");
        record.apply(date("2024-01-01"), MarkState::Green);
        record.apply(date("2024-01-02"), MarkState::Red);
        assert_eq!(record.data.len(), 2);

        record.apply(date("2024-01-01"), MarkState::None);
        assert_eq!(record.data.len(), 1);
        assert_eq!(record.data.get(&date("2024-01-02")), Some(&DayState::Red));

        // Clearing an unmarked day is a no-op
        record.apply(date("2024-01-05"), MarkState::None);
        assert_eq!(record.data.len(), 1);
    }

    #[test]
    fn test_day_map_json_shape() {
        let mut record = StreakRecord::new("Run");
        record.apply(date("2024-01-02"), MarkState::Red);
        record.apply(date("2024-01-01"), MarkState::Green);
        let json = serde_json::to_string(&record.data).unwrap();
        assert_eq!(json, r#"{"2024-01-01":"green","2024-01-02":"red"}"#);

        let back: DayMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record.data);
    }

    #[test]
    fn test_day_state_from_str() {
        assert_eq!("green".parse::<DayState>(), Ok(DayState::Green));
        assert_eq!("red".parse::<DayState>(), Ok(DayState::Red));
        assert!("Green".parse::<DayState>().is_err());
        assert!("none".parse::<DayState>().is_err());
    }
}
