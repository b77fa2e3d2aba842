//! CSV import/export of day marks.
//!
//! File layout: a `Streak Name,Date,Status` header, then one row per marked
//! day. Status is carried verbatim here; the repository decides what is
//! acceptable when the rows are merged.

use std::io::{Read, Write};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::{debug, warn};

use crate::data::{format_date, StreakRecord};
use crate::error::Result;

/// Fixed header row of the exchange file
pub const HEADER: [&str; 3] = ["Streak Name", "Date", "Status"];

/// One `(habit, date, status)` triple of the exchange file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRow {
    pub name: String,
    pub date: String,
    pub status: String,
}

impl TransferRow {
    pub fn new(name: impl Into<String>, date: impl Into<String>, status: impl Into<String>) -> Self {
        TransferRow {
            name: name.into(),
            date: date.into(),
            status: status.into(),
        }
    }
}

/// Flatten records into rows: habits in the given order, dates ascending
pub fn export_rows(records: &[StreakRecord]) -> Vec<TransferRow> {
    records
        .iter()
        .flat_map(|record| {
            record.data.iter().map(move |(date, state)| {
                TransferRow::new(record.name.as_str(), format_date(*date), state.as_str())
            })
        })
        .collect()
}

/// Write the header and rows as CSV
pub fn write_csv<W: Write>(writer: W, rows: &[TransferRow]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record([&row.name, &row.date, &row.status])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    debug!(rows = rows.len(), "wrote transfer rows");
    Ok(())
}

/// Read rows from CSV, skipping the header and any row with a missing field
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<TransferRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
        let record = record?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();
        let (name, date, status) = (field(0), field(1), field(2));

        if name.is_empty() || date.is_empty() || status.is_empty() {
            dropped += 1;
            continue;
        }
        rows.push(TransferRow::new(name, date, status));
    }

    if dropped > 0 {
        warn!(dropped, "skipped incomplete rows in import file");
    }
    debug!(rows = rows.len(), "read transfer rows");
    Ok(rows)
}
