//! Command dispatch: unlocks with the PIN, runs one command, prints results.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::cli::{AppConfig, Commands, HabitCommand, PinCommand};
use crate::data::{format_date, DayMap, MarkState, MemoryStore, SqliteStore, Store};
use crate::error::StreakError;
use crate::repository::{ImportSummary, StreakRepository};
use crate::stats::{compute_stats, StreakStats};
use crate::transfer::{read_csv, write_csv};

/// One habit with its marks and derived counts, as printed by `show --json`
#[derive(Debug, Serialize)]
struct HabitView<'a> {
    name: &'a str,
    data: &'a DayMap,
    #[serde(flatten)]
    stats: StreakStats,
}

/// One row of `stats --json`
#[derive(Debug, Serialize)]
struct HabitSummary {
    name: String,
    #[serde(flatten)]
    stats: StreakStats,
}

/// Application state for a single invocation
pub struct App<S> {
    repo: StreakRepository<S>,
    pin: Option<String>,
    today: NaiveDate,
}

impl<S: Store> App<S> {
    pub fn new(repo: StreakRepository<S>, pin: Option<String>, today: NaiveDate) -> Self {
        App { repo, pin, today }
    }

    /// Require a configured PIN and a matching `--pin`
    fn unlock(&self) -> Result<()> {
        if !self.repo.has_credential()? {
            bail!("no PIN set yet; run `streak pin set <PIN>` first");
        }
        let pin = self
            .pin
            .as_deref()
            .context("this command needs --pin or STREAK_PIN")?;
        if !self.repo.verify_credential(pin)? {
            bail!("Invalid PIN");
        }
        Ok(())
    }

    /// Run one command, writing user-facing output to `out`
    pub fn execute(&mut self, command: Commands, out: &mut impl Write) -> Result<()> {
        match command {
            Commands::Pin { action } => self.execute_pin(action, out),
            Commands::Habit { action } => {
                self.unlock()?;
                self.execute_habit(action, out)
            }
            Commands::Mark { name, state, date } => {
                self.unlock()?;
                self.mark(&name, state.into(), date, out)
            }
            Commands::Show { name, json } => {
                self.unlock()?;
                self.show(&name, json, out)
            }
            Commands::Stats { json } => {
                self.unlock()?;
                self.stats(json, out)
            }
            Commands::Export { file } => {
                self.unlock()?;
                self.export(&file, out)
            }
            Commands::Import { file, dry_run } => {
                self.unlock()?;
                self.import(&file, dry_run, out)
            }
        }
    }

    fn execute_pin(&mut self, action: PinCommand, out: &mut impl Write) -> Result<()> {
        match action {
            PinCommand::Set { code } => {
                if self.repo.has_credential()? {
                    bail!("a PIN is already set; use `streak pin change <OLD> <NEW>`");
                }
                self.repo.set_credential(&code)?;
                writeln!(out, "PIN set successfully")?;
            }
            PinCommand::Change { old, new } => {
                match self.repo.change_credential(&old, &new) {
                    Err(StreakError::InvalidCredential) => bail!("Old PIN is incorrect"),
                    other => other?,
                }
                writeln!(out, "PIN updated successfully")?;
            }
            PinCommand::Verify { code } => {
                if !self.repo.verify_credential(&code)? {
                    bail!("Invalid PIN");
                }
                writeln!(out, "PIN OK")?;
            }
        }
        Ok(())
    }

    fn execute_habit(&mut self, action: HabitCommand, out: &mut impl Write) -> Result<()> {
        match action {
            HabitCommand::Add { name } => {
                let name = self.repo.create_habit(&name)?;
                writeln!(out, "Added habit '{name}'")?;
            }
            HabitCommand::Delete { name } => {
                self.repo.delete_habit(&name)?;
                writeln!(out, "Deleted habit '{}'", name.trim())?;
            }
            HabitCommand::List => {
                for name in self.repo.list_habit_names()? {
                    writeln!(out, "{name}")?;
                }
            }
            HabitCommand::Reset { name } => {
                self.repo.reset_habit(&name)?;
                writeln!(out, "Reset habit '{}'", name.trim())?;
            }
        }
        Ok(())
    }

    fn mark(
        &mut self,
        name: &str,
        state: MarkState,
        date: Option<String>,
        out: &mut impl Write,
    ) -> Result<()> {
        let date = date.unwrap_or_else(|| format_date(self.today));
        let record = self.repo.mark_day(name, &date, state)?;
        let stats = compute_stats(&record.data, self.today);

        let mark = match state.day_state() {
            Some(day) => day.as_str(),
            None => "cleared",
        };
        writeln!(
            out,
            "{} {}: {} (current streak {}, longest {})",
            record.name,
            date.trim(),
            mark,
            stats.current,
            stats.longest
        )?;
        Ok(())
    }

    fn show(&self, name: &str, json: bool, out: &mut impl Write) -> Result<()> {
        let record = self
            .repo
            .find_habit(name)?
            .ok_or_else(|| StreakError::NotFound(name.trim().to_string()))?;
        let stats = compute_stats(&record.data, self.today);

        if json {
            let view = HabitView {
                name: &record.name,
                data: &record.data,
                stats,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
            return Ok(());
        }

        writeln!(out, "{}", record.name)?;
        for (date, state) in &record.data {
            writeln!(out, "  {}  {}", format_date(*date), state)?;
        }
        writeln!(out, "Current streak: {}", stats.current)?;
        writeln!(out, "Longest streak: {}", stats.longest)?;
        if stats.current > 0 && !stats.is_alive(self.today) {
            if let Some(last) = stats.last_green {
                writeln!(out, "(last completed {})", format_date(last))?;
            }
        }
        Ok(())
    }

    fn stats(&self, json: bool, out: &mut impl Write) -> Result<()> {
        let mut summaries: Vec<HabitSummary> = self
            .repo
            .list_habits()?
            .into_iter()
            .map(|record| HabitSummary {
                stats: compute_stats(&record.data, self.today),
                name: record.name,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&summaries)?)?;
            return Ok(());
        }

        if summaries.is_empty() {
            writeln!(out, "No habits yet; add one with `streak habit add <NAME>`")?;
            return Ok(());
        }
        writeln!(out, "{:<24} {:>8} {:>8}", "HABIT", "CURRENT", "LONGEST")?;
        for summary in &summaries {
            writeln!(
                out,
                "{:<24} {:>8} {:>8}",
                summary.name, summary.stats.current, summary.stats.longest
            )?;
        }
        Ok(())
    }

    fn export(&self, file: &Path, out: &mut impl Write) -> Result<()> {
        let rows = self.repo.export()?;
        let handle = File::create(file)
            .with_context(|| format!("Failed to create export file: {file:?}"))?;
        write_csv(BufWriter::new(handle), &rows)
            .with_context(|| format!("Failed to write export file: {file:?}"))?;
        writeln!(out, "Exported {} day marks to {}", rows.len(), file.display())?;
        Ok(())
    }

    fn import(&mut self, file: &Path, dry_run: bool, out: &mut impl Write) -> Result<()> {
        let handle =
            File::open(file).with_context(|| format!("Failed to open import file: {file:?}"))?;
        let rows = read_csv(BufReader::new(handle))
            .with_context(|| format!("Failed to read import file: {file:?}"))?;

        if dry_run {
            // Merge into a scratch copy so the real store is untouched
            let mut scratch =
                StreakRepository::new(MemoryStore::with_streaks(self.repo.list_habits()?)?);
            let summary = scratch.merge_import(&rows)?;
            writeln!(out, "Dry run: {}", describe_import(&summary))?;
            return Ok(());
        }

        let summary = self.repo.merge_import(&rows)?;
        writeln!(out, "{}", describe_import(&summary))?;
        Ok(())
    }
}

fn describe_import(summary: &ImportSummary) -> String {
    let mut text = format!(
        "imported {} day marks into {} habits",
        summary.days, summary.habits
    );
    if !summary.created.is_empty() {
        text.push_str(&format!(" (new: {})", summary.created.join(", ")));
    }
    text
}

/// Open the configured database and run one command
pub fn run(config: AppConfig, command: Commands) -> Result<()> {
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {:?}", config.db_path))?;
    if let Some(path) = store.path() {
        info!(path = %path.display(), "using streak database");
    }

    let today = Local::now().date_naive();
    let mut app = App::new(StreakRepository::new(store), config.pin, today);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.execute(command, &mut out)
}
