//! CSV ledger of every reading taken during a session.
//!
//! Append-only so a crash mid-session keeps all completed rows.
//! Each row contains: timestamp, the three counters, and the verdict.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::automation::decision::Verdict;
use crate::ocr::LootReading;

/// CSV header row.
const CSV_HEADER: &str = "timestamp,gold,elixir,dark,verdict";

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one reading to the CSV file.
pub fn append_reading(
    path: &Path,
    at: &DateTime<Local>,
    reading: &LootReading,
    verdict: Verdict,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    writeln!(
        file,
        "{},{},{},{},{}",
        at.format("%Y-%m-%dT%H:%M:%S"),
        reading.gold,
        reading.elixir,
        reading.dark,
        verdict
    )
    .context("Failed to write CSV row")?;
    Ok(())
}
