use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{FlaskPair, LedgerField, StationLedger, optional_text};

/// File extension for persisted ledger tables.
pub const LEDGER_EXTENSION: &str = "csv";

/// Paths written by a single station save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLedger {
    pub station: String,
    pub archive_path: PathBuf,
    pub current_path: PathBuf,
}

/// Repository for reading and writing per-station ledger files.
///
/// Each station `S` lives in its own directory under the data directory:
/// `S/S.csv` is the current table and `S/S.<date>.csv` are dated archives.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    data_dir: PathBuf,
}

impl LedgerRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ========================
    // Paths
    // ========================

    pub fn station_dir(&self, station: &str) -> PathBuf {
        self.data_dir.join(station)
    }

    /// Path a station is loaded from: `S/S{tag}.csv`.
    pub fn load_path(&self, station: &str, tag: &str) -> PathBuf {
        self.station_dir(station)
            .join(format!("{}{}.{}", station, tag, LEDGER_EXTENSION))
    }

    /// The generic "current" file, overwritten on every save.
    pub fn current_path(&self, station: &str) -> PathBuf {
        self.load_path(station, "")
    }

    /// The dated archive written alongside the current file.
    pub fn archive_path(&self, station: &str, date: NaiveDate) -> PathBuf {
        self.station_dir(station).join(format!(
            "{}.{}.{}",
            station,
            date.format("%Y-%m-%d"),
            LEDGER_EXTENSION
        ))
    }

    // ========================
    // Ledger operations
    // ========================

    /// Load one station's table. The file must already exist.
    pub fn load(&self, station: &str, tag: &str) -> Result<StationLedger> {
        let path = self.load_path(station, tag);
        let file = File::open(&path)
            .with_context(|| format!("Failed to open ledger file {}", path.display()))?;
        let ledger = read_table(station, file)
            .with_context(|| format!("Malformed ledger file {}", path.display()))?;
        debug!(station, path = %path.display(), rows = ledger.len(), "loaded ledger");
        Ok(ledger)
    }

    /// Write the dated archive, then overwrite the current file.
    pub fn save(&self, ledger: &StationLedger, date: NaiveDate) -> Result<SavedLedger> {
        let station = ledger.station();
        let dir = self.station_dir(station);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create station directory {}", dir.display()))?;

        let archive_path = self.archive_path(station, date);
        write_file(&archive_path, ledger)?;
        info!(station, path = %archive_path.display(), "saved dated ledger");

        let current_path = self.current_path(station);
        write_file(&current_path, ledger)?;
        info!(station, path = %current_path.display(), "saved current ledger");

        Ok(SavedLedger {
            station: station.to_string(),
            archive_path,
            current_path,
        })
    }

    /// Create an empty current table for a new station.
    pub fn create(&self, station: &str) -> Result<PathBuf> {
        let path = self.current_path(station);
        if path.exists() {
            bail!("Ledger file already exists: {}", path.display());
        }
        let dir = self.station_dir(station);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create station directory {}", dir.display()))?;
        write_file(&path, &StationLedger::new(station))?;
        info!(station, path = %path.display(), "created empty ledger");
        Ok(path)
    }

    pub fn exists(&self, station: &str) -> bool {
        self.current_path(station).exists()
    }
}

fn write_file(path: &Path, ledger: &StationLedger) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create ledger file {}", path.display()))?;
    write_table(ledger, file)
        .with_context(|| format!("Failed to write ledger file {}", path.display()))
}

/// Write a ledger as a labeled, transposed CSV table.
///
/// The header is `<station>,0,1,...` and each following record is one field
/// (`low`, `high`, `outdate`, `notes`, `returned`) across all slots. Slots are
/// always numbered from zero in table order.
pub fn write_table<W: Write>(ledger: &StationLedger, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![ledger.station().to_string()];
    header.extend((0..ledger.len()).map(|slot| slot.to_string()));
    csv_writer.write_record(&header)?;

    for field in LedgerField::ALL {
        let mut record = vec![field.as_str().to_string()];
        record.extend(ledger.rows().iter().map(|row| field.value_of(row)));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Read a labeled, transposed CSV table written by [`write_table`].
///
/// Slot numbers in the header are ignored; column order is the row order.
pub fn read_table<R: Read>(station: &str, reader: R) -> Result<StationLedger> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers().context("Missing table header")?.clone();
    let name = headers.get(0).unwrap_or("");
    if name != station {
        bail!("Table is named '{}', expected '{}'", name, station);
    }
    let slots = headers.len() - 1;

    let mut fields: HashMap<LedgerField, Vec<String>> = HashMap::new();
    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing
        let record = result.with_context(|| format!("CSV parse error on line {}", line))?;

        let label = record.get(0).unwrap_or("");
        let field = LedgerField::from_str(label)
            .ok_or_else(|| anyhow!("Unknown row label '{}' on line {}", label, line))?;
        let values: Vec<String> = record.iter().skip(1).map(str::to_string).collect();
        if fields.insert(field, values).is_some() {
            bail!("Duplicate row label '{}' on line {}", label, line);
        }
    }

    let lows = take_row(&mut fields, LedgerField::Low)?;
    let highs = take_row(&mut fields, LedgerField::High)?;
    let dates = take_row(&mut fields, LedgerField::OutDate)?;
    let notes = take_row(&mut fields, LedgerField::Notes)?;
    let returned = take_row(&mut fields, LedgerField::Returned)?;

    let mut rows = Vec::with_capacity(slots);
    for slot in 0..slots {
        let low_id = lows[slot].trim();
        if low_id.is_empty() {
            bail!("Empty low flask id in slot {}", slot);
        }
        let ship_date = NaiveDate::parse_from_str(dates[slot].trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid outdate '{}' in slot {}", dates[slot], slot))?;

        rows.push(FlaskPair {
            low_id: low_id.to_string(),
            high_id: optional_text(&highs[slot]),
            ship_date,
            notes: optional_text(&notes[slot]),
            returned: parse_flag(&returned[slot])
                .with_context(|| format!("Invalid returned flag in slot {}", slot))?,
        });
    }

    Ok(StationLedger::with_rows(station, rows))
}

fn take_row(fields: &mut HashMap<LedgerField, Vec<String>>, field: LedgerField) -> Result<Vec<String>> {
    fields
        .remove(&field)
        .ok_or_else(|| anyhow!("Missing '{}' row", field))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        other => bail!("Expected True or False, got '{}'", other),
    }
}
