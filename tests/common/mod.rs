// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::io::Cursor;

use anyhow::Result;
use chrono::NaiveDate;
use flasktrack::application::StationLedgerSet;
use flasktrack::cli::prompt::LinePrompter;
use flasktrack::domain::{FlaskPair, StationLedger};
use flasktrack::storage::LedgerRepository;
use tempfile::TempDir;

/// Helper to parse a date string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to create a repository over a fresh temporary data directory
pub fn test_repo() -> Result<(LedgerRepository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let repo = LedgerRepository::new(temp_dir.path());
    Ok((repo, temp_dir))
}

/// Prompter that answers from a fixed script and records what it showed
pub fn scripted(answers: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
    LinePrompter::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new())
}

pub fn low_ids(ledger: &StationLedger) -> Vec<&str> {
    ledger.rows().iter().map(|row| row.low_id.as_str()).collect()
}

/// Test fixture: standard stations on disk
pub struct StandardStations;

impl StandardStations {
    pub const NAMES: [&'static str; 3] = ["MLO", "SMO", "SPO"];

    /// MLO is empty, SMO has two pairs out, SPO has three
    pub fn write(repo: &LedgerRepository) -> Result<()> {
        let archive_date = parse_date("2023-01-01");
        repo.save(&StationLedger::new("MLO"), archive_date)?;
        repo.save(
            &StationLedger::with_rows(
                "SMO",
                vec![
                    FlaskPair::new("101", parse_date("2023-01-05")).with_high_id("102"),
                    FlaskPair::new("205", parse_date("2023-02-01")),
                ],
            ),
            archive_date,
        )?;
        repo.save(
            &StationLedger::with_rows(
                "SPO",
                vec![
                    FlaskPair::new("310", parse_date("2023-01-10")),
                    FlaskPair::new("312", parse_date("2023-01-20")).with_notes("ice on valve"),
                    FlaskPair::new("314", parse_date("2023-02-15")),
                ],
            ),
            archive_date,
        )?;
        Ok(())
    }

    /// Write the standard stations and load them back
    pub fn load() -> Result<(StationLedgerSet, TempDir)> {
        let (repo, temp_dir) = test_repo()?;
        Self::write(&repo)?;
        let set = StationLedgerSet::load(repo, &Self::NAMES, "")?;
        Ok((set, temp_dir))
    }
}
