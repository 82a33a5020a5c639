use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FlaskPair, LedgerField};

/// The ordered table of flask pairs currently out at one station.
/// Row order is slot order: the first row is the oldest shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationLedger {
    station: String,
    rows: Vec<FlaskPair>,
}

impl StationLedger {
    pub fn new(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(station: impl Into<String>, rows: Vec<FlaskPair>) -> Self {
        Self {
            station: station.into(),
            rows,
        }
    }

    /// Station identifier, which is also the table name.
    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn rows(&self) -> &[FlaskPair] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn oldest(&self) -> Option<&FlaskPair> {
        self.rows.first()
    }

    pub fn newest(&self) -> Option<&FlaskPair> {
        self.rows.last()
    }

    pub fn contains(&self, low_id: &str) -> bool {
        self.find(low_id).is_some()
    }

    pub fn find(&self, low_id: &str) -> Option<&FlaskPair> {
        self.rows.iter().find(|row| row.low_id == low_id)
    }

    /// Append a row at the end of the table. No uniqueness check is made here;
    /// use [`validate_ship`] first.
    pub fn append(&mut self, flask: FlaskPair) {
        self.rows.push(flask);
    }

    /// Remove every row with the given low id, keeping the rest in order.
    /// Returns the removed rows.
    pub fn remove(&mut self, low_id: &str) -> Vec<FlaskPair> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.rows.drain(..).partition(|row| row.low_id == low_id);
        self.rows = kept;
        removed
    }
}

/// Renders the table transposed: one line per field, one column per slot.
impl fmt::Display for StationLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return writeln!(f, "{} (no flasks)", self.station);
        }

        let label_width = LedgerField::ALL
            .iter()
            .map(|field| field.as_str().len())
            .chain(std::iter::once(self.station.len()))
            .max()
            .unwrap_or(0);

        let columns: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                LedgerField::ALL
                    .iter()
                    .map(|field| field.value_of(row))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(slot, values)| {
                values
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(slot.to_string().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut header = format!("{:<label_width$}", self.station);
        for (slot, width) in widths.iter().enumerate() {
            header.push_str(&format!("  {:<width$}", slot, width = *width));
        }
        writeln!(f, "{}", header.trim_end())?;

        for (i, field) in LedgerField::ALL.iter().enumerate() {
            let mut line = format!("{:<label_width$}", field.as_str());
            for (values, width) in columns.iter().zip(&widths) {
                line.push_str(&format!("  {:<width$}", values[i], width = *width));
            }
            writeln!(f, "{}", line.trim_end())?;
        }

        Ok(())
    }
}

/// Check that a low id can be shipped to a station.
///
/// The id is rejected if it appears in the snapshot taken when the ledgers
/// were loaded, or in the live table. A pair that was received earlier in the
/// same session is therefore still considered present.
pub fn validate_ship(
    low_id: &str,
    live: &StationLedger,
    original: &StationLedger,
) -> Result<(), ShipConflict> {
    if low_id.trim().is_empty() {
        return Err(ShipConflict::MissingLowId {
            station: live.station().to_string(),
        });
    }
    if let Some(existing) = original.find(low_id).or_else(|| live.find(low_id)) {
        return Err(ShipConflict::AlreadyAtStation {
            station: live.station().to_string(),
            existing: existing.clone(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipConflict {
    AlreadyAtStation {
        station: String,
        existing: FlaskPair,
    },
    MissingLowId {
        station: String,
    },
}

impl fmt::Display for ShipConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipConflict::AlreadyAtStation { station, existing } => {
                write!(
                    f,
                    "Flask number {} is already at {} (shipped {})",
                    existing.low_id, station, existing.ship_date
                )
            }
            ShipConflict::MissingLowId { station } => {
                write!(f, "No low flask number given for {}", station)
            }
        }
    }
}

impl std::error::Error for ShipConflict {}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn flask(low: &str, date: &str) -> FlaskPair {
        FlaskPair::new(low, NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap())
    }

    fn sample_ledger() -> StationLedger {
        StationLedger::with_rows(
            "MLO",
            vec![
                flask("101", "2023-01-01"),
                flask("205", "2023-02-01"),
                flask("310", "2023-03-01"),
            ],
        )
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = StationLedger::new("MLO");
        assert!(ledger.is_empty());
        assert!(ledger.oldest().is_none());
        assert!(ledger.newest().is_none());
    }

    #[test]
    fn test_oldest_and_newest_follow_table_order() {
        let ledger = sample_ledger();
        assert_eq!(ledger.oldest().unwrap().low_id, "101");
        assert_eq!(ledger.newest().unwrap().low_id, "310");
    }

    #[test]
    fn test_append_keeps_existing_order() {
        let mut ledger = sample_ledger();
        ledger.append(flask("400", "2023-04-01"));

        let ids: Vec<&str> = ledger.rows().iter().map(|r| r.low_id.as_str()).collect();
        assert_eq!(ids, vec!["101", "205", "310", "400"]);
    }

    #[test]
    fn test_remove_filters_matching_rows_only() {
        let mut ledger = sample_ledger();
        let removed = ledger.remove("205");

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].low_id, "205");
        let ids: Vec<&str> = ledger.rows().iter().map(|r| r.low_id.as_str()).collect();
        assert_eq!(ids, vec!["101", "310"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut ledger = sample_ledger();
        let removed = ledger.remove("999");

        assert!(removed.is_empty());
        assert_eq!(ledger, sample_ledger());
    }

    #[test]
    fn test_validate_ship_against_snapshot() {
        let original = sample_ledger();
        let mut live = original.clone();
        live.remove("101");

        // Received this session, but the snapshot still has it.
        let result = validate_ship("101", &live, &original);
        assert!(matches!(
            result,
            Err(ShipConflict::AlreadyAtStation { ref existing, .. }) if existing.low_id == "101"
        ));
    }

    #[test]
    fn test_validate_ship_against_live_table() {
        let original = StationLedger::new("MLO");
        let mut live = original.clone();
        live.append(flask("101", "2023-01-01"));

        assert!(validate_ship("101", &live, &original).is_err());
        assert!(validate_ship("102", &live, &original).is_ok());
    }

    #[test]
    fn test_validate_ship_rejects_blank_low_id() {
        let original = StationLedger::new("MLO");

        for low_id in ["", "   "] {
            assert_eq!(
                validate_ship(low_id, &original, &original),
                Err(ShipConflict::MissingLowId {
                    station: "MLO".to_string()
                })
            );
        }
    }

    #[test]
    fn test_display_transposed_layout() {
        let ledger = StationLedger::with_rows(
            "MLO",
            vec![flask("101", "2023-01-01").with_high_id("102")],
        );
        let rendered = ledger.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("MLO"));
        assert!(lines[0].ends_with('0'));
        assert!(lines[1].starts_with("low") && lines[1].ends_with("101"));
        assert!(lines[2].starts_with("high") && lines[2].ends_with("102"));
        assert!(lines[3].ends_with("2023-01-01"));
        assert_eq!(lines[4], "notes");
        assert!(lines[5].ends_with("False"));
    }

    #[test]
    fn test_display_empty() {
        assert_eq!(StationLedger::new("SMO").to_string(), "SMO (no flasks)\n");
    }
}
