use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A flask pair out at a station, identified by its low-numbered flask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaskPair {
    pub low_id: String,
    pub high_id: Option<String>,
    pub ship_date: NaiveDate,
    pub notes: Option<String>,
    /// Stored with the row but never consulted; receiving removes the row instead.
    pub returned: bool,
}

impl FlaskPair {
    pub fn new(low_id: impl Into<String>, ship_date: NaiveDate) -> Self {
        Self {
            low_id: low_id.into(),
            high_id: None,
            ship_date,
            notes: None,
            returned: false,
        }
    }

    pub fn with_high_id(mut self, high_id: impl Into<String>) -> Self {
        self.high_id = Some(high_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Optional text as a ledger cell holds it: trimmed, with blank and `None`
/// meaning absent.
pub fn optional_text(value: &str) -> Option<String> {
    match value.trim() {
        "" | "None" => None,
        s => Some(s.to_string()),
    }
}

/// The labels of the five rows in a transposed ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerField {
    Low,
    High,
    OutDate,
    Notes,
    Returned,
}

impl LedgerField {
    pub const ALL: [LedgerField; 5] = [
        LedgerField::Low,
        LedgerField::High,
        LedgerField::OutDate,
        LedgerField::Notes,
        LedgerField::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerField::Low => "low",
            LedgerField::High => "high",
            LedgerField::OutDate => "outdate",
            LedgerField::Notes => "notes",
            LedgerField::Returned => "returned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(LedgerField::Low),
            "high" => Some(LedgerField::High),
            "outdate" => Some(LedgerField::OutDate),
            "notes" => Some(LedgerField::Notes),
            "returned" => Some(LedgerField::Returned),
            _ => None,
        }
    }

    /// Text form of this field for one row, as written to disk and shown in views.
    pub fn value_of(&self, flask: &FlaskPair) -> String {
        match self {
            LedgerField::Low => flask.low_id.clone(),
            LedgerField::High => flask.high_id.clone().unwrap_or_default(),
            LedgerField::OutDate => flask.ship_date.format("%Y-%m-%d").to_string(),
            LedgerField::Notes => flask.notes.clone().unwrap_or_default(),
            LedgerField::Returned => {
                if flask.returned {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
        }
    }
}

impl std::fmt::Display for LedgerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
