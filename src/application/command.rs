use chrono::NaiveDate;

use crate::domain::{FlaskPair, optional_text};

/// Record that a flask pair left the lab for a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipRequest {
    pub station: String,
    pub low_id: String,
    pub ship_date: NaiveDate,
    pub high_id: Option<String>,
    pub notes: Option<String>,
}

impl ShipRequest {
    pub fn new(station: impl Into<String>, low_id: impl Into<String>, ship_date: NaiveDate) -> Self {
        Self {
            station: station.into(),
            low_id: low_id.into(),
            ship_date,
            high_id: None,
            notes: None,
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

    /// The ledger row this request appends, with every field as it will be
    /// read back from disk.
    pub fn to_flask(&self) -> FlaskPair {
        FlaskPair {
            low_id: self.low_id.trim().to_string(),
            high_id: self.high_id.as_deref().and_then(optional_text),
            ship_date: self.ship_date,
            notes: self.notes.as_deref().and_then(optional_text),
            returned: false,
        }
    }
}

/// Record that a flask pair came back from a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub station: String,
    pub low_id: String,
    pub notes: Option<String>,
}

impl ReceiveRequest {
    pub fn new(station: impl Into<String>, low_id: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            low_id: low_id.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A ledger mutation, as handed over by any front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    Ship(ShipRequest),
    Receive(ReceiveRequest),
}

impl LedgerCommand {
    pub fn station(&self) -> &str {
        match self {
            LedgerCommand::Ship(req) => &req.station,
            LedgerCommand::Receive(req) => &req.station,
        }
    }
}

/// What a successful command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Shipped { station: String, flask: FlaskPair },
    Received { station: String, flask: FlaskPair },
}

impl CommandOutcome {
    pub fn station(&self) -> &str {
        match self {
            CommandOutcome::Shipped { station, .. } | CommandOutcome::Received { station, .. } => {
                station
            }
        }
    }

    pub fn flask(&self) -> &FlaskPair {
        match self {
            CommandOutcome::Shipped { flask, .. } | CommandOutcome::Received { flask, .. } => flask,
        }
    }
}
