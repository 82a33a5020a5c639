use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{FlaskPair, ShipConflict};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to load ledger for station {station} from {path}: {source:#}")]
    LoadError {
        station: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Flask number {} is already at {station}", .existing.low_id)]
    DuplicateActiveFlask {
        station: String,
        existing: FlaskPair,
    },

    #[error("No low flask number given for {station}")]
    MissingLowId { station: String },

    #[error("Flask {low_id} is not currently at {station}")]
    FlaskNotPresent { station: String, low_id: String },

    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("Station already has a ledger: {0}")]
    StationExists(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl From<ShipConflict> for LedgerError {
    fn from(conflict: ShipConflict) -> Self {
        match conflict {
            ShipConflict::AlreadyAtStation { station, existing } => {
                LedgerError::DuplicateActiveFlask { station, existing }
            }
            ShipConflict::MissingLowId { station } => LedgerError::MissingLowId { station },
        }
    }
}

impl LedgerError {
    /// True for the rejections a user can cause by asking for the wrong flask;
    /// the ledgers are untouched and the CLI reports them without failing.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::DuplicateActiveFlask { .. }
                | LedgerError::MissingLowId { .. }
                | LedgerError::FlaskNotPresent { .. }
        )
    }

    /// Station the error refers to, if any.
    pub fn station(&self) -> Option<&str> {
        match self {
            LedgerError::LoadError { station, .. }
            | LedgerError::DuplicateActiveFlask { station, .. }
            | LedgerError::MissingLowId { station }
            | LedgerError::FlaskNotPresent { station, .. } => Some(station),
            LedgerError::UnknownStation(station) | LedgerError::StationExists(station) => {
                Some(station)
            }
            LedgerError::Storage(_) => None,
        }
    }
}
