use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{StationLedger, StationSummary, summarize, validate_ship};
use crate::storage::{LedgerRepository, SavedLedger};

use super::{CommandOutcome, LedgerCommand, LedgerError, ReceiveRequest, ShipRequest};

/// The ledgers of every configured station, plus the snapshot taken at load.
///
/// This is the primary interface for any front end. Mutations only touch
/// memory; nothing reaches disk until [`StationLedgerSet::save`] is called.
#[derive(Debug)]
pub struct StationLedgerSet {
    repo: LedgerRepository,
    ledgers: Vec<StationLedger>,
    original: Vec<StationLedger>,
}

impl StationLedgerSet {
    /// Build a set from ledgers already in memory. They become the snapshot.
    pub fn new(repo: LedgerRepository, ledgers: Vec<StationLedger>) -> Self {
        let original = ledgers.clone();
        Self {
            repo,
            ledgers,
            original,
        }
    }

    /// Load every station in `stations`, in that order, from `S/S{tag}.csv`.
    ///
    /// Fails on the first station whose file is missing or malformed.
    pub fn load<S: AsRef<str>>(
        repo: LedgerRepository,
        stations: &[S],
        tag: &str,
    ) -> Result<Self, LedgerError> {
        let mut ledgers = Vec::with_capacity(stations.len());
        for station in stations {
            let station = station.as_ref();
            let ledger = repo
                .load(station, tag)
                .map_err(|source| LedgerError::LoadError {
                    station: station.to_string(),
                    path: repo.load_path(station, tag),
                    source,
                })?;
            ledgers.push(ledger);
        }
        info!(stations = ledgers.len(), tag, "loaded station ledgers");
        Ok(Self::new(repo, ledgers))
    }

    pub fn repository(&self) -> &LedgerRepository {
        &self.repo
    }

    pub fn stations(&self) -> impl Iterator<Item = &str> {
        self.ledgers.iter().map(StationLedger::station)
    }

    pub fn ledgers(&self) -> &[StationLedger] {
        &self.ledgers
    }

    /// The ledgers exactly as they were loaded.
    pub fn original(&self) -> &[StationLedger] {
        &self.original
    }

    pub fn ledger(&self, station: &str) -> Result<&StationLedger, LedgerError> {
        Ok(&self.ledgers[self.index(station)?])
    }

    fn index(&self, station: &str) -> Result<usize, LedgerError> {
        self.ledgers
            .iter()
            .position(|ledger| ledger.station() == station)
            .ok_or_else(|| LedgerError::UnknownStation(station.to_string()))
    }

    // ========================
    // Queries
    // ========================

    /// Ledgers to display: one station, or all of them when `station` is `None`.
    pub fn view(&self, station: Option<&str>) -> Result<Vec<&StationLedger>, LedgerError> {
        match station {
            Some(name) => Ok(vec![self.ledger(name)?]),
            None => Ok(self.ledgers.iter().collect()),
        }
    }

    /// Every station ledger holding a row with this low id.
    pub fn search(&self, low_id: &str) -> Vec<&StationLedger> {
        self.ledgers
            .iter()
            .filter(|ledger| ledger.contains(low_id))
            .collect()
    }

    /// One summary per station, in configured order, as of `today`.
    pub fn overview(&self, today: NaiveDate) -> Vec<StationSummary> {
        self.ledgers
            .iter()
            .map(|ledger| summarize(ledger, today))
            .collect()
    }

    /// Stations whose live ledger no longer matches the load-time snapshot.
    pub fn changed_stations(&self) -> Vec<&str> {
        self.ledgers
            .iter()
            .zip(&self.original)
            .filter(|(live, original)| live != original)
            .map(|(live, _)| live.station())
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.changed_stations().is_empty()
    }

    // ========================
    // Mutations
    // ========================

    pub fn apply(&mut self, command: LedgerCommand) -> Result<CommandOutcome, LedgerError> {
        match command {
            LedgerCommand::Ship(request) => self.ship(request),
            LedgerCommand::Receive(request) => self.receive(request),
        }
    }

    /// Append a new row for a flask pair sent to a station.
    ///
    /// Rejected without changes if the low id is already at the station.
    pub fn ship(&mut self, request: ShipRequest) -> Result<CommandOutcome, LedgerError> {
        let i = self.index(&request.station)?;
        let flask = request.to_flask();

        if let Err(conflict) = validate_ship(&flask.low_id, &self.ledgers[i], &self.original[i]) {
            warn!(station = %request.station, low_id = %flask.low_id, "ship rejected: {}", conflict);
            return Err(conflict.into());
        }

        self.ledgers[i].append(flask.clone());
        info!(
            station = %request.station,
            low_id = %flask.low_id,
            ship_date = %flask.ship_date,
            "shipped flask pair"
        );

        Ok(CommandOutcome::Shipped {
            station: request.station,
            flask,
        })
    }

    /// Remove the row of a flask pair that came back from a station.
    ///
    /// Rejected without changes if the low id is not currently there.
    pub fn receive(&mut self, request: ReceiveRequest) -> Result<CommandOutcome, LedgerError> {
        let i = self.index(&request.station)?;
        let low_id = request.low_id.trim();

        let mut removed = self.ledgers[i].remove(low_id);
        if removed.is_empty() {
            warn!(station = %request.station, low_id, "receive rejected: not at station");
            return Err(LedgerError::FlaskNotPresent {
                station: request.station,
                low_id: low_id.to_string(),
            });
        }
        if removed.len() > 1 {
            warn!(
                station = %request.station,
                low_id,
                count = removed.len(),
                "removed duplicate rows for one flask pair"
            );
        }

        info!(
            station = %request.station,
            low_id,
            notes = request.notes.as_deref().unwrap_or(""),
            "received flask pair"
        );

        Ok(CommandOutcome::Received {
            station: request.station,
            flask: removed.remove(0),
        })
    }

    // ========================
    // Persistence
    // ========================

    /// Write every ledger to its dated archive and current file.
    ///
    /// Stations are written one at a time; a failure leaves earlier stations
    /// saved and later ones untouched.
    pub fn save(&self, today: NaiveDate) -> Result<Vec<SavedLedger>, LedgerError> {
        let mut saved = Vec::with_capacity(self.ledgers.len());
        for ledger in &self.ledgers {
            saved.push(self.repo.save(ledger, today)?);
        }
        debug!(stations = saved.len(), "saved all ledgers");
        Ok(saved)
    }

    /// Create an empty ledger file for a station that has none yet.
    pub fn init_station(repo: &LedgerRepository, station: &str) -> Result<PathBuf, LedgerError> {
        if repo.exists(station) {
            return Err(LedgerError::StationExists(station.to_string()));
        }
        Ok(repo.create(station)?)
    }
}
