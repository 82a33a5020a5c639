use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FlaskPair, StationLedger};

/// Days assumed since the last shipment when a station has no flasks at all.
/// Large enough that the "fewer pairs than weeks" check always fires.
pub const EMPTY_STATION_DAYS: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationFlag {
    NoFlasks,
    UnderThree,
    FewerThanWeeks,
}

impl StationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationFlag::NoFlasks => "no flasks",
            StationFlag::UnderThree => "under 3",
            StationFlag::FewerThanWeeks => "N < weeks",
        }
    }
}

impl std::fmt::Display for StationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the overview report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub station: String,
    pub count: usize,
    pub oldest: Option<FlaskPair>,
    pub newest: Option<FlaskPair>,
    pub days_since_newest: i64,
    pub weeks_since_newest: f64,
    pub flags: Vec<StationFlag>,
}

impl StationSummary {
    pub fn flag_text(&self) -> String {
        self.flags
            .iter()
            .map(StationFlag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Summarize a station ledger as of `today`.
pub fn summarize(ledger: &StationLedger, today: NaiveDate) -> StationSummary {
    let count = ledger.len();
    let days_since_newest = match ledger.newest() {
        Some(newest) => (today - newest.ship_date).num_days(),
        None => EMPTY_STATION_DAYS,
    };
    let weeks_since_newest = days_since_newest as f64 / 7.0;

    let mut flags = Vec::new();
    if count == 0 {
        flags.push(StationFlag::NoFlasks);
    }
    if count < 3 {
        flags.push(StationFlag::UnderThree);
    }
    if (count as f64) < weeks_since_newest {
        flags.push(StationFlag::FewerThanWeeks);
    }

    StationSummary {
        station: ledger.station().to_string(),
        count,
        oldest: ledger.oldest().cloned(),
        newest: ledger.newest().cloned(),
        days_since_newest,
        weeks_since_newest,
        flags,
    }
}

/// Round to one decimal and pad values in `[0, 10)` with a leading zero.
/// Whole numbers print without a decimal part: 5 -> "05", 3.14 -> "03.1".
pub fn format_padded(value: f64, whole: bool) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    let text = if whole {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded)
    };
    if (0.0..10.0).contains(&rounded) {
        format!("0{}", text)
    } else {
        text
    }
}
