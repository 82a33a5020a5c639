pub mod prompt;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::application::{
    CommandOutcome, LedgerCommand, LedgerError, ReceiveRequest, ShipRequest, StationLedgerSet,
};
use crate::config::{Config, validate_station_name};
use crate::domain::{FlaskPair, StationLedger, StationSummary, format_padded};
use crate::logging::{Verbosity, init_logging};
use crate::storage::LedgerRepository;

use prompt::{Asked, LinePrompter, Prompter, ask_receive, ask_ship, confirm_save};

/// flasktrack - flask pair shipment ledger
#[derive(Parser)]
#[command(name = "flasktrack")]
#[command(about = "Track flask pairs shipped to and received from field stations")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: ./flasktrack.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding one sub-directory per station
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Comma-separated station list, overriding the configuration
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub stations: Option<Vec<String>>,

    /// Load each station from S/S{tag}.csv instead of S/S.csv
    #[arg(short, long, global = true)]
    pub tag: Option<String>,

    /// Log more (repeat for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a station's ledger, or every ledger
    View {
        /// Station tag (omit for all stations)
        station: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a flask pair shipped to a station (asks interactively without a station)
    Ship {
        /// Station tag
        station: Option<String>,

        /// Low flask number of the pair
        low: Option<String>,

        /// High flask number of the pair
        #[arg(long)]
        high: Option<String>,

        /// Date shipped (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Save without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Record a flask pair received back from a station (asks interactively without a station)
    Receive {
        /// Station tag
        station: Option<String>,

        /// Low flask number of the pair
        low: Option<String>,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Save without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Find which stations hold a flask pair
    Search {
        /// Low flask number
        low: String,
    },

    /// Summarize every station: pairs out, weeks since last shipment, flags
    Overview {
        /// Include oldest and newest shipments
        #[arg(short, long)]
        long: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an empty ledger for a new station
    Init {
        /// Station tag
        station: String,
    },

    /// Save every ledger again, renumbering slots
    Save {
        /// Save without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Configuration from file and environment, with command-line overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_from(self.config.clone())?;
        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(stations) = &self.stations {
            config.stations = stations.clone();
        }
        if let Some(tag) = &self.tag {
            config.tag = tag.clone();
        }
        Ok(config)
    }

    pub fn run(self) -> Result<()> {
        init_logging(self.verbosity());
        let config = self.resolve_config()?;
        let today = Local::now().date_naive();
        let mut prompter = LinePrompter::stdio();

        match self.command {
            Commands::Config => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }

            Commands::Init { station } => {
                validate_station_name(&station)?;
                let repo = LedgerRepository::new(&config.data_dir);
                let path = StationLedgerSet::init_station(&repo, &station)?;
                println!("Created empty ledger: {}", path.display());
            }

            command => {
                let mut set = load_ledgers(&config)?;
                run_ledger_command(&mut set, command, today, &mut prompter)?;
            }
        }

        Ok(())
    }
}

fn load_ledgers(config: &Config) -> Result<StationLedgerSet> {
    config.validate()?;
    let repo = LedgerRepository::new(&config.data_dir);
    Ok(StationLedgerSet::load(repo, &config.stations, &config.tag)?)
}

/// Run a command against loaded ledgers. Mutations ask before saving unless
/// `yes` was given.
pub fn run_ledger_command(
    set: &mut StationLedgerSet,
    command: Commands,
    today: NaiveDate,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    match command {
        Commands::View { station, json } => {
            let ledgers = visible_ledgers(set, station.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&ledgers)?);
            } else {
                for ledger in ledgers {
                    println!("{}", ledger);
                }
            }
        }

        Commands::Ship {
            station,
            low,
            high,
            date,
            notes,
            yes,
        } => {
            let request = match station {
                Some(station) => {
                    let low = low.context("A low flask number is required")?;
                    let ship_date = match date {
                        Some(date_str) => parse_date(&date_str)?,
                        None => today,
                    };
                    ShipRequest {
                        station,
                        low_id: low,
                        ship_date,
                        high_id: high,
                        notes,
                    }
                }
                None => match ask_ship(prompter, today)? {
                    Asked::Proceed(request) => request,
                    Asked::Aborted { .. } => {
                        println!("aborted");
                        return Ok(());
                    }
                },
            };
            apply_and_save(set, LedgerCommand::Ship(request), today, yes, prompter)?;
        }

        Commands::Receive {
            station,
            low,
            notes,
            yes,
        } => {
            let request = match station {
                Some(station) => ReceiveRequest {
                    station,
                    low_id: low.context("A low flask number is required")?,
                    notes,
                },
                None => match ask_receive(prompter)? {
                    Asked::Proceed(request) => request,
                    Asked::Aborted { station } => {
                        print_station_or_all(set, &station);
                        println!("aborted");
                        return Ok(());
                    }
                },
            };
            apply_and_save(set, LedgerCommand::Receive(request), today, yes, prompter)?;
        }

        Commands::Search { low } => {
            let found = set.search(&low);
            if found.is_empty() {
                println!("Flask {} is not at any station.", low);
            }
            for ledger in found {
                println!("{}", ledger);
            }
        }

        Commands::Overview { long, json } => {
            let summaries = set.overview(today);
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                write_overview(&mut io::stdout().lock(), &summaries, long)?;
            }
        }

        Commands::Save { yes } => save_with_confirmation(set, today, yes, prompter)?,

        Commands::Init { .. } | Commands::Config => {
            anyhow::bail!("Command does not operate on loaded ledgers")
        }
    }
    Ok(())
}

fn apply_and_save(
    set: &mut StationLedgerSet,
    command: LedgerCommand,
    today: NaiveDate,
    yes: bool,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    let station = command.station().to_string();
    match set.apply(command) {
        Ok(outcome) => {
            match &outcome {
                CommandOutcome::Shipped { station, flask } => {
                    println!("Shipped flask {} to {}", flask.low_id, station)
                }
                CommandOutcome::Received { station, flask } => {
                    println!("Received flask {} from {}", flask.low_id, station)
                }
            }
            println!();
            println!("{}", set.ledger(outcome.station())?);
            save_with_confirmation(set, today, yes, prompter)
        }
        Err(err) if err.is_rejection() => {
            println!("------------ {} ------------", err);
            if let LedgerError::DuplicateActiveFlask { existing, .. } = &err {
                println!(
                    "  existing: low {} high {} shipped {}",
                    existing.low_id,
                    existing.high_id.as_deref().unwrap_or("-"),
                    existing.ship_date
                );
            }
            println!();
            print_station_or_all(set, &station);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn save_with_confirmation(
    set: &StationLedgerSet,
    today: NaiveDate,
    yes: bool,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    if !yes && !confirm_save(prompter)? {
        println!("Not saved.");
        return Ok(());
    }
    for saved in set.save(today)? {
        println!("saved {}", saved.archive_path.display());
        println!("saved {}", saved.current_path.display());
    }
    Ok(())
}

/// The named station's ledger, or every ledger when the name is not configured.
fn visible_ledgers<'a>(set: &'a StationLedgerSet, station: Option<&str>) -> Vec<&'a StationLedger> {
    set.view(station)
        .unwrap_or_else(|_| set.ledgers().iter().collect())
}

fn print_station_or_all(set: &StationLedgerSet, station: &str) {
    for ledger in visible_ledgers(set, Some(station)) {
        println!("{}", ledger);
    }
}

fn write_overview<W: Write>(out: &mut W, summaries: &[StationSummary], long: bool) -> io::Result<()> {
    if long {
        writeln!(
            out,
            "{:<9} {:<6} {:<18} {:<18} {:<7} FLAGS",
            "STATION", "PAIRS", "OLDEST", "NEWEST", "WEEKS"
        )?;
        writeln!(out, "{}", "-".repeat(80))?;
    } else {
        writeln!(out, "{:<9} {:<6} {:<7} FLAGS", "STATION", "PAIRS", "WEEKS")?;
        writeln!(out, "{}", "-".repeat(44))?;
    }

    for summary in summaries {
        let pairs = format_padded(summary.count as f64, true);
        let weeks = format_padded(summary.weeks_since_newest, false);
        if long {
            let describe = |flask: Option<&FlaskPair>| match flask {
                Some(f) => format!("{} {}", f.low_id, f.ship_date),
                None => "n/a".to_string(),
            };
            writeln!(
                out,
                "{:<9} {:<6} {:<18} {:<18} {:<7} {}",
                summary.station,
                pairs,
                describe(summary.oldest.as_ref()),
                describe(summary.newest.as_ref()),
                weeks,
                summary.flag_text()
            )?;
        } else {
            writeln!(
                out,
                "{:<9} {:<6} {:<7} {}",
                summary.station,
                pairs,
                weeks,
                summary.flag_text()
            )?;
        }
    }

    if long {
        writeln!(out)?;
        writeln!(out, "Flask numbers are the low-valued member of each pair.")?;
        writeln!(out, "weeks = weeks since a box was last shipped to the station.")?;
    }
    Ok(())
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))
}
