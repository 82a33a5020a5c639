//! Configuration for flasktrack.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! TOML file, then `FLASKTRACK_*` environment variables. Command-line flags
//! are applied last by the CLI.

use std::collections::HashSet;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "flasktrack.toml";

/// Prefix for environment overrides, e.g. `FLASKTRACK_DATA_DIR`.
pub const ENV_PREFIX: &str = "FLASKTRACK_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one sub-directory per station.
    pub data_dir: PathBuf,
    /// Station identifiers, in the order ledgers are loaded and listed.
    pub stations: Vec<String>,
    /// Variant suffix of the file each station is loaded from (`S/S{tag}.csv`).
    pub tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            stations: Vec::new(),
            tag: String::new(),
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        Ok(config)
    }

    /// Check the station list before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stations.is_empty() {
            return Err(ConfigError::Validation {
                message: "no stations configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            validate_station_name(station)?;
            if !seen.insert(station.as_str()) {
                return Err(ConfigError::Validation {
                    message: format!("station listed twice: {station}"),
                });
            }
        }

        if self.tag.contains(['/', '\\']) {
            return Err(ConfigError::Validation {
                message: format!("tag must not contain path separators: {}", self.tag),
            });
        }

        Ok(())
    }
}

/// Station names become directory and file names, so keep them plain.
pub fn validate_station_name(station: &str) -> Result<(), ConfigError> {
    if station.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "station name is empty".to_string(),
        });
    }
    if station.contains(['/', '\\']) || station == "." || station == ".." {
        return Err(ConfigError::Validation {
            message: format!("invalid station name: {station}"),
        });
    }
    Ok(())
}
