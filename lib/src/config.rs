use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{ConfigError, Error};

/// Which columns of a kline end up in the exported CSV.
#[derive(
    Debug,
    Default,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnMode {
    /// Open time and OHLCV only.
    #[default]
    Main,
    /// Every kline field except the placeholder, plus a derived `Date`.
    All,
}

/// Settings for a run, usually read from `config.json`.
///
/// Every field is optional in the file and falls back to the defaults below.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Exchange symbols to download data for, e.g. `BTCUSDT`.
    pub symbols: Vec<String>,
    /// Calendar years to download, each exported to its own file.
    pub years: Vec<i32>,
    /// The exchange's kline interval code, e.g. `1m`, `1h`, `1d`.
    pub interval: String,
    /// Whether to export only open time and OHLCV (`main`) or every kline
    /// field plus a derived `Date` (`all`).
    pub columns: ColumnMode,
    /// The folder to save the results. Results will be saved
    /// as `$save_path/ohlc_$symbol_$year_$interval.csv`
    pub save_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbols: vec!["BTCUSDT".to_string()],
            years: vec![2022],
            interval: "1m".to_string(),
            columns: ColumnMode::Main,
            save_path: PathBuf::from("data"),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let config =
            Self::from_json(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}
