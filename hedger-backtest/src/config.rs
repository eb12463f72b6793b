//! TOML configuration for the command-line runner.
//!
//! ```toml
//! [backtest]
//! start_date = "2023-01-01"
//! maturity_date = "2023-06-01"
//! quantity = 100
//! risk_free_rate = 0.05
//! strike = 150.0
//! rebalance_freq = 12
//!
//! [data]
//! prices = "data/AAPL.csv"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::BacktestConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Price file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV or Parquet file with daily closes.
    #[serde(default)]
    pub prices: Option<PathBuf>,

    #[serde(default = "default_date_column")]
    pub date_column: String,

    #[serde(default = "default_close_column")]
    pub close_column: String,
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_close_column() -> String {
    "close".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prices: None,
            date_column: default_date_column(),
            close_column: default_close_column(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backtest: BacktestConfig,

    #[serde(default)]
    pub data: DataConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
