//! Run configuration for the arbitrage simulator.
//!
//! The configuration file is JSON:
//!
//! ```json
//! {
//!     "X": 5,
//!     "Y": 2,
//!     "Z": -150,
//!     "Latencies": { "FutureA": 40000000, "FutureB": 1000000 },
//!     "DataFiles": ["data/FutureA.csv", "data/FutureB.csv"],
//!     "Report": "trades.csv"
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Timestamp;

/// Per-instrument latency in timestamp units. Missing instruments have zero
/// latency.
pub type LatencyMap = HashMap<String, Timestamp>;

/// Main configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Arbitrage strategy parameters.
    #[serde(flatten)]
    pub strategy: StrategyConfig,
    /// Order latency per instrument.
    #[serde(rename = "Latencies", default)]
    pub latencies: LatencyMap,
    /// Quote datasets to replay, in tie-break order.
    #[serde(rename = "DataFiles")]
    pub data_files: Vec<PathBuf>,
    /// Where to write the trade report, if anywhere.
    #[serde(rename = "Report", default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

/// Two-leg arbitrage strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Minimum cross-leg spread to enter (X).
    #[serde(rename = "X")]
    pub entry_spread: f64,
    /// Maximum absolute net quantity per leg (Y).
    #[serde(rename = "Y")]
    pub max_position: f64,
    /// Combined PnL below which both legs are flattened (Z).
    #[serde(rename = "Z")]
    pub stop_loss: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_spread: 5.0,
            max_position: 2.0,
            stop_loss: -150.0,
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.data_files.is_empty() {
            return Err(Error::config("DataFiles must list at least one dataset"));
        }
        if !(self.strategy.max_position >= 0.0) {
            return Err(Error::config(format!(
                "Y must be non-negative, got {}",
                self.strategy.max_position
            )));
        }
        if !self.strategy.entry_spread.is_finite() || !self.strategy.stop_loss.is_finite() {
            return Err(Error::config("X and Z must be finite numbers"));
        }
        Ok(())
    }

    /// Latency configured for `security_id`, zero if absent.
    pub fn latency(&self, security_id: &str) -> Timestamp {
        self.latencies.get(security_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "X": 5,
        "Y": 2,
        "Z": -150,
        "Latencies": { "FutureA": 40000000, "FutureB": 1000000 },
        "DataFiles": ["a.csv", "b.csv"]
    }"#;

    #[test]
    fn test_parse_config() {
        let config = Config::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.strategy.entry_spread, 5.0);
        assert_eq!(config.strategy.max_position, 2.0);
        assert_eq!(config.strategy.stop_loss, -150.0);
        assert_eq!(config.latency("FutureA"), 40_000_000);
        assert_eq!(config.latency("FutureC"), 0);
        assert_eq!(config.data_files, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert!(config.report.is_none());
    }

    #[test]
    fn test_latencies_default_to_empty() {
        let config = Config::from_json_str(r#"{"X": 1, "Y": 1, "Z": -1, "DataFiles": ["a.csv"]}"#)
            .unwrap();
        assert!(config.latencies.is_empty());
    }

    #[test]
    fn test_missing_field_is_config_error() {
        let err = Config::from_json_str(r#"{"X": 1, "Y": 1, "DataFiles": ["a.csv"]}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Z"));
    }

    #[test]
    fn test_empty_data_files_rejected() {
        let err = Config::from_json_str(r#"{"X": 1, "Y": 1, "Z": -1, "DataFiles": []}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negative_max_position_rejected() {
        let err = Config::from_json_str(r#"{"X": 1, "Y": -1, "Z": -1, "DataFiles": ["a.csv"]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Y must be non-negative"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.latency("FutureB"), 1_000_000);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/arbsim.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
