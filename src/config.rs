//! Monitor configuration
//!
//! Loaded from a JSON file in which every field is optional:
//!
//! ```json
//! {
//!   "tick_interval_ms": 2000,
//!   "history_capacity": 20,
//!   "thresholds": { "heart_rate_max": 130 },
//!   "simulator": { "seed": 7, "spike_probability": 0.05 },
//!   "alert": { "model": "gemini-2.0-flash", "language": "es" },
//!   "export_dir": "./sessions"
//! }
//! ```
//!
//! The API key can also come from the `VITALWATCH_API_KEY` environment
//! variable, which takes precedence over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alert::{AlertConfig, API_KEY_ENV};
use crate::monitor::{SimulatorConfig, Thresholds, DEFAULT_HISTORY_CAPACITY};

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
    pub thresholds: Thresholds,
    pub simulator: SimulatorConfig,
    pub alert: AlertConfig,
    /// Write a JSON report here when a session disconnects
    pub export_dir: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            thresholds: Thresholds::default(),
            simulator: SimulatorConfig::default(),
            alert: AlertConfig::default(),
            export_dir: None,
        }
    }
}

impl MonitorConfig {
    /// Read, apply the environment, and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path)?;

        let mut config = Self::from_json(&text)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn apply_env(&mut self) {
        self.apply_api_key(std::env::var(API_KEY_ENV).ok());
    }

    /// Replace the API key unless the override is missing or blank
    pub fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.alert.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be positive".into()));
        }
        let p = self.simulator.spike_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Invalid(format!(
                "spike_probability must be within [0, 1], got {}",
                p
            )));
        }
        if self.thresholds.heart_rate_min >= self.thresholds.heart_rate_max {
            return Err(ConfigError::Invalid(
                "heart_rate_min must be below heart_rate_max".into(),
            ));
        }
        if self.alert.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("alert.base_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Language;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let config = MonitorConfig::from_json("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.history_capacity, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = MonitorConfig::from_json(
            r#"{
                "tick_interval_ms": 500,
                "thresholds": { "spo2_min": 92 },
                "alert": { "language": "fr", "webhook_url": "http://localhost:9000/hook" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.thresholds.spo2_min, 92);
        assert_eq!(config.thresholds.heart_rate_max, 130);
        assert_eq!(config.alert.language, Language::Fr);
        assert_eq!(config.alert.webhook_url.as_deref(), Some("http://localhost:9000/hook"));
        assert_eq!(config.alert.model, AlertConfig::default().model);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = MonitorConfig { tick_interval_ms: 0, ..MonitorConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config = MonitorConfig { history_capacity: 0, ..MonitorConfig::default() };
        assert!(config.validate().is_err());

        config = MonitorConfig::default();
        config.simulator.spike_probability = 1.5;
        assert!(config.validate().is_err());

        config = MonitorConfig::default();
        config.thresholds.heart_rate_min = 140;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_override_ignores_blank() {
        let mut config = MonitorConfig::default();
        config.alert.api_key = Some("from-file".into());

        config.apply_api_key(Some("  ".into()));
        assert_eq!(config.alert.api_key.as_deref(), Some("from-file"));
        config.apply_api_key(None);
        assert_eq!(config.alert.api_key.as_deref(), Some("from-file"));
        config.apply_api_key(Some("from-env".into()));
        assert_eq!(config.alert.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn load_reads_file_and_reports_parse_errors() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{"history_capacity": 5}}"#).unwrap();
        assert_eq!(MonitorConfig::load(good.path()).unwrap().history_capacity, 5);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        assert!(matches!(MonitorConfig::load(bad.path()), Err(ConfigError::Parse(_))));

        assert!(matches!(
            MonitorConfig::load("/nonexistent/vitalwatch.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
