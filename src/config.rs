//! Picker configuration.
//!
//! Layered: built-in defaults, then `~/.solarpin/config.json` (or an
//! explicit path), then `SOLARPIN_*` environment variables (a `.env` file
//! is honoured). Command-line flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::location::providers::{DEFAULT_GEOCODER_URL, DEFAULT_GEOLOCATION_URL, DEFAULT_USER_AGENT};
use crate::map::{MapOptions, MarkerIcon, MAX_SUPPORTED_ZOOM};
use crate::picker::search::DEFAULT_SUGGESTION_LIMIT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: '{value}'")]
    Env { key: &'static str, value: String },
    #[error("{field} must be at most {max}, got {value}")]
    ZoomOutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub geocoder_url: String,
    pub geolocation_url: String,
    pub user_agent: String,
    pub suggestion_limit: usize,
    pub debounce_ms: u64,
    /// Zoom applied when a searched, picked or located place is selected.
    pub selection_zoom: u8,
    pub map: MapOptions,
    pub marker_icon: MarkerIcon,
    /// Use the built-in gazetteer and disable IP geolocation.
    pub offline: bool,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            geocoder_url: DEFAULT_GEOCODER_URL.into(),
            geolocation_url: DEFAULT_GEOLOCATION_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            debounce_ms: 250,
            selection_zoom: 18,
            map: MapOptions::default(),
            marker_icon: MarkerIcon::default(),
            offline: false,
        }
    }
}

impl PickerConfig {
    /// Defaults, the user config file if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but with an explicit file that must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".solarpin")
            .join("config.json")
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zoom levels no tile pyramid can address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("map.zoom", self.map.zoom),
            ("map.max_zoom", self.map.max_zoom),
            ("selection_zoom", self.selection_zoom),
        ] {
            if value > MAX_SUPPORTED_ZOOM {
                return Err(ConfigError::ZoomOutOfRange {
                    field,
                    value,
                    max: MAX_SUPPORTED_ZOOM,
                });
            }
        }
        Ok(())
    }

    /// Overlay `SOLARPIN_*` variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("SOLARPIN_GEOCODER_URL") {
            self.geocoder_url = v;
        }
        if let Some(v) = lookup("SOLARPIN_GEOLOCATION_URL") {
            self.geolocation_url = v;
        }
        if let Some(v) = lookup("SOLARPIN_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("SOLARPIN_DEBOUNCE_MS") {
            self.debounce_ms = v.trim().parse().map_err(|_| ConfigError::Env {
                key: "SOLARPIN_DEBOUNCE_MS",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("SOLARPIN_OFFLINE") {
            self.offline = match v.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::Env {
                        key: "SOLARPIN_OFFLINE",
                        value: v,
                    })
                }
            };
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
