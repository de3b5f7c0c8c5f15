//! Runtime settings.
//!
//! Everything has a default, so a missing or partial TOML file is fine:
//!
//! ```toml
//! api_base_url = "https://api.worldbank.org/v2"
//! reference_date = { Year = 2021 }
//! flash_duration_ms = 1000
//! geometry_source = "/data/countries.geo.json"
//! ```

use crate::models::DateSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_GEOMETRY_URL: &str =
    "https://raw.githubusercontent.com/johan/world.geo.json/master/countries.geo.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub api_base_url: String,
    pub reference_date: DateSpec,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub retry_backoff_ms: Vec<u64>,
    /// How long a clicked country stays highlighted.
    pub flash_duration_ms: u64,
    /// URL (http/https) or local path of the country GeoJSON.
    pub geometry_source: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.worldbank.org/v2".into(),
            reference_date: DateSpec::default(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            retry_backoff_ms: vec![100, 300, 700],
            flash_duration_ms: 1000,
            geometry_source: DEFAULT_GEOMETRY_URL.into(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    /// `<config dir>/wbi-map/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wbi-map").join("config.toml"))
    }

    /// Explicit path if given (must exist), else the default path if it
    /// exists, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }
}
