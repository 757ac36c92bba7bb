//! Bootstrap configuration loading
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (each binary's clap `Args`, which also read env vars)
//! 2. TOML configuration file (`--config`, `GEMCAT_CONFIG`, or the platform default)
//! 3. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: the service starts on defaults and
//! logs a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Google Visualization export endpoint for a spreadsheet id
const GVIZ_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Address the catalog API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Upstream request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Tabular data source selection
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout_secs: default_request_timeout_secs(),
            sheet: SheetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Which spreadsheet to read and how often clients poll it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet identifier from the sharing URL
    #[serde(default = "default_source_id")]
    pub source_id: String,

    /// Sub-sheet (tab gid); empty selects the first tab
    #[serde(default)]
    pub sheet_tab: String,

    /// Client poll cadence in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            sheet_tab: String::new(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl SheetConfig {
    /// GViz JSON export URL for this sheet
    ///
    /// # Examples
    ///
    /// ```
    /// use gemcat_common::config::SheetConfig;
    ///
    /// let sheet = SheetConfig {
    ///     source_id: "abc".to_string(),
    ///     sheet_tab: "42".to_string(),
    ///     refresh_interval_ms: 10_000,
    /// };
    /// assert_eq!(
    ///     sheet.export_url(),
    ///     "https://docs.google.com/spreadsheets/d/abc/gviz/tq?tqx=out:json&gid=42"
    /// );
    /// ```
    pub fn export_url(&self) -> String {
        let mut url = format!("{}/{}/gviz/tq?tqx=out:json", GVIZ_BASE_URL, self.source_id);
        if !self.sheet_tab.is_empty() {
            url.push_str("&gid=");
            url.push_str(&self.sheet_tab);
        }
        url
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Reject settings no request could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.source_id.trim().is_empty() {
            return Err(Error::Config("sheet.source_id must not be empty".to_string()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(Error::Config(
                "sheet.refresh_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5780))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_source_id() -> String {
    "1ou9RiO2cUWKbHlEGs1yQ8ayALpYbv7bM".to_string()
}

fn default_refresh_interval_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.sheet.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or the platform default path
    ///
    /// An explicit path that does not exist is an error. A missing default
    /// file falls back to built-in defaults. Nothing is logged here since the
    /// log level comes from the result; call [`ConfigSource::log`] once
    /// tracing is up.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            let config = Self::from_file(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let config = Self::from_file(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            Some(path) => Ok((Self::default(), ConfigSource::MissingDefault(path))),
            None => Ok((Self::default(), ConfigSource::NoConfigDir)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where [`TomlConfig::load`] got its values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Default path had no file; built-in defaults in use
    MissingDefault(PathBuf),
    /// No platform config directory; built-in defaults in use
    NoConfigDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Configuration file: {}", path.display()),
            ConfigSource::MissingDefault(path) => warn!(
                "No config file at {}, using built-in defaults",
                path.display()
            ),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using built-in defaults")
            }
        }
    }
}

/// Platform config file path: `<config_dir>/gemcat/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gemcat").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_without_tab() {
        let sheet = SheetConfig {
            source_id: "xyz".to_string(),
            sheet_tab: String::new(),
            refresh_interval_ms: 1000,
        };
        assert_eq!(
            sheet.export_url(),
            "https://docs.google.com/spreadsheets/d/xyz/gviz/tq?tqx=out:json"
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let sheet = SheetConfig {
            refresh_interval_ms: 0,
            ..Default::default()
        };
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.bind_addr.port(), 5780);
        assert_eq!(config.sheet.refresh_interval_ms, 10_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
