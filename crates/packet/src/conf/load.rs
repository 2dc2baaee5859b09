//! Load — config loading from file and environment variables.

use std::path::Path;

use super::document;
use super::error::ConfigError;
use super::model::{FilterConfiguration, ReaderConfig};

pub const CONFIG_PATH_VAR: &str = "AIS_READER_CONFIG";
pub const MAX_LINES_VAR: &str = "AIS_MAX_PACKET_LINES";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/aisreader/reader.toml";

impl ReaderConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay environment overrides. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(max) = lookup(MAX_LINES_VAR) {
            match max.trim().parse() {
                Ok(max) => self.max_packet_lines = max,
                Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", MAX_LINES_VAR, max),
            }
        }
    }

    /// Check that values are sane and every filter entry decodes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_packet_lines == 0 {
            return Err(ConfigError::invalid("reader", "max_packet_lines", "must be > 0"));
        }
        self.filter_configurations()?;
        Ok(())
    }

    pub fn filter_configurations(&self) -> Result<Vec<FilterConfiguration>, ConfigError> {
        document::decode_all(&self.filters)
    }
}
