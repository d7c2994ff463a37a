use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Command-line arguments.
///
/// The configuration file is optional; without one the defaults of
/// [`Config`] apply. `--backend` and `--port` override the file.
#[derive(Parser, Debug, Clone)]
#[command(name = "cinelog")]
#[command(version)]
#[command(about = "Track users, movies, favorites and reviews over a JSON API")]
pub struct CliArgs {
    /// Path to the TOML configuration file
    #[arg(env = "CINELOG_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Storage backend, overriding `storage.backend`
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Listening port, overriding `server.port`
    #[arg(long)]
    pub port: Option<u16>,
}

/// Application configuration.
///
/// # Fields Overview
///
/// - `server`: bind address and port of the JSON API
/// - `storage`: selected backend plus the locations of both backends' data
/// - `metadata`: movie metadata provider endpoint, key and timeout
///
/// ```toml
/// [server]
/// bind_address = "0.0.0.0"
/// port = 5000
///
/// [storage]
/// backend = "sqlite"
/// database_path = "data/cinelog.sqlite3"
///
/// [metadata]
/// api_key = "..."
/// timeout_secs = 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metadata: MetadataConfig,
}

impl Config {
    /// Upper bound for the metadata request timeout
    const MAX_TIMEOUT_SECS: u64 = 60;

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the configuration from parsed command-line arguments.
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match args.config_file {
            Some(ref path) => Self::from_file(path)?,
            None => {
                debug!("No configuration file given, using defaults");
                Self::default()
            }
        };
        if let Some(backend) = args.backend {
            config.storage.backend = backend;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "server.port must be between 1 and 65535",
            )));
        }
        self.server.bind_address.parse::<IpAddr>().map_err(|_| {
            ConfigError::InvalidValue(format!(
                "server.bind_address '{}' is not an IP address",
                self.server.bind_address
            ))
        })?;
        if self.metadata.timeout_secs == 0 || self.metadata.timeout_secs > Self::MAX_TIMEOUT_SECS {
            return Err(ConfigError::NotInRange(format!(
                "metadata.timeout_secs must be between 1 and {}",
                Self::MAX_TIMEOUT_SECS
            )));
        }
        if !self.metadata.base_url.starts_with("http://")
            && !self.metadata.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(format!(
                "metadata.base_url '{}' is not an http(s) URL",
                self.metadata.base_url
            )));
        }
        Ok(())
    }
}
