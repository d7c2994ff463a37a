use std::path::PathBuf;

use serde::Deserialize;

/// Which storage backend the repositories are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per collection
    File,
    /// SQLite tables through SeaORM
    Sqlite,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1"),
            port: 5000,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Directory holding the JSON collections of the file backend
    pub data_dir: PathBuf,
    /// SQLite file of the relational backend
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            data_dir: PathBuf::from("data"),
            database_path: PathBuf::from("data/cinelog.sqlite3"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Lookup endpoint, queried as `?apikey=<key>&t=<title>`
    pub base_url: String,
    pub api_key: String,
    /// Prefix joined with the provider's external id to build `website`
    pub reference_base_url: String,
    pub timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://www.omdbapi.com/"),
            api_key: String::new(),
            reference_base_url: String::from("https://www.imdb.com/title/"),
            timeout_secs: 5,
        }
    }
}
