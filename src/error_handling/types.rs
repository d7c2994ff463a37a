use std::fmt;

use crate::storage::types::RecordId;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    NotInRange(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    ConnectionFailed,
    WriteFailed,
    ReadFailed,
    NotFound(RecordId),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionFailed => write!(f, "Storage connection failed"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
            StorageError::NotFound(id) => write!(f, "No record with id {}", id),
        }
    }
}

impl std::error::Error for StorageError {}

/// Errors surfaced by the domain repositories.
///
/// `Validation` carries every human-readable message collected for the input,
/// `Rejected` is a business rule refusal (duplicate link, review without
/// favorite, delete of a referenced record).
#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    Validation(Vec<String>),
    NotFound(&'static str),
    Rejected(String),
    Storage(StorageError),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Validation(messages) => {
                write!(f, "Validation failed: {}", messages.join("; "))
            }
            RepositoryError::NotFound(what) => write!(f, "{} not found", what),
            RepositoryError::Rejected(reason) => write!(f, "Rejected: {}", reason),
            RepositoryError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<StorageError> for RepositoryError {
    fn from(err: StorageError) -> Self {
        RepositoryError::Storage(err)
    }
}

#[derive(Debug)]
pub enum MetadataError {
    ClientBuildFailed(String),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::ClientBuildFailed(e) => {
                write!(f, "Metadata client construction failed: {}", e)
            }
        }
    }
}

impl std::error::Error for MetadataError {}

#[derive(Debug)]
pub enum WebError {
    BadBindAddress(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BadBindAddress(e) => write!(f, "Invalid bind address: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    MetadataError(MetadataError),
    WebError(WebError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::MetadataError(e) => write!(f, "Metadata error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<MetadataError> for ControllerError {
    fn from(err: MetadataError) -> Self {
        ControllerError::MetadataError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}
