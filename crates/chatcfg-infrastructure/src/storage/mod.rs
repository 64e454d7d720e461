//! Key-value store adapters.

mod file_store;
mod memory_store;

pub use file_store::{FileKeyValueStore, StorageFormat};
pub use memory_store::MemoryKeyValueStore;

use chatcfg_core::error::ConfigError;

/// Errors that can occur inside the storage adapters.
#[derive(Debug)]
pub enum StorageError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parse or conversion error.
    JsonError(serde_json::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
    /// Key cannot be mapped to a file name.
    InvalidKey(String),
    /// Value cannot be represented in the configured format.
    UnsupportedValue(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(e) => write!(f, "I/O error: {}", e),
            StorageError::JsonError(e) => write!(f, "JSON error: {}", e),
            StorageError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            StorageError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            StorageError::LockError(e) => write!(f, "Lock error: {}", e),
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: '{}'", key),
            StorageError::UnsupportedValue(e) => write!(f, "Unsupported value: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::IoError(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::JsonError(e)
    }
}

impl From<toml::de::Error> for StorageError {
    fn from(e: toml::de::Error) -> Self {
        StorageError::TomlParseError(e)
    }
}

impl From<toml::ser::Error> for StorageError {
    fn from(e: toml::ser::Error) -> Self {
        StorageError::TomlSerError(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::IoError(e) => e.into(),
            StorageError::JsonError(e) => e.into(),
            StorageError::TomlParseError(e) => e.into(),
            StorageError::TomlSerError(e) => e.into(),
            other => ConfigError::storage(other.to_string()),
        }
    }
}
