//! Failures of the configuration store and its adapters.
//!
//! Invalid user input is not represented here: out-of-range model parameters
//! and unknown models are coerced by the validator.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Encoding that failed to parse or render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DataFormat {
    Json,
    Toml,
}

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ConfigError {
    /// The storage medium failed (read, write, rename).
    #[error("I/O failure: {message}")]
    Io { message: String },

    /// Stored bytes are not a valid document in `format`.
    #[error("Malformed {format} document: {message}")]
    Serialization { format: DataFormat, message: String },

    /// The key-value adapter refused the operation (bad key, lock, value the
    /// format cannot represent).
    #[error("Storage rejected the operation: {0}")]
    Storage(String),

    /// The stored state could not be turned into a complete current config.
    #[error("Cannot migrate stored config: {0}")]
    Migration(String),

    #[error("Stored config uses schema version {found}, this build supports up to {latest}")]
    UnsupportedVersion { found: u32, latest: u32 },

    /// A model catalog definition is inconsistent.
    #[error("Invalid model catalog: {0}")]
    Catalog(String),
}

impl ConfigError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog(message.into())
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    pub fn is_migration(&self) -> bool {
        matches!(self, Self::Migration(_))
    }

    /// True when the stored data is unusable, as opposed to the medium
    /// failing: malformed documents, failed migrations and schema versions
    /// from a newer build.
    pub fn is_corrupt_state(&self) -> bool {
        matches!(
            self,
            Self::Serialization { .. } | Self::Migration(_) | Self::UnsupportedVersion { .. }
        )
    }

    fn malformed(format: DataFormat, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            format,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("{} ({:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(DataFormat::Json, err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::malformed(DataFormat::Toml, err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::malformed(DataFormat::Toml, err)
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
