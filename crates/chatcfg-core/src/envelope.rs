//! The durable representation of a configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::schema::CURRENT_SCHEMA_VERSION;

/// `{ version, state }` as written to the key-value store.
///
/// `state` is kept untyped so blobs written by older schemas can be read and
/// handed to the migration chain. A missing `version` reads as 0 (written
/// before versioning existed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    #[serde(default)]
    pub version: u32,
    pub state: JsonValue,
}

impl PersistedEnvelope {
    pub fn new(version: u32, state: JsonValue) -> Self {
        Self { version, state }
    }

    pub fn from_json(value: JsonValue) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn is_current(&self) -> bool {
        self.version == CURRENT_SCHEMA_VERSION
    }
}
