//! Persistence port.

use serde_json::Value as JsonValue;

use crate::error::Result;

/// Durable key-value store holding structurally serializable values.
///
/// The configuration store only ever touches one key; implementations decide
/// the medium and the on-disk format.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if nothing was stored.
    fn load(&self, key: &str) -> Result<Option<JsonValue>>;

    /// Replaces the value stored under `key`.
    fn save(&self, key: &str, value: &JsonValue) -> Result<()>;

    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
