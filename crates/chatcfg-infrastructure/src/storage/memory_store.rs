//! In-process key-value store.

use chatcfg_core::error::Result;
use chatcfg_core::repository::KeyValueStore;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Keeps values in memory for the lifetime of the process.
///
/// Used for tests and for sessions that must not touch the disk.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `key = value`.
    pub fn with_value(key: impl Into<String>, value: JsonValue) -> Self {
        let store = Self::new();
        store.entries().insert(key.into(), value);
        store
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, JsonValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &JsonValue) -> Result<()> {
        self.entries().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}
