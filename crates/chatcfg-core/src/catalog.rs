//! Known model identifiers and their availability.
//!
//! The catalog is fixed when it is built. Entries can be declared but marked
//! unavailable, which keeps a model known to the client while preventing it
//! from being selected.
//!
//! # Built-in models
//!
//! | Model ID | Available | Notes |
//! |----------|-----------|-------|
//! | `gpt-4` | no | |
//! | `gpt-4-32k` | no | |
//! | `gpt-4o` | no | |
//! | `gpt-4o-mini` | yes | Default |
//! | `gpt-3.5-turbo` | yes | |
//! | `gpt-3.5-turbo-16k` | yes | |
//! | `deepseek-chat` | yes | |
//! | `deepseek-reasoner` | yes | |

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Model used when a configured model is unknown or disabled.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

static BUILTIN_CATALOG: Lazy<ModelCatalog> = Lazy::new(|| ModelCatalog {
    entries: vec![
        ModelEntry::new("gpt-4", false),
        ModelEntry::new("gpt-4-32k", false),
        ModelEntry::new("gpt-4o", false),
        ModelEntry::new(DEFAULT_MODEL, true),
        ModelEntry::new("gpt-3.5-turbo", true),
        ModelEntry::new("gpt-3.5-turbo-16k", true),
        ModelEntry::new("deepseek-chat", true),
        ModelEntry::new("deepseek-reasoner", true),
    ],
    default_model: DEFAULT_MODEL.to_string(),
});

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub available: bool,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, available: bool) -> Self {
        Self {
            name: name.into(),
            available,
        }
    }
}

/// Ordered, immutable set of models with a default referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
    default_model: String,
}

impl ModelCatalog {
    /// Builds a catalog from `entries`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Catalog` if two entries share a name, or if
    /// `default_model` is not an available entry.
    pub fn new(entries: Vec<ModelEntry>, default_model: impl Into<String>) -> Result<Self> {
        let default_model = default_model.into();

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::catalog(format!(
                    "duplicate model entry '{}'",
                    entry.name
                )));
            }
        }

        match entries.iter().find(|e| e.name == default_model) {
            Some(entry) if entry.available => {}
            Some(_) => {
                return Err(ConfigError::catalog(format!(
                    "default model '{}' is not available",
                    default_model
                )));
            }
            None => {
                return Err(ConfigError::catalog(format!(
                    "default model '{}' is not in the catalog",
                    default_model
                )));
            }
        }

        Ok(Self {
            entries,
            default_model,
        })
    }

    /// Returns the catalog compiled into the client.
    pub fn builtin() -> &'static ModelCatalog {
        &BUILTIN_CATALOG
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns true if `name` is declared and selectable.
    pub fn is_available(&self, name: &str) -> bool {
        self.get(name).is_some_and(|e| e.available)
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Selectable entries in declaration order.
    pub fn available_models(&self) -> impl Iterator<Item = &ModelEntry> {
        self.entries.iter().filter(|e| e.available)
    }
}
