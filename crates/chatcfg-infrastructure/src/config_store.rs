//! The live, observable chat configuration.
//!
//! `ConfigStore` owns the current [`ChatConfig`], loads it once at
//! construction (migrating older persisted shapes), and writes every change
//! through to a [`KeyValueStore`] before notifying subscribers.

use crate::migration;
use chatcfg_core::catalog::ModelCatalog;
use chatcfg_core::envelope::PersistedEnvelope;
use chatcfg_core::error::Result;
use chatcfg_core::observer::{ChangeCallback, ConfigObservers, SubscriptionId};
use chatcfg_core::repository::KeyValueStore;
use chatcfg_core::schema::{CONFIG_STORE_KEY, ChatConfig, ModelConfig};
use chatcfg_core::validator::ModelConfigValidator;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// What `ConfigStore::init` does when the persisted state is unusable
/// (unparseable, incomplete after migration, or from a newer schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptStatePolicy {
    /// Return the error from `init`.
    #[default]
    Fail,
    /// Log a warning, start from the defaults and overwrite the stored value.
    ResetToDefault,
}

/// Construction options for [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage key holding the envelope.
    pub key: String,
    /// Run model parameters through [`ModelConfigValidator::sanitize`] before
    /// every `update` commit.
    pub validate_on_commit: bool,
    pub on_corrupt: CorruptStatePolicy,
    /// Catalog used to resolve model names.
    pub catalog: Arc<ModelCatalog>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: CONFIG_STORE_KEY.to_string(),
            validate_on_commit: true,
            on_corrupt: CorruptStatePolicy::Fail,
            catalog: Arc::new(ModelCatalog::builtin().clone()),
        }
    }
}

impl StoreOptions {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_validate_on_commit(mut self, validate: bool) -> Self {
        self.validate_on_commit = validate;
        self
    }

    pub fn with_on_corrupt(mut self, policy: CorruptStatePolicy) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn with_catalog(mut self, catalog: ModelCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }
}

/// Owner of the live chat configuration.
///
/// Readers get clones; writers pass a mutator that runs on a private working
/// copy, so a half-applied change is never visible. `update` and `reset` are
/// serialized by a writer lock and never fail: persistence errors are logged
/// and the in-memory state stays authoritative for the process.
///
/// # Example
///
/// ```ignore
/// let storage = Arc::new(FileKeyValueStore::new(ChatcfgPaths::config_dir()?));
/// let store = ConfigStore::init(storage, StoreOptions::default())?;
///
/// store.subscribe(Arc::new(|| println!("settings changed")));
/// store.update(|config| config.model_config.temperature = 0.2);
/// assert_eq!(store.get().model_config.temperature, 0.2);
/// ```
pub struct ConfigStore {
    storage: Arc<dyn KeyValueStore>,
    options: StoreOptions,
    state: RwLock<ChatConfig>,
    /// Serializes `update`/`reset`.
    writer: Mutex<()>,
    observers: ConfigObservers,
}

impl ConfigStore {
    /// Loads the persisted configuration and returns a ready store.
    ///
    /// - Nothing stored: starts from `ChatConfig::default()` and writes it.
    /// - Older schema: migrates, then writes back at the current version.
    /// - Current schema: used as stored.
    ///
    /// # Errors
    ///
    /// Storage read failures, and unusable persisted state when
    /// `options.on_corrupt` is [`CorruptStatePolicy::Fail`].
    pub fn init(storage: Arc<dyn KeyValueStore>, options: StoreOptions) -> Result<Self> {
        let (config, needs_write) = match Self::load(storage.as_ref(), &options.key) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => {
                tracing::info!(
                    "No persisted config under '{}', starting from defaults",
                    options.key
                );
                (ChatConfig::default(), true)
            }
            Err(e)
                if e.is_corrupt_state()
                    && options.on_corrupt == CorruptStatePolicy::ResetToDefault =>
            {
                tracing::warn!(
                    "Persisted config under '{}' is unusable ({}), resetting to defaults",
                    options.key,
                    e
                );
                (ChatConfig::default(), true)
            }
            Err(e) => return Err(e),
        };

        let store = Self {
            storage,
            options,
            state: RwLock::new(config),
            writer: Mutex::new(()),
            observers: ConfigObservers::new(),
        };

        if needs_write {
            if let Err(e) = store.write_through() {
                tracing::warn!("Failed to write initial config: {}", e);
            }
        }

        Ok(store)
    }

    /// Reads and migrates the stored envelope.
    ///
    /// The flag is true when the stored value is not at the current version.
    fn load(storage: &dyn KeyValueStore, key: &str) -> Result<Option<(ChatConfig, bool)>> {
        let Some(raw) = storage.load(key)? else {
            return Ok(None);
        };

        let envelope = PersistedEnvelope::from_json(raw)?;
        let migrated = !envelope.is_current();
        if migrated {
            tracing::info!(
                "Persisted config under '{}' is at version {}, migrating",
                key,
                envelope.version
            );
        }

        let config = migration::migrate_envelope(envelope)?;
        Ok(Some((config, migrated)))
    }

    /// Returns a snapshot of the current configuration.
    pub fn get(&self) -> ChatConfig {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn model_config(&self) -> ModelConfig {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .model_config
            .clone()
    }

    /// Replaces the configuration with the defaults.
    ///
    /// The stored value is removed before the defaults are written, so a
    /// failed write leaves nothing behind rather than the old settings.
    pub fn reset(&self) {
        {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = self.storage.remove(&self.options.key) {
                tracing::warn!(
                    "Failed to clear persisted config under '{}': {}",
                    self.options.key,
                    e
                );
            }
            self.commit(ChatConfig::default());
        }
        self.observers.notify();
    }

    /// Applies `mutator` to a working copy and commits it.
    ///
    /// With `validate_on_commit` the model name, temperature, max_tokens and
    /// presence_penalty are coerced into their domains before the commit,
    /// but only when the mutator changed them. The mutator must not call
    /// back into this store.
    pub fn update<F>(&self, mutator: F)
    where
        F: FnOnce(&mut ChatConfig),
    {
        {
            let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

            let before = self.get();
            let mut working = before.clone();
            mutator(&mut working);

            if self.options.validate_on_commit {
                working.model_config = self
                    .validator()
                    .sanitize_changes(&before.model_config, working.model_config);
            }

            self.commit(working);
        }
        self.observers.notify();
    }

    /// Writes the current configuration at the current schema version.
    ///
    /// `update` and `reset` already write through and only log failures;
    /// call this to retry the write or to observe its error.
    pub fn persist(&self) -> Result<()> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_through()
    }

    /// Saves the live state. Callers hold the writer lock, or own the store
    /// exclusively.
    fn write_through(&self) -> Result<()> {
        let envelope = migration::encode_chat_config(&self.get())?;
        self.storage.save(&self.options.key, &envelope.to_json()?)
    }

    /// Registers a callback run after every committed `update`/`reset`.
    pub fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn validator(&self) -> ModelConfigValidator<'_> {
        ModelConfigValidator::new(&self.options.catalog)
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.options.catalog
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Swaps in `config` as the live state, then writes it through.
    ///
    /// Callers hold the writer lock.
    fn commit(&self, config: ChatConfig) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = config;

        if let Err(e) = self.write_through() {
            tracing::warn!(
                "Failed to persist config under '{}', keeping in-memory state: {}",
                self.options.key,
                e
            );
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("options", &self.options)
            .field("state", &self.get())
            .field("observers", &self.observers)
            .finish()
    }
}
