//! File-backed key-value store.
//!
//! Each key maps to one file inside a directory. Values are handled as
//! `serde_json::Value` (intermediate format) and written as JSON or TOML.

use chatcfg_core::error::Result;
use chatcfg_core::repository::KeyValueStore;
use serde_json::Value as JsonValue;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use super::StorageError;

/// On-disk encoding of stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageFormat {
    #[default]
    Json,
    Toml,
}

impl StorageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Json => "json",
            StorageFormat::Toml => "toml",
        }
    }

    fn decode(&self, content: &str) -> std::result::Result<JsonValue, StorageError> {
        match self {
            StorageFormat::Json => Ok(serde_json::from_str(content)?),
            StorageFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content)?;
                toml_to_json(toml_value)
            }
        }
    }

    fn encode(&self, value: &JsonValue) -> std::result::Result<String, StorageError> {
        match self {
            StorageFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            StorageFormat::Toml => {
                let toml_value = json_to_toml(value)?;
                Ok(toml::to_string_pretty(&toml_value)?)
            }
        }
    }
}

/// A directory of value files, one per key.
///
/// Writes go to a hidden sibling file that is fsynced and then renamed over
/// the target, so a reader sees either the old document or the new one.
/// Concurrent writers (other processes included) serialize on an advisory
/// `<key>.lock` file, which stays in the directory once created. The store knows nothing about what it holds; schema
/// handling lives in [`crate::ConfigStore`].
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
    format: StorageFormat,
}

impl FileKeyValueStore {
    /// Creates a JSON store rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            format: StorageFormat::Json,
        }
    }

    pub fn with_format(mut self, format: StorageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    /// Returns the file backing `key`.
    ///
    /// Keys are restricted to ASCII letters, digits, `-`, `_` and `.` so a key
    /// can never escape the store directory.
    pub fn path_for(&self, key: &str) -> std::result::Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self
            .dir
            .join(format!("{}.{}", key, self.format.extension())))
    }

    /// Lock file guarding writes of `key`. Only call with a validated key.
    fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }

    fn read_value(&self, key: &str) -> std::result::Result<Option<JsonValue>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        match content.trim() {
            "" => Ok(None),
            _ => Ok(Some(self.format.decode(&content)?)),
        }
    }

    fn write_value(&self, key: &str, value: &JsonValue) -> std::result::Result<(), StorageError> {
        let path = self.path_for(key)?;
        let encoded = self.format.encode(value)?;

        fs::create_dir_all(&self.dir)?;
        let _guard = WriteLock::acquire(&self.lock_path(key))?;

        let staging = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            key,
            self.format.extension(),
            std::process::id()
        ));
        let mut file = File::create(&staging)?;
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &path)?;

        tracing::debug!("Saved '{}' to {:?}", key, path);
        Ok(())
    }

    fn remove_value(&self, key: &str) -> std::result::Result<(), StorageError> {
        let path = self.path_for(key)?;
        if !self.dir.exists() {
            return Ok(());
        }
        let _guard = WriteLock::acquire(&self.lock_path(key))?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn load(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(self.read_value(key)?)
    }

    fn save(&self, key: &str, value: &JsonValue) -> Result<()> {
        Ok(self.write_value(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(self.remove_value(key)?)
    }
}

/// Holds an exclusive advisory lock on a lock file until dropped.
///
/// The lock file is never deleted: a writer blocked on the old inode would
/// otherwise run alongside one that created a fresh file.
struct WriteLock {
    _file: File,
}

impl WriteLock {
    fn acquire(path: &Path) -> std::result::Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                StorageError::LockError(format!("{}: {}", path.display(), e))
            })?;
        }

        Ok(Self { _file: file })
    }
}

fn toml_to_json(toml_value: toml::Value) -> std::result::Result<JsonValue, StorageError> {
    Ok(serde_json::to_value(toml_value)?)
}

/// TOML has no null, and its documents must be tables.
fn json_to_toml(json_value: &JsonValue) -> std::result::Result<toml::Value, StorageError> {
    if !json_value.is_object() {
        return Err(StorageError::UnsupportedValue(
            "TOML documents must be objects".to_string(),
        ));
    }
    toml::Value::try_from(json_value)
        .map_err(|e| StorageError::UnsupportedValue(format!("Cannot encode as TOML: {}", e)))
}
