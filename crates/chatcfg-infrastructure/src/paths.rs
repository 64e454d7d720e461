//! Path resolution for the on-disk configuration store.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/chatcfg/           # Config directory (platform default)
//! └── app-config.json          # Persisted envelope ({ version, state })
//! ```

use std::path::PathBuf;

/// Overrides the platform config directory when set.
pub const CONFIG_DIR_ENV: &str = "CHATCFG_CONFIG_DIR";

const APP_DIR_NAME: &str = "chatcfg";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct ChatcfgPaths;

impl ChatcfgPaths {
    /// Returns the directory holding the persisted configuration.
    ///
    /// `CHATCFG_CONFIG_DIR` wins when set and non-empty; otherwise the
    /// platform config directory (e.g. `~/.config/chatcfg/` on Linux,
    /// `~/Library/Application Support/chatcfg/` on macOS).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::resolve(std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
    }

    fn resolve(override_dir: Option<PathBuf>) -> Result<PathBuf, PathError> {
        match override_dir {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
            _ => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let dir = ChatcfgPaths::resolve(Some(PathBuf::from("/tmp/chatcfg-test"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/chatcfg-test"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        if let Ok(dir) = ChatcfgPaths::resolve(Some(PathBuf::new())) {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }
}
