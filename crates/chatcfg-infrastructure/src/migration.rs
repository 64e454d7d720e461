//! Envelope boundary of the ChatConfig migration chain.
//!
//! The key-value store holds `{ version, state }` with an integer schema
//! version, while the versioned DTOs in [`crate::dto`] are keyed by semantic
//! version strings. This module translates between the two and runs the
//! `version_migrate` chain.
//!
//! # Architecture
//!
//! ```text
//!   PersistedEnvelope { version: 1, state }
//!              │   version_key(1) = "1.0.0"
//!              V
//!   { "version": "1.0.0", ...state }
//!              │
//!              V
//!   ChatConfigV1_0 → ChatConfigV2_0 → ChatConfig
//! ```
//!
//! # Adding a schema version
//!
//! 1. Bump `CURRENT_SCHEMA_VERSION` in `chatcfg_core::schema`
//! 2. Add `ChatConfigV3_0` and `impl MigratesTo<ChatConfigV3_0> for ChatConfigV2_0`
//! 3. Append `.step::<ChatConfigV3_0>()` in `create_chat_config_migrator()`
//!
//! `test_encode_then_load_current_version` fails until step 3 is done.

use crate::dto::{CHAT_CONFIG_ENTITY, create_chat_config_migrator, version_key};
use chatcfg_core::envelope::PersistedEnvelope;
use chatcfg_core::error::{ConfigError, Result};
use chatcfg_core::schema::{CURRENT_SCHEMA_VERSION, ChatConfig, FIRST_SCHEMA_VERSION};
use serde_json::{Map, Value as JsonValue};

/// Schema version a blob declared as `declared_version` is read at.
///
/// Versions below the first known schema (unversioned blobs) are read as
/// the first schema.
///
/// # Errors
///
/// [`ConfigError::UnsupportedVersion`] when the blob is newer than this build.
pub fn effective_version(declared_version: u32) -> Result<u32> {
    if declared_version > CURRENT_SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedVersion {
            found: declared_version,
            latest: CURRENT_SCHEMA_VERSION,
        });
    }
    if declared_version < FIRST_SCHEMA_VERSION {
        tracing::debug!(
            "Treating ChatConfig version {} as version {}",
            declared_version,
            FIRST_SCHEMA_VERSION
        );
        return Ok(FIRST_SCHEMA_VERSION);
    }
    Ok(declared_version)
}

/// Brings a persisted blob written at `declared_version` to a current
/// [`ChatConfig`].
///
/// - At the current version the blob is not transformed; only `max_tokens`
///   is normalized to a whole token count.
/// - Unversioned blobs are treated as the first schema.
/// - Newer versions fail with [`ConfigError::UnsupportedVersion`].
///
/// # Errors
///
/// Fails if the blob cannot be read as the DTO of its version. A partially
/// shaped config is never returned.
pub fn migrate_chat_config(persisted: JsonValue, declared_version: u32) -> Result<ChatConfig> {
    let version = effective_version(declared_version)?;

    let mut state = match persisted {
        JsonValue::Object(map) => map,
        other if version == FIRST_SCHEMA_VERSION => {
            tracing::warn!("ChatConfig v1 state is not an object ({}), starting empty", other);
            Map::new()
        }
        other => {
            return Err(ConfigError::migration(format!(
                "persisted config state must be an object, got {}",
                other
            )));
        }
    };

    if version == FIRST_SCHEMA_VERSION
        && state.get("modelConfig").is_some_and(|value| !value.is_object())
    {
        tracing::warn!("ChatConfig v1 state has no usable modelConfig, using defaults");
        state.remove("modelConfig");
    }

    state.insert("version".to_string(), JsonValue::String(version_key(version)));

    if version < CURRENT_SCHEMA_VERSION {
        tracing::info!(
            "Migrating ChatConfig {} -> {}",
            version_key(version),
            version_key(CURRENT_SCHEMA_VERSION)
        );
    }

    let migrator = create_chat_config_migrator()?;
    migrator
        .load_flat_from(CHAT_CONFIG_ENTITY, JsonValue::Object(state))
        .map_err(|e| {
            ConfigError::migration(format!(
                "persisted config (version {}) is incomplete after migration: {}",
                declared_version, e
            ))
        })
}

/// [`migrate_chat_config`] applied to an envelope.
pub fn migrate_envelope(envelope: PersistedEnvelope) -> Result<ChatConfig> {
    migrate_chat_config(envelope.state, envelope.version)
}

/// Wraps `config` in an envelope at the current schema version, serialized
/// through the latest DTO.
pub fn encode_chat_config(config: &ChatConfig) -> Result<PersistedEnvelope> {
    let migrator = create_chat_config_migrator()?;
    let json_str = migrator
        .save_domain_flat(CHAT_CONFIG_ENTITY, config.clone())
        .map_err(|e| ConfigError::migration(format!("Failed to serialize ChatConfig: {}", e)))?;

    let mut state: JsonValue = serde_json::from_str(&json_str)?;
    if let Some(fields) = state.as_object_mut() {
        fields.remove("version");
    }
    Ok(PersistedEnvelope::new(CURRENT_SCHEMA_VERSION, state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcfg_core::schema::Theme;
    use serde_json::json;

    fn v1_blob() -> JsonValue {
        json!({
            "submitKey": "Ctrl + Enter",
            "avatar": "1f603",
            "fontSize": 16,
            "theme": "light",
            "tightBorder": true,
            "sendPreviewBubble": true,
            "sidebarWidth": 280,
            "disablePromptHint": false,
            "dontShowMaskSplashScreen": true,
            "modelConfig": {
                "model": "gpt-3.5-turbo",
                "temperature": 0.8,
                "max_tokens": 1500,
                "presence_penalty": 0.5
            }
        })
    }

    #[test]
    fn test_encode_then_load_current_version() {
        let mut config = ChatConfig::default();
        config.sidebar_width = 420;

        let envelope = encode_chat_config(&config).unwrap();
        assert!(envelope.is_current());
        assert!(envelope.state.get("version").is_none());
        assert_eq!(envelope.state["sidebarWidth"], json!(420));

        assert_eq!(migrate_envelope(envelope).unwrap(), config);
    }

    #[test]
    fn test_v1_to_v2() {
        let config = migrate_chat_config(v1_blob(), 1).unwrap();

        assert!(config.model_config.send_memory);
        assert_eq!(config.model_config.history_message_count, 4);
        assert_eq!(config.model_config.compress_message_length_threshold, 1000);
        assert!(!config.dont_show_mask_splash_screen);
        // Preserved user choices
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.font_size, 16);
        assert_eq!(config.model_config.model, "gpt-3.5-turbo");
        assert_eq!(config.model_config.max_tokens, 1500);
    }

    #[test]
    fn test_current_version_passes_through() {
        let mut expected = ChatConfig::default();
        expected.dont_show_mask_splash_screen = true;
        expected.model_config.send_memory = false;
        expected.model_config.history_message_count = 12;
        expected.sidebar_width = 420;

        let blob = serde_json::to_value(&expected).unwrap();
        let config = migrate_chat_config(blob, CURRENT_SCHEMA_VERSION).unwrap();

        assert_eq!(config, expected);
    }

    #[test]
    fn test_current_version_is_not_revalidated() {
        let mut stored = ChatConfig::default();
        stored.model_config.model = "gpt-4".to_string();
        stored.model_config.temperature = 1.5;

        let blob = serde_json::to_value(&stored).unwrap();
        let config = migrate_chat_config(blob, CURRENT_SCHEMA_VERSION).unwrap();

        assert_eq!(config.model_config.model, "gpt-4");
        assert_eq!(config.model_config.temperature, 1.5);
    }

    #[test]
    fn test_non_integer_max_tokens_is_coerced() {
        for (stored, expected) in [
            (json!(2000.0), 2000),
            (json!(1500.5), 1501),
            (json!(-1), 0),
            (json!("2000"), 2000),
        ] {
            let mut blob = serde_json::to_value(ChatConfig::default()).unwrap();
            blob["modelConfig"]["max_tokens"] = stored.clone();

            let config = migrate_chat_config(blob, CURRENT_SCHEMA_VERSION)
                .unwrap_or_else(|e| panic!("max_tokens {} failed: {}", stored, e));
            assert_eq!(config.model_config.max_tokens, expected);
        }

        let mut v1 = v1_blob();
        v1["modelConfig"]["max_tokens"] = json!(999.6);
        assert_eq!(migrate_chat_config(v1, 1).unwrap().model_config.max_tokens, 1000);
    }

    #[test]
    fn test_unversioned_blob_is_treated_as_v1() {
        let config = migrate_chat_config(v1_blob(), 0).unwrap();
        assert!(!config.dont_show_mask_splash_screen);
        assert!(config.model_config.send_memory);
    }

    #[test]
    fn test_missing_top_level_fields_take_defaults() {
        let config = migrate_chat_config(json!({ "fontSize": 18 }), 1).unwrap();
        assert_eq!(config.font_size, 18);
        assert_eq!(config.sidebar_width, 300);
        assert_eq!(config.model_config, ChatConfig::default().model_config);
    }

    #[test]
    fn test_v1_malformed_model_config_gets_defaults() {
        let config = migrate_chat_config(json!({ "modelConfig": "gpt-4" }), 1).unwrap();
        assert_eq!(config.model_config.temperature, 0.5);
        assert!(config.model_config.send_memory);
    }

    #[test]
    fn test_v1_non_object_root_starts_from_defaults() {
        let config = migrate_chat_config(JsonValue::Null, 1).unwrap();
        assert_eq!(config, ChatConfig::default());
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = migrate_chat_config(v1_blob(), CURRENT_SCHEMA_VERSION + 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion { found: 3, latest: 2 }
        ));
    }

    #[test]
    fn test_incomplete_current_model_config_fails_fast() {
        let blob = json!({ "modelConfig": { "model": "gpt-4o-mini" } });
        let err = migrate_chat_config(blob, CURRENT_SCHEMA_VERSION).unwrap_err();
        assert!(err.is_migration());
    }

    #[test]
    fn test_non_object_current_state_fails_fast() {
        let err = migrate_chat_config(json!([1, 2, 3]), CURRENT_SCHEMA_VERSION).unwrap_err();
        assert!(err.is_migration());
    }

    #[test]
    fn test_wrong_field_type_fails_fast() {
        let mut blob = serde_json::to_value(ChatConfig::default()).unwrap();
        blob["theme"] = json!("sepia");
        let err = migrate_chat_config(blob, CURRENT_SCHEMA_VERSION).unwrap_err();
        assert!(err.is_migration());
    }

    #[test]
    fn test_effective_version() {
        assert_eq!(effective_version(0).unwrap(), 1);
        assert_eq!(effective_version(2).unwrap(), 2);
        assert!(effective_version(3).is_err());
    }
}
