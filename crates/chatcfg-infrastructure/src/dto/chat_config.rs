//! ChatConfig DTOs and migrations

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use chatcfg_core::error::{ConfigError, Result};
use chatcfg_core::schema::{ChatConfig, ModelConfig, SubmitKey, Theme};
use chatcfg_core::validator::{MAX_TOKENS_FALLBACK, MAX_TOKENS_RANGE, clamp_json_number};

/// Entity name the ChatConfig migration path is registered under.
pub const CHAT_CONFIG_ENTITY: &str = "chat_config";

/// Maps an envelope schema version to the DTO version string.
pub fn version_key(schema_version: u32) -> String {
    format!("{}.0.0", schema_version)
}

/// Reads `max_tokens` from any stored number, rounding and clamping it.
///
/// Stores written by other clients hold floats (`2000.0`), negatives and
/// occasionally strings here. Non-numbers become the fallback.
fn lenient_max_tokens<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JsonValue::deserialize(deserializer)?;
    let (min, max) = MAX_TOKENS_RANGE;
    let tokens = clamp_json_number(&raw, min, max, MAX_TOKENS_FALLBACK).round();
    if raw.as_u64().is_none_or(|n| n as f64 != tokens) {
        tracing::debug!("Stored max_tokens {} read as {}", raw, tokens);
    }
    Ok(tokens as u32)
}

// ============================================================================
// V1.0.0
// ============================================================================

/// Model parameters V1.0.0 (request parameters only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfigV1_0 {
    pub model: String,
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_max_tokens")]
    pub max_tokens: u32,
    pub presence_penalty: f64,
}

impl Default for ModelConfigV1_0 {
    fn default() -> Self {
        let defaults = ModelConfig::default();
        Self {
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            presence_penalty: defaults.presence_penalty,
        }
    }
}

/// Chat client configuration V1.0.0.
///
/// Every field is optional: first-generation stores were written field by
/// field, so anything missing takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfigV1_0 {
    pub submit_key: SubmitKey,
    pub avatar: String,
    pub font_size: u32,
    pub theme: Theme,
    pub tight_border: bool,
    pub send_preview_bubble: bool,
    pub sidebar_width: u32,
    pub disable_prompt_hint: bool,
    pub dont_show_mask_splash_screen: bool,
    pub model_config: ModelConfigV1_0,
}

impl Default for ChatConfigV1_0 {
    fn default() -> Self {
        let defaults = ChatConfig::default();
        Self {
            submit_key: defaults.submit_key,
            avatar: defaults.avatar,
            font_size: defaults.font_size,
            theme: defaults.theme,
            tight_border: defaults.tight_border,
            send_preview_bubble: defaults.send_preview_bubble,
            sidebar_width: defaults.sidebar_width,
            disable_prompt_hint: defaults.disable_prompt_hint,
            dont_show_mask_splash_screen: defaults.dont_show_mask_splash_screen,
            model_config: ModelConfigV1_0::default(),
        }
    }
}

// ============================================================================
// V2.0.0
// ============================================================================

/// Model parameters V2.0.0 (added conversation memory settings).
///
/// Unlike V1.0.0 every field is required: a V2.0.0 `modelConfig` is always
/// written whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigV2_0 {
    pub model: String,
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_max_tokens")]
    pub max_tokens: u32,
    pub presence_penalty: f64,
    #[serde(rename = "sendMemory")]
    pub send_memory: bool,
    #[serde(rename = "historyMessageCount")]
    pub history_message_count: u32,
    #[serde(rename = "compressMessageLengthThreshold")]
    pub compress_message_length_threshold: u32,
}

/// Chat client configuration V2.0.0.
///
/// Top-level fields missing from the stored object take their defaults;
/// `modelConfig` is replaced as a whole.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfigV2_0 {
    pub submit_key: SubmitKey,
    pub avatar: String,
    pub font_size: u32,
    pub theme: Theme,
    pub tight_border: bool,
    pub send_preview_bubble: bool,
    pub sidebar_width: u32,
    pub disable_prompt_hint: bool,
    pub dont_show_mask_splash_screen: bool,
    pub model_config: ModelConfigV2_0,
}

/// Type alias for the latest ChatConfig version.
pub type ChatConfigDTO = ChatConfigV2_0;

impl Default for ChatConfigV2_0 {
    fn default() -> Self {
        Self::from_domain(ChatConfig::default())
    }
}

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from ChatConfigV1_0 to ChatConfigV2_0.
///
/// Changes:
/// - Adds `modelConfig.sendMemory` (forced to `true`)
/// - Adds `modelConfig.historyMessageCount` (forced to `4`)
/// - Adds `modelConfig.compressMessageLengthThreshold` (forced to `1000`)
/// - Resets `dontShowMaskSplashScreen` to `false`
impl MigratesTo<ChatConfigV2_0> for ChatConfigV1_0 {
    fn migrate(self) -> ChatConfigV2_0 {
        ChatConfigV2_0 {
            submit_key: self.submit_key,
            avatar: self.avatar,
            font_size: self.font_size,
            theme: self.theme,
            tight_border: self.tight_border,
            send_preview_bubble: self.send_preview_bubble,
            sidebar_width: self.sidebar_width,
            disable_prompt_hint: self.disable_prompt_hint,
            dont_show_mask_splash_screen: false,
            model_config: ModelConfigV2_0 {
                model: self.model_config.model,
                temperature: self.model_config.temperature,
                max_tokens: self.model_config.max_tokens,
                presence_penalty: self.model_config.presence_penalty,
                send_memory: true,
                history_message_count: 4,
                compress_message_length_threshold: 1000,
            },
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert ChatConfigV2_0 DTO to domain model.
impl IntoDomain<ChatConfig> for ChatConfigV2_0 {
    fn into_domain(self) -> ChatConfig {
        ChatConfig {
            submit_key: self.submit_key,
            avatar: self.avatar,
            font_size: self.font_size,
            theme: self.theme,
            tight_border: self.tight_border,
            send_preview_bubble: self.send_preview_bubble,
            sidebar_width: self.sidebar_width,
            disable_prompt_hint: self.disable_prompt_hint,
            dont_show_mask_splash_screen: self.dont_show_mask_splash_screen,
            model_config: ModelConfig {
                model: self.model_config.model,
                temperature: self.model_config.temperature,
                max_tokens: self.model_config.max_tokens,
                presence_penalty: self.model_config.presence_penalty,
                send_memory: self.model_config.send_memory,
                history_message_count: self.model_config.history_message_count,
                compress_message_length_threshold: self
                    .model_config
                    .compress_message_length_threshold,
            },
        }
    }
}

/// Convert domain model to ChatConfigV2_0 DTO for persistence.
impl FromDomain<ChatConfig> for ChatConfigV2_0 {
    fn from_domain(config: ChatConfig) -> Self {
        let model_config = config.model_config;
        ChatConfigV2_0 {
            submit_key: config.submit_key,
            avatar: config.avatar,
            font_size: config.font_size,
            theme: config.theme,
            tight_border: config.tight_border,
            send_preview_bubble: config.send_preview_bubble,
            sidebar_width: config.sidebar_width,
            disable_prompt_hint: config.disable_prompt_hint,
            dont_show_mask_splash_screen: config.dont_show_mask_splash_screen,
            model_config: ModelConfigV2_0 {
                model: model_config.model,
                temperature: model_config.temperature,
                max_tokens: model_config.max_tokens,
                presence_penalty: model_config.presence_penalty,
                send_memory: model_config.send_memory,
                history_message_count: model_config.history_message_count,
                compress_message_length_threshold: model_config.compress_message_length_threshold,
            },
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for ChatConfig entities.
///
/// # Migration Path
///
/// - V1.0.0 → V2.0.0: Backfills memory settings, re-enables the mask splash screen
/// - V2.0.0 → ChatConfig: Converts DTO to domain model
///
/// # Example
///
/// ```ignore
/// let migrator = create_chat_config_migrator()?;
/// let config: ChatConfig = migrator.load_flat_from(CHAT_CONFIG_ENTITY, json_value)?;
/// ```
pub fn create_chat_config_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0 -> V2.0 -> ChatConfig
    let chat_config_path = version_migrate::Migrator::define(CHAT_CONFIG_ENTITY)
        .from::<ChatConfigV1_0>()
        .step::<ChatConfigV2_0>()
        .into_with_save::<ChatConfig>();

    migrator.register(chat_config_path).map_err(|e| {
        ConfigError::migration(format!("Failed to register chat_config migration path: {}", e))
    })?;

    Ok(migrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatcfg_core::schema::CURRENT_SCHEMA_VERSION;
    use serde_json::json;

    fn load(flat: JsonValue) -> ChatConfig {
        let migrator = create_chat_config_migrator().unwrap();
        migrator.load_flat_from(CHAT_CONFIG_ENTITY, flat).unwrap()
    }

    #[test]
    fn test_chat_config_migration_v1_0_to_domain() {
        let config = load(json!({
            "version": "1.0.0",
            "theme": "light",
            "dontShowMaskSplashScreen": true,
            "modelConfig": {
                "model": "gpt-3.5-turbo",
                "temperature": 0.7,
                "max_tokens": 1000,
                "presence_penalty": 1,
                "sendMemory": false,
                "historyMessageCount": 32
            }
        }));

        assert!(config.model_config.send_memory);
        assert_eq!(config.model_config.history_message_count, 4);
        assert_eq!(config.model_config.compress_message_length_threshold, 1000);
        assert!(!config.dont_show_mask_splash_screen);
        // Untouched fields
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.model_config.model, "gpt-3.5-turbo");
        assert_eq!(config.model_config.temperature, 0.7);
        assert_eq!(config.model_config.presence_penalty, 1.0);
    }

    #[test]
    fn test_v1_missing_model_config_gets_defaults() {
        let config = load(json!({ "version": "1.0.0", "fontSize": 16 }));

        assert_eq!(config.font_size, 16);
        assert_eq!(config.model_config, ModelConfig::default());
    }

    #[test]
    fn test_v1_partial_model_config_is_backfilled() {
        let config = load(json!({
            "version": "1.0.0",
            "modelConfig": { "model": "gpt-4" }
        }));

        assert_eq!(config.model_config.model, "gpt-4");
        assert_eq!(config.model_config.temperature, 0.5);
        assert_eq!(config.model_config.max_tokens, 2000);
    }

    #[test]
    fn test_v2_partial_model_config_is_rejected() {
        let migrator = create_chat_config_migrator().unwrap();
        let result: std::result::Result<ChatConfig, _> = migrator.load_flat_from(
            CHAT_CONFIG_ENTITY,
            json!({ "version": "2.0.0", "modelConfig": { "model": "gpt-4o-mini" } }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_max_tokens_is_read_leniently() {
        let cases = [
            (json!(2000.0), 2000),
            (json!(1500.5), 1501),
            (json!(-1), 0),
            (json!(64000), 32000),
            (json!("lots"), 2000),
        ];

        for (stored, expected) in cases {
            let mut flat = serde_json::to_value(ChatConfigDTO::default()).unwrap();
            flat["version"] = json!("2.0.0");
            flat["modelConfig"]["max_tokens"] = stored.clone();

            let config = load(flat);
            assert_eq!(config.model_config.max_tokens, expected, "stored {}", stored);
        }
    }

    #[test]
    fn test_chat_config_save_writes_latest_version() {
        let migrator = create_chat_config_migrator().unwrap();
        let mut config = ChatConfig::default();
        config.avatar = "1f603".to_string();

        let json_str = migrator
            .save_domain_flat(CHAT_CONFIG_ENTITY, config.clone())
            .unwrap();
        let saved: JsonValue = serde_json::from_str(&json_str).unwrap();

        assert_eq!(saved["version"], json!(version_key(CURRENT_SCHEMA_VERSION)));
        assert_eq!(saved["avatar"], json!("1f603"));
        assert_eq!(load(saved), config);
    }

    #[test]
    fn test_version_key() {
        assert_eq!(version_key(1), "1.0.0");
        assert_eq!(version_key(CURRENT_SCHEMA_VERSION), "2.0.0");
    }
}
