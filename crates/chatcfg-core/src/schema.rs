//! The persisted configuration shape and its defaults.
//!
//! Field names follow the persisted JSON layout (camelCase for UI fields,
//! snake_case for the request parameters forwarded to the model API), so a
//! stored blob can be read without a translation layer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::catalog::DEFAULT_MODEL;

/// Schema version written by this build.
///
/// Bump this and register a `version -> version + 1` migration step whenever
/// the persisted shape changes.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Oldest schema version a migration chain starts from.
pub const FIRST_SCHEMA_VERSION: u32 = 1;

/// Key under which the configuration envelope is stored.
pub const CONFIG_STORE_KEY: &str = "app-config";

/// Key combination that submits the chat input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum SubmitKey {
    #[default]
    #[serde(rename = "Enter")]
    #[strum(to_string = "Enter")]
    Enter,
    #[serde(rename = "Ctrl + Enter")]
    #[strum(to_string = "Ctrl + Enter", serialize = "ctrl-enter")]
    CtrlEnter,
    #[serde(rename = "Shift + Enter")]
    #[strum(to_string = "Shift + Enter", serialize = "shift-enter")]
    ShiftEnter,
    #[serde(rename = "Alt + Enter")]
    #[strum(to_string = "Alt + Enter", serialize = "alt-enter")]
    AltEnter,
    #[serde(rename = "Meta + Enter")]
    #[strum(to_string = "Meta + Enter", serialize = "meta-enter")]
    MetaEnter,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    Auto,
    #[default]
    Dark,
    Light,
}

/// Parameters forwarded with every model invocation.
///
/// `model`, `temperature`, `max_tokens` and `presence_penalty` have domain
/// constraints enforced by [`crate::validator::ModelConfigValidator`]:
///
/// | Field | Range | Fallback on invalid input |
/// |-------|-------|---------------------------|
/// | `model` | available catalog entry | catalog default |
/// | `temperature` | `[0, 1]` | `1` |
/// | `max_tokens` | `[0, 32000]` | `2000` |
/// | `presence_penalty` | `[-2, 2]` | `0` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub presence_penalty: f64,

    /// Send the compressed conversation memory along with the prompt.
    #[serde(rename = "sendMemory")]
    pub send_memory: bool,

    /// Number of recent messages attached to each request.
    #[serde(rename = "historyMessageCount")]
    pub history_message_count: u32,

    /// History length (in characters) above which it gets summarized.
    #[serde(rename = "compressMessageLengthThreshold")]
    pub compress_message_length_threshold: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 2000,
            presence_penalty: 0.0,
            send_memory: true,
            history_message_count: 4,
            compress_message_length_threshold: 1000,
        }
    }
}

/// The full settings aggregate.
///
/// Every field is required on deserialization: a live config is never
/// partially populated. Older or incomplete blobs go through the migration
/// chain, which fills missing top-level fields from [`ChatConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    pub submit_key: SubmitKey,
    /// Emoji code point of the user avatar.
    pub avatar: String,
    pub font_size: u32,
    pub theme: Theme,
    pub tight_border: bool,
    pub send_preview_bubble: bool,
    pub sidebar_width: u32,
    pub disable_prompt_hint: bool,
    /// Skip the mask splash screen when a new chat is created.
    pub dont_show_mask_splash_screen: bool,
    pub model_config: ModelConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            submit_key: SubmitKey::Enter,
            avatar: "1f37b".to_string(),
            font_size: 14,
            theme: Theme::Dark,
            tight_border: false,
            send_preview_bubble: false,
            sidebar_width: 300,
            disable_prompt_hint: false,
            dont_show_mask_splash_screen: false,
            model_config: ModelConfig::default(),
        }
    }
}
