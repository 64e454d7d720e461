pub mod migrate;
pub mod models;
pub mod reset;
pub mod set;
pub mod show;

use anyhow::{Context, Result};
use chatcfg_core::schema::ChatConfig;
use chatcfg_infrastructure::{
    ChatcfgPaths, ConfigStore, CorruptStatePolicy, FileKeyValueStore, StorageFormat, StoreOptions,
};
use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Json,
    Toml,
}

impl From<FileFormat> for StorageFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => StorageFormat::Json,
            FileFormat::Toml => StorageFormat::Toml,
        }
    }
}

/// Settings addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigField {
    SubmitKey,
    Avatar,
    FontSize,
    Theme,
    TightBorder,
    SendPreviewBubble,
    SidebarWidth,
    DisablePromptHint,
    DontShowMaskSplashScreen,
    Model,
    Temperature,
    MaxTokens,
    PresencePenalty,
    SendMemory,
    HistoryMessageCount,
    CompressThreshold,
}

impl ConfigField {
    /// The command-line spelling, e.g. `max-tokens`.
    pub fn name(&self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }

    /// Formats this field's value in `config`.
    pub fn describe(&self, config: &ChatConfig) -> String {
        let model = &config.model_config;
        match self {
            ConfigField::SubmitKey => config.submit_key.to_string(),
            ConfigField::Avatar => config.avatar.clone(),
            ConfigField::FontSize => config.font_size.to_string(),
            ConfigField::Theme => config.theme.to_string(),
            ConfigField::TightBorder => config.tight_border.to_string(),
            ConfigField::SendPreviewBubble => config.send_preview_bubble.to_string(),
            ConfigField::SidebarWidth => config.sidebar_width.to_string(),
            ConfigField::DisablePromptHint => config.disable_prompt_hint.to_string(),
            ConfigField::DontShowMaskSplashScreen => {
                config.dont_show_mask_splash_screen.to_string()
            }
            ConfigField::Model => model.model.clone(),
            ConfigField::Temperature => model.temperature.to_string(),
            ConfigField::MaxTokens => model.max_tokens.to_string(),
            ConfigField::PresencePenalty => model.presence_penalty.to_string(),
            ConfigField::SendMemory => model.send_memory.to_string(),
            ConfigField::HistoryMessageCount => model.history_message_count.to_string(),
            ConfigField::CompressThreshold => model.compress_message_length_threshold.to_string(),
        }
    }
}

/// Where the configuration file lives.
#[derive(Debug, Clone)]
pub struct StoreLocation {
    dir: Option<PathBuf>,
    format: FileFormat,
}

impl StoreLocation {
    pub fn new(dir: Option<PathBuf>, format: FileFormat) -> Self {
        Self { dir, format }
    }

    /// Opens the store, migrating the file if needed.
    pub fn open(&self, on_corrupt: CorruptStatePolicy) -> Result<ConfigStore> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => ChatcfgPaths::config_dir().context("Failed to resolve config directory")?,
        };
        tracing::debug!("Using config directory {:?}", dir);

        let storage = FileKeyValueStore::new(dir.clone()).with_format(self.format.into());
        let options = StoreOptions::default().with_on_corrupt(on_corrupt);

        ConfigStore::init(Arc::new(storage), options)
            .with_context(|| format!("Failed to load configuration from {}", dir.display()))
    }
}
