use anyhow::{Context, Result, anyhow};
use chatcfg_core::schema::{ChatConfig, SubmitKey, Theme};
use chatcfg_infrastructure::CorruptStatePolicy;

use super::{ConfigField, StoreLocation};

pub fn run(location: &StoreLocation, field: ConfigField, value: &str) -> Result<()> {
    let store = location.open(CorruptStatePolicy::Fail)?;
    let apply = assignment(field, value, &store.validator())?;

    store.update(apply);
    // `update` only logs a failed write; writing again surfaces it as the exit status.
    store.persist().context("Failed to save configuration")?;

    let stored = field.describe(&store.get());
    if stored != value {
        eprintln!("note: '{}' was stored as '{}'", value, stored);
    }
    println!("{} = {}", field.name(), stored);
    Ok(())
}

type Assignment = Box<dyn FnOnce(&mut ChatConfig)>;

/// Parses `value` for `field` into a mutation.
///
/// Numeric model parameters never fail to parse: anything that is not a
/// number goes through the validator fallback.
fn assignment(
    field: ConfigField,
    value: &str,
    validator: &chatcfg_core::ModelConfigValidator<'_>,
) -> Result<Assignment> {
    let apply: Assignment = match field {
        ConfigField::SubmitKey => {
            let key: SubmitKey = value
                .parse()
                .map_err(|_| anyhow!("Unknown submit key '{}'", value))?;
            Box::new(move |c| c.submit_key = key)
        }
        ConfigField::Avatar => {
            let avatar = value.to_string();
            Box::new(move |c| c.avatar = avatar)
        }
        ConfigField::FontSize => {
            let size = parse_count(field, value)?;
            Box::new(move |c| c.font_size = size)
        }
        ConfigField::Theme => {
            let theme: Theme = value
                .parse()
                .map_err(|_| anyhow!("Unknown theme '{}'", value))?;
            Box::new(move |c| c.theme = theme)
        }
        ConfigField::TightBorder => {
            let flag = parse_flag(field, value)?;
            Box::new(move |c| c.tight_border = flag)
        }
        ConfigField::SendPreviewBubble => {
            let flag = parse_flag(field, value)?;
            Box::new(move |c| c.send_preview_bubble = flag)
        }
        ConfigField::SidebarWidth => {
            let width = parse_count(field, value)?;
            Box::new(move |c| c.sidebar_width = width)
        }
        ConfigField::DisablePromptHint => {
            let flag = parse_flag(field, value)?;
            Box::new(move |c| c.disable_prompt_hint = flag)
        }
        ConfigField::DontShowMaskSplashScreen => {
            let flag = parse_flag(field, value)?;
            Box::new(move |c| c.dont_show_mask_splash_screen = flag)
        }
        ConfigField::Model => {
            let model = validator.model(value);
            Box::new(move |c| c.model_config.model = model)
        }
        ConfigField::Temperature => {
            let temperature = validator.temperature(parse_number(value));
            Box::new(move |c| c.model_config.temperature = temperature)
        }
        ConfigField::MaxTokens => {
            let max_tokens = validator.max_tokens(parse_number(value));
            Box::new(move |c| c.model_config.max_tokens = max_tokens)
        }
        ConfigField::PresencePenalty => {
            let penalty = validator.presence_penalty(parse_number(value));
            Box::new(move |c| c.model_config.presence_penalty = penalty)
        }
        ConfigField::SendMemory => {
            let flag = parse_flag(field, value)?;
            Box::new(move |c| c.model_config.send_memory = flag)
        }
        ConfigField::HistoryMessageCount => {
            let count = parse_count(field, value)?;
            Box::new(move |c| c.model_config.history_message_count = count)
        }
        ConfigField::CompressThreshold => {
            let threshold = parse_count(field, value)?;
            Box::new(move |c| c.model_config.compress_message_length_threshold = threshold)
        }
    };
    Ok(apply)
}

/// Unparseable input becomes NaN, which the validator replaces.
fn parse_number(value: &str) -> f64 {
    value.trim().parse().unwrap_or(f64::NAN)
}

fn parse_count(field: ConfigField, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} expects a non-negative integer", field.name()))
}

fn parse_flag(field: ConfigField, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(anyhow!("{} expects true or false, got '{}'", field.name(), value)),
    }
}
