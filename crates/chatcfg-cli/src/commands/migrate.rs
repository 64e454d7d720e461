use anyhow::{Context, Result};
use chatcfg_core::PersistedEnvelope;
use chatcfg_core::schema::CURRENT_SCHEMA_VERSION;
use chatcfg_infrastructure::dto::version_key;
use chatcfg_infrastructure::migration;
use std::fs;
use std::path::Path;

/// Prints the current-schema configuration for a persisted file. The
/// configured store is not touched.
pub fn run(file: &Path, version: Option<u32>) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let envelope = match version {
        Some(version) => PersistedEnvelope::new(version, document),
        None => PersistedEnvelope::from_json(document)?,
    };

    let start = migration::effective_version(envelope.version)?;
    let steps: Vec<String> = (start..=CURRENT_SCHEMA_VERSION).map(version_key).collect();
    eprintln!("schema versions: {}", steps.join(" -> "));

    let config = migration::migrate_envelope(envelope)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
