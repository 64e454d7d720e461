use anyhow::Result;
use chatcfg_infrastructure::CorruptStatePolicy;
use clap::ValueEnum;

use super::{ConfigField, StoreLocation};

pub fn run(location: &StoreLocation, json: bool) -> Result<()> {
    let store = location.open(CorruptStatePolicy::Fail)?;
    let config = store.get();

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let rows: Vec<(String, String)> = ConfigField::value_variants()
        .iter()
        .map(|field| (field.name(), field.describe(&config)))
        .collect();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, value) in rows {
        println!("{:<width$}  {}", name, value, width = width);
    }

    Ok(())
}
