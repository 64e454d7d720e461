use anyhow::{Context, Result};
use chatcfg_infrastructure::CorruptStatePolicy;

use super::StoreLocation;

/// Restores the defaults. A corrupt file is overwritten instead of reported.
pub fn run(location: &StoreLocation) -> Result<()> {
    let store = location.open(CorruptStatePolicy::ResetToDefault)?;
    store.reset();
    // `reset` only logs a failed write; writing again surfaces it as the exit status.
    store.persist().context("Failed to save configuration")?;

    println!("Configuration reset to defaults");
    Ok(())
}
