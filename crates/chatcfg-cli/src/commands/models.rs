use anyhow::Result;
use chatcfg_core::ModelCatalog;

pub fn run() -> Result<()> {
    let catalog = ModelCatalog::builtin();

    for entry in catalog.entries() {
        let marker = if entry.name == catalog.default_model() {
            "*"
        } else {
            " "
        };
        let status = if entry.available { "" } else { " (unavailable)" };
        println!("{} {}{}", marker, entry.name, status);
    }

    Ok(())
}
