use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigField, FileFormat};

#[derive(Parser)]
#[command(name = "chatcfg")]
#[command(about = "Inspect and edit the chat client configuration", long_about = None)]
struct Cli {
    /// Directory holding the configuration file
    /// (defaults to $CHATCFG_CONFIG_DIR, then the platform config directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// On-disk format of the configuration file
    #[arg(long, global = true, value_enum, default_value_t = FileFormat::Json)]
    format: FileFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current configuration
    Show {
        /// Print the raw JSON document instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the model catalog
    Models,
    /// Update a single setting
    Set {
        #[arg(value_enum)]
        field: ConfigField,
        value: String,
    },
    /// Restore the default configuration
    Reset,
    /// Migrate a persisted configuration file and print the result
    Migrate {
        /// JSON file holding an envelope ({ "version", "state" })
        file: PathBuf,
        /// Treat the file as a bare state blob at this schema version
        #[arg(long)]
        version: Option<u32>,
    },
}

fn main() -> Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let location = commands::StoreLocation::new(cli.dir, cli.format);

    match cli.command {
        Commands::Show { json } => commands::show::run(&location, json)?,
        Commands::Models => commands::models::run()?,
        Commands::Set { field, value } => commands::set::run(&location, field, &value)?,
        Commands::Reset => commands::reset::run(&location)?,
        Commands::Migrate { file, version } => commands::migrate::run(&file, version)?,
    }

    Ok(())
}
