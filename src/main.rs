//! # Catalog Harvest CLI (`catalog`)
//!
//! One subcommand per phase. Settings come from a TOML file (see
//! `config/catalog.example.toml`); when the file is absent the built-in
//! defaults apply.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog init` | Create the `products` table if absent |
//! | `catalog fetch` | Fetch every id in the id CSV and write batch files |
//! | `catalog load` | Insert every batch file into the `products` table |

use anyhow::Context as _;
use catalog_harvest::{config, ingest, logging, migrate, table_sink};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Catalog Harvest: fetch catalog products, batch them to JSON, load them
/// into SQLite.
#[derive(Parser)]
#[command(name = "catalog", version)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value = "./config/catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the `products` table. Safe to run repeatedly.
    Init,

    /// Fetch every product listed in the id CSV and save batch files.
    Fetch,

    /// Load every `products_<n>.json` batch file into the database.
    Load,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init().context("init logging")?;

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Fetch => {
            let summary = ingest::run_fetch(&cfg).await.context("fetch")?;
            println!("fetch");
            println!("  requested: {}", summary.requested);
            println!("  fetched: {}", summary.fetched);
            println!("  failed: {}", summary.failed);
            println!("  files written: {}", summary.files.len());
            println!("ok");
        }
        Commands::Load => {
            let report = table_sink::run_load(&cfg).await.context("load")?;
            println!("load");
            println!("  files: {}", report.files);
            println!("  inserted: {}", report.inserted);
            println!("  failed: {}", report.failed);
            println!("ok");
        }
    }

    Ok(())
}
