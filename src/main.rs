use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

use crate::config::{CliConfig, EtlConfig};
use crate::db::{init_db, init_db_from_file, Database, SCHEMA_SQL};
use crate::errors::EtlError;
use crate::ingest::{count_records, run_batch, BatchSummary, JsonLines};
use crate::mapping::MappingTable;

mod config;
mod db;
mod domain;
mod errors;
mod ingest;
mod mapping;

#[cfg(test)]
mod tests;

/// Load newline-delimited property JSON into the normalized property schema
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file, one JSON object per line [env: PROPERTY_ETL_JSON]
    #[arg(long)]
    json: Option<PathBuf>,

    /// Field mapping CSV (raw_field, target_table, target_column) [env: PROPERTY_ETL_MAPPING]
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// SQLite database file [env: PROPERTY_ETL_DB] [default: properties.sqlite3]
    #[arg(long)]
    db: Option<PathBuf>,

    /// Schema to provision instead of the built-in one
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Environment file to load before resolving settings
    #[arg(long = "env", default_value = ".env")]
    env_file: PathBuf,

    /// Do not draw a progress bar
    #[arg(long)]
    no_progress: bool,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        CliConfig {
            json: cli.json,
            mapping: cli.mapping,
            db: cli.db,
            schema: cli.schema,
            env_file: cli.env_file,
            progress: !cli.no_progress,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match EtlConfig::from_cli(cli.into()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    // Per-record failures are reported in the summary, never in the exit code.
    match run(&config) {
        Ok(summary) => {
            println!(
                "Completed. Total: {}, processed: {}, failed: {}",
                summary.total, summary.processed, summary.failed
            );
            for failure in &summary.failures {
                println!(
                    "  row {} [{}]: {}",
                    failure.line, failure.stage, failure.reason
                );
            }
        }
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    }
}

/// Every fatal check happens before the first record is read.
fn run(config: &EtlConfig) -> Result<BatchSummary, EtlError> {
    let table = MappingTable::load(&config.mapping_path)?;
    if table.is_empty() {
        warn!("Mapping table has no rules; every field will land in property_attribute");
    }

    let mut db = Database::open(&config.db_path)?;
    match &config.schema_path {
        Some(path) => init_db_from_file(&mut db, path)?,
        None => init_db(&mut db, SCHEMA_SQL)?,
    }

    let total = count_records(&config.json_path)?;
    let records = JsonLines::open(&config.json_path)?;
    println!(
        "Loaded {total} records from {}",
        config.json_path.display()
    );

    let bar = if config.show_progress {
        ProgressBar::new(total)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::with_template("Processing [{bar:40}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let summary = run_batch(&mut db, &table, records, |_| bar.inc(1));
    bar.finish_and_clear();

    Ok(summary)
}
