use std::env;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::EtlError;

pub const ENV_JSON: &str = "PROPERTY_ETL_JSON";
pub const ENV_MAPPING: &str = "PROPERTY_ETL_MAPPING";
pub const ENV_DB: &str = "PROPERTY_ETL_DB";

const DEFAULT_DB: &str = "properties.sqlite3";

/// What the command line asked for. Anything left unset falls back to the
/// environment (after the `.env` file is loaded), then to defaults.
#[derive(Debug, Default)]
pub struct CliConfig {
    pub json: Option<PathBuf>,
    pub mapping: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub env_file: PathBuf,
    pub progress: bool,
}

/// Resolved, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub json_path: PathBuf,
    pub mapping_path: PathBuf,
    pub db_path: PathBuf,
    pub schema_path: Option<PathBuf>,
    pub show_progress: bool,
}

impl EtlConfig {
    pub fn from_cli(cli: CliConfig) -> Result<Self, EtlError> {
        load_env_file(&cli.env_file)?;

        let json_path = cli
            .json
            .or_else(|| env_path(ENV_JSON))
            .ok_or_else(|| EtlError::Config(format!("no input file: pass --json or set {ENV_JSON}")))?;
        let mapping_path = cli
            .mapping
            .or_else(|| env_path(ENV_MAPPING))
            .ok_or_else(|| {
                EtlError::Config(format!(
                    "no mapping file: pass --mapping or set {ENV_MAPPING}"
                ))
            })?;
        let db_path = cli
            .db
            .or_else(|| env_path(ENV_DB))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));

        Ok(Self {
            json_path,
            mapping_path,
            db_path,
            schema_path: cli.schema,
            show_progress: cli.progress,
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// A missing file is fine (environment only); an unreadable one is not.
fn load_env_file(path: &Path) -> Result<(), EtlError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => {
            debug!("No env file at {}", path.display());
            Ok(())
        }
        Err(e) => Err(EtlError::Config(format!(
            "Failed to load env file {}: {e}",
            path.display()
        ))),
    }
}
