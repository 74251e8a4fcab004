//! CLI configuration handling.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use strata_migrate::IndexRequirement;
use strata_sqlite::DEFAULT_HISTORY_TABLE;

use crate::error::{CliError, CliResult};

/// Default config file name (lives in project root)
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Default migrations directory (relative to project root)
pub const MIGRATIONS_DIR: &str = "migrations";

/// Strata CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Migration configuration
    pub migrations: MigrationConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `strata.toml` in `cwd` is
    /// used when present and defaults otherwise.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(CliError::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::load(path)
            }
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    Self::load(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path or SQLite URL
    pub path: Option<String>,

    /// Busy timeout in milliseconds
    pub busy_timeout_ms: Option<u32>,

    /// Keychain service holding the database key
    pub keychain_service: Option<String>,

    /// Keychain account holding the database key
    pub keychain_account: Option<String>,
}

/// Migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory for migration files
    pub directory: PathBuf,

    /// Migration table name
    pub table_name: String,

    /// Reject migration directories that are not in lexicographic order
    pub enforce_order: bool,

    /// Indexes checked by `migrate` and `verify`
    pub required_indexes: Vec<RequiredIndex>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(MIGRATIONS_DIR),
            table_name: DEFAULT_HISTORY_TABLE.to_string(),
            enforce_order: true,
            required_indexes: Vec::new(),
        }
    }
}

/// A `[[migrations.required_indexes]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredIndex {
    /// Table name
    pub table: String,
    /// Index name
    pub index: String,
}

impl From<&RequiredIndex> for IndexRequirement {
    fn from(spec: &RequiredIndex) -> Self {
        IndexRequirement::new(&spec.table, &spec.index)
    }
}
