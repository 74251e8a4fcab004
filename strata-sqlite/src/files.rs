//! SQL migration directories on disk.
//!
//! Layout:
//!
//! ```text
//! migrations/
//!   0001_create_items/
//!     up.sql
//!     down.sql      (optional)
//!   0002_create_tags/
//!     up.sql
//! ```
//!
//! Each directory becomes one [`Step`] whose identifier is the directory
//! name. Directories are loaded in name order; loose files are ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strata_migrate::{Identifier, Step};
use tracing::debug;

use crate::error::{SqliteError, SqliteResult};

/// A migration directory read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Directory the migration was read from.
    pub path: PathBuf,
    /// Identifier (the directory name).
    pub identifier: Identifier,
    /// Forward SQL.
    pub up_sql: String,
    /// Reverse SQL, if a `down.sql` exists and is not blank.
    pub down_sql: Option<String>,
    /// SHA-256 of the forward SQL.
    pub checksum: String,
}

impl MigrationFile {
    /// Read one migration directory.
    pub fn read(path: &Path) -> SqliteResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SqliteError::invalid_migration(format!("invalid path: {}", path.display()))
            })?;

        let up_path = path.join("up.sql");
        if !up_path.is_file() {
            return Err(SqliteError::invalid_migration(format!(
                "{} has no up.sql",
                path.display()
            )));
        }
        let up_sql = fs::read_to_string(&up_path)?;

        let down_path = path.join("down.sql");
        let down_sql = if down_path.is_file() {
            Some(fs::read_to_string(&down_path)?).filter(|sql| !sql.trim().is_empty())
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            identifier: Identifier::from(name),
            checksum: hex::encode(Sha256::digest(up_sql.as_bytes())),
            up_sql,
            down_sql,
        })
    }

    /// Source label recorded in bookkeeping.
    pub fn source_label(&self) -> String {
        self.path.display().to_string()
    }

    /// Build a step executing this migration's SQL.
    pub fn into_step(self) -> Step<Connection> {
        let label = self.source_label();
        let up: Arc<str> = self.up_sql.into();

        let step = Step::new(self.identifier, move |conn: &Connection| {
            conn.execute_batch(&up)?;
            Ok(())
        })
        .with_source_label(label);

        match self.down_sql {
            Some(down) => {
                let down: Arc<str> = down.into();
                step.with_rollback(move |conn: &Connection| {
                    conn.execute_batch(&down)?;
                    Ok(())
                })
            }
            None => step,
        }
    }
}

/// A directory of SQL migrations.
#[derive(Debug, Clone)]
pub struct SqlMigrationDir {
    root: PathBuf,
    migrations: Vec<MigrationFile>,
}

impl SqlMigrationDir {
    /// Load every migration directory under `root`, sorted by name.
    pub fn load(root: impl AsRef<Path>) -> SqliteResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SqliteError::invalid_migration(format!(
                "migrations directory not found: {}",
                root.display()
            )));
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();

        let migrations = dirs
            .iter()
            .map(|dir| MigrationFile::read(dir))
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(
            root = %root.display(),
            count = migrations.len(),
            "Loaded SQL migrations"
        );

        Ok(Self {
            root: root.to_path_buf(),
            migrations,
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded migrations in name order.
    pub fn migrations(&self) -> &[MigrationFile] {
        &self.migrations
    }

    /// Convert into executable steps.
    pub fn into_steps(self) -> Vec<Step<Connection>> {
        self.migrations
            .into_iter()
            .map(MigrationFile::into_step)
            .collect()
    }
}
