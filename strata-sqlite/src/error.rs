//! Error types for SQLite store operations.

use std::fmt;

use strata_migrate::MigrationError;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug)]
pub enum SqliteError {
    /// SQLite driver error.
    Sqlite(rusqlite::Error),
    /// Configuration error.
    Config(String),
    /// File system error while reading migration files.
    Io(std::io::Error),
    /// Invalid migration directory or file.
    InvalidMigration(String),
    /// Stored bookkeeping data could not be decoded.
    Corrupt(String),
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid migration error.
    pub fn invalid_migration(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Create a corrupt bookkeeping error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl fmt::Display for SqliteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "SQLite error: {}", e),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::InvalidMigration(msg) => write!(f, "Invalid migration: {}", msg),
            Self::Corrupt(msg) => write!(f, "Corrupt bookkeeping: {}", msg),
        }
    }
}

impl std::error::Error for SqliteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for SqliteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl From<std::io::Error> for SqliteError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<SqliteError> for MigrationError {
    fn from(err: SqliteError) -> Self {
        MigrationError::store(err)
    }
}

/// Map a driver error straight into a migration error.
pub(crate) fn store_err(err: rusqlite::Error) -> MigrationError {
    SqliteError::from(err).into()
}
