//! CLI error types and result alias.

use miette::Diagnostic;
use strata_migrate::MigrationError;
use strata_sqlite::SqliteError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(strata::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(strata::config))]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(strata::database))]
    Database(String),

    /// Migration error
    #[error("Migration error: {0}")]
    #[diagnostic(code(strata::migration))]
    Migration(String),

    /// Verification error
    #[error("Verification failed: {0}")]
    #[diagnostic(
        code(strata::verification),
        help("run `strata verify` after repairing the database")
    )]
    Verification(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<MigrationError> for CliError {
    fn from(err: MigrationError) -> Self {
        if err.is_verification() {
            CliError::Verification(err.to_string())
        } else {
            CliError::Migration(err.to_string())
        }
    }
}

impl From<SqliteError> for CliError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::Config(msg) => CliError::Config(msg),
            other => CliError::Database(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Config(format!("Failed to parse TOML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_migrate::Identifier;

    #[test]
    fn test_migration_error_mapping() {
        let err: CliError = MigrationError::ForeignKeyViolations(3).into();
        assert!(matches!(err, CliError::Verification(_)));

        let err: CliError = MigrationError::RollbackNotDefined(Identifier::from("0001_a")).into();
        assert!(matches!(err, CliError::Migration(_)));
        assert!(err.to_string().contains("0001_a"));
    }

    #[test]
    fn test_sqlite_error_mapping() {
        let err: CliError = SqliteError::config("database path is required").into();
        assert!(matches!(err, CliError::Config(_)));

        let err: CliError = SqliteError::corrupt("bad timestamp").into();
        assert!(matches!(err, CliError::Database(_)));
    }
}
