//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Strata CLI - SQLite schema migrations
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "Strata CLI - SQLite schema migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Connection and project options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
///
/// Credentials are handed to the store opener as-is.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Database path or SQLite URL
    #[arg(long, global = true, env = "STRATA_DB_PATH")]
    pub db_path: Option<String>,

    /// Database encryption password (requires SQLCipher)
    #[arg(long, global = true, env = "STRATA_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Keychain service holding the database password
    #[arg(long, global = true)]
    pub keychain_service: Option<String>,

    /// Keychain account holding the database password
    #[arg(long, global = true)]
    pub keychain_account: Option<String>,

    /// Directory containing migration folders
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Path to the config file (defaults to ./strata.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Show migration status
    Status,

    /// Roll back the most recently applied migrations
    Rollback(RollbackArgs),

    /// Run schema verification checks
    Verify,

    /// Write the canonical schema text
    SchemaDump(SchemaDumpArgs),
}

/// Arguments for the `migrate` command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Stop after applying this migration
    #[arg(long, value_name = "ID")]
    pub to: Option<String>,
}

/// Arguments for the `rollback` command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Number of migrations to roll back
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub step: i64,
}

impl Default for RollbackArgs {
    fn default() -> Self {
        Self { step: 1 }
    }
}

/// Arguments for the `schema-dump` command
#[derive(Args, Debug, Default)]
pub struct SchemaDumpArgs {
    /// Write to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_after_subcommand() {
        let cli = Cli::try_parse_from([
            "strata",
            "migrate",
            "--to",
            "0001_create_items",
            "--db-path",
            "app.db",
        ])
        .unwrap();

        assert_eq!(cli.global.db_path.as_deref(), Some("app.db"));
        match cli.command {
            Command::Migrate(args) => assert_eq!(args.to.as_deref(), Some("0001_create_items")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rollback_defaults_to_one_step() {
        let cli = Cli::try_parse_from(["strata", "rollback"]).unwrap();
        match cli.command {
            Command::Rollback(args) => assert_eq!(args.step, 1),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["strata", "rollback", "--step=-2"]).unwrap();
        match cli.command {
            Command::Rollback(args) => assert_eq!(args.step, -2),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_schema_dump_output() {
        let cli = Cli::try_parse_from(["strata", "schema-dump", "-o", "schema.txt"]).unwrap();
        match cli.command {
            Command::SchemaDump(args) => {
                assert_eq!(args.output, Some(PathBuf::from("schema.txt")))
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["strata"]).is_err());
    }
}
