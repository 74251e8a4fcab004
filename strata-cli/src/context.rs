//! Explicit dependency bundle threaded through command dispatch.

use std::path::{Path, PathBuf};

use strata_migrate::{IndexRequirement, Registry, RunnerConfig};
use strata_sqlite::{
    SchemaSnapshot, SqlMigrationDir, SqliteConfig, SqliteRunner, SqliteSchemaSnapshot, SqliteStore,
};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::output::Output;

/// How to reach the database. Credentials are opaque to the CLI and only
/// interpreted by the [`StoreOpener`].
#[derive(Clone, Default)]
pub struct ConnectionOptions {
    /// Database path or SQLite URL
    pub db_path: String,
    /// Database password
    pub password: Option<String>,
    /// Keychain service holding the password
    pub keychain_service: Option<String>,
    /// Keychain account holding the password
    pub keychain_account: Option<String>,
    /// Bookkeeping table name
    pub history_table: String,
    /// Busy timeout in milliseconds
    pub busy_timeout_ms: Option<u32>,
}

impl ConnectionOptions {
    /// Check if keychain credentials were supplied.
    pub fn uses_keychain(&self) -> bool {
        self.keychain_service.is_some() || self.keychain_account.is_some()
    }
}

impl std::fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("db_path", &self.db_path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("keychain_service", &self.keychain_service)
            .field("keychain_account", &self.keychain_account)
            .field("history_table", &self.history_table)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

/// Opens the store a command runs against.
pub trait StoreOpener: Send + Sync {
    /// Open a store for `options`.
    fn open(&self, options: &ConnectionOptions) -> CliResult<SqliteStore>;
}

/// Opens plain or keyed SQLite files.
///
/// The password becomes the SQLCipher key; opening fails with a
/// configuration error against plain SQLite. Keychain lookups are platform
/// specific and need a host-supplied opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStoreOpener;

impl StoreOpener for DefaultStoreOpener {
    fn open(&self, options: &ConnectionOptions) -> CliResult<SqliteStore> {
        if options.uses_keychain() {
            return Err(CliError::config(
                "keychain credentials require a host-supplied store opener; pass --password instead",
            ));
        }

        let mut config =
            SqliteConfig::from_url(&options.db_path)?.history_table(options.history_table.clone());
        if let Some(ms) = options.busy_timeout_ms {
            config = config.busy_timeout(ms);
        }
        if let Some(password) = &options.password {
            config = config.key(password.clone());
        }

        Ok(SqliteStore::open(config)?)
    }
}

/// Everything a command needs: connection options, store opener, runner,
/// optional snapshot provider and the output sink.
pub struct CliContext {
    /// Connection options
    pub connection: ConnectionOptions,
    /// Store opener
    pub opener: Box<dyn StoreOpener>,
    /// Directory the migrations were loaded from
    pub migrations_dir: PathBuf,
    /// Migration runner over the loaded steps
    pub runner: SqliteRunner,
    /// Schema snapshot provider for `schema-dump`
    pub snapshot: Option<Box<dyn SchemaSnapshot>>,
    /// Output sink
    pub out: Output,
}

impl CliContext {
    /// Create a context with the default opener and no snapshot provider.
    pub fn new(
        connection: ConnectionOptions,
        migrations_dir: PathBuf,
        runner: SqliteRunner,
        out: Output,
    ) -> Self {
        Self {
            connection,
            opener: Box::new(DefaultStoreOpener),
            migrations_dir,
            runner,
            snapshot: None,
            out,
        }
    }

    /// Build the context for a CLI run. Flags override config file values.
    pub fn from_args(global: &GlobalArgs, config: &Config, out: Output) -> CliResult<Self> {
        let db_path = global
            .db_path
            .clone()
            .or_else(|| config.database.path.clone())
            .ok_or_else(|| {
                CliError::config(
                    "no database path; pass --db-path or set [database] path in strata.toml",
                )
            })?;

        let connection = ConnectionOptions {
            db_path,
            password: global.password.clone(),
            keychain_service: global
                .keychain_service
                .clone()
                .or_else(|| config.database.keychain_service.clone()),
            keychain_account: global
                .keychain_account
                .clone()
                .or_else(|| config.database.keychain_account.clone()),
            history_table: config.migrations.table_name.clone(),
            busy_timeout_ms: config.database.busy_timeout_ms,
        };

        let dir = global
            .migrations_dir
            .clone()
            .unwrap_or_else(|| config.migrations.directory.clone());
        let runner = load_runner(&dir, config)?;

        let snapshot = SqliteSchemaSnapshot::new(connection.history_table.clone());
        Ok(Self::new(connection, dir, runner, out).with_snapshot(snapshot))
    }

    /// Replace the store opener.
    pub fn with_opener(mut self, opener: impl StoreOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// Set the schema snapshot provider.
    pub fn with_snapshot(mut self, provider: impl SchemaSnapshot + 'static) -> Self {
        self.snapshot = Some(Box::new(provider));
        self
    }

    /// Open the store through the configured opener.
    pub fn open_store(&self) -> CliResult<SqliteStore> {
        self.opener.open(&self.connection)
    }
}

impl std::fmt::Debug for CliContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliContext")
            .field("connection", &self.connection)
            .field("migrations_dir", &self.migrations_dir)
            .field("runner", &self.runner)
            .field("snapshot", &self.snapshot.is_some())
            .field("out", &self.out)
            .finish()
    }
}

fn load_runner(dir: &Path, config: &Config) -> CliResult<SqliteRunner> {
    let migrations = SqlMigrationDir::load(dir)?;
    debug!(
        dir = %dir.display(),
        count = migrations.migrations().len(),
        "Loaded migrations"
    );

    let registry =
        Registry::with_order_enforcement(migrations.into_steps(), config.migrations.enforce_order)?;
    let required = config
        .migrations
        .required_indexes
        .iter()
        .map(IndexRequirement::from)
        .collect();

    Ok(SqliteRunner::new(registry).with_config(RunnerConfig::new().required_indexes(required)))
}
