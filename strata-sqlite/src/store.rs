//! SQLite-backed migration store.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use strata_migrate::{
    AppliedStep, Identifier, IntegrityProbe, MigrateResult, MigrationStore,
};
use tracing::{debug, info};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult, store_err};
use crate::history::{AppliedRecord, HistoryTable};
use crate::integrity::SqliteProbe;
use crate::snapshot::SchemaSnapshot;

/// A migration store over a single SQLite connection.
///
/// The connection sits behind a mutex, so writes from concurrent callers
/// queue up one at a time. Each [`MigrationStore::write`] call is one
/// `BEGIN IMMEDIATE` transaction; [`MigrationStore::read`] uses a deferred
/// transaction that is always rolled back.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    config: SqliteConfig,
    history: HistoryTable,
}

/// SQLCipher answers `PRAGMA cipher_version`; plain SQLite returns no row.
fn ensure_cipher_support(conn: &Connection) -> SqliteResult<()> {
    let version: Option<String> = conn
        .query_row("PRAGMA cipher_version", [], |row| row.get(0))
        .optional()?;
    match version {
        Some(version) => {
            debug!(cipher_version = %version, "Encryption key applied");
            Ok(())
        }
        None => Err(SqliteError::config(
            "an encryption key was supplied but SQLite was built without SQLCipher",
        )),
    }
}

impl SqliteStore {
    /// Open a store with the given configuration.
    ///
    /// When a key is configured it is issued before any other statement.
    /// Plain SQLite ignores `PRAGMA key`, so a key fails with
    /// [`SqliteError::Config`](crate::SqliteError::Config) unless the linked
    /// library is SQLCipher.
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory()?,
            DatabasePath::File(path) => Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?,
        };

        if let Some(key) = &config.key {
            conn.pragma_update(None, "key", key)?;
            ensure_cipher_support(&conn)?;
        }

        let init_sql = config.init_sql();
        debug!(sql = %init_sql, "Initializing SQLite connection");
        conn.execute_batch(&init_sql)?;

        info!(path = %config.path_str(), "Opened SQLite store");

        Ok(Self {
            history: HistoryTable::new(config.history_table.clone()),
            conn: Mutex::new(conn),
            config,
        })
    }

    /// Open a fresh in-memory store with default settings.
    pub fn in_memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory())
    }

    /// Open a store from a URL (see [`SqliteConfig::from_url`]).
    pub fn from_url(url: &str) -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_url(url)?)
    }

    /// Store configuration.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Bookkeeping table accessor.
    pub fn history(&self) -> &HistoryTable {
        &self.history
    }

    /// Full bookkeeping rows ordered by identifier.
    pub fn applied_records(&self) -> MigrateResult<Vec<AppliedRecord>> {
        self.read(|conn| Ok(self.history.records(conn)?))
    }

    /// Render the schema with `provider` inside a read snapshot.
    pub fn schema_snapshot(&self, provider: &dyn SchemaSnapshot) -> MigrateResult<String> {
        self.read(|conn| Ok(provider.snapshot(conn)?))
    }

    /// Run `f` with direct access to the connection, outside any transaction.
    pub fn with_connection<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Connection) -> T,
    {
        f(&*self.conn.lock())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("history_table", &self.history.name())
            .finish()
    }
}

impl MigrationStore for SqliteStore {
    type Conn = Connection;

    fn write<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&Connection) -> MigrateResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(store_err)?;
        // Dropping `tx` on error rolls it back.
        let value = f(&*tx)?;
        tx.commit().map_err(store_err)?;
        Ok(value)
    }

    fn read<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&Connection) -> MigrateResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(store_err)?;
        let value = f(&*tx);
        tx.rollback().map_err(store_err)?;
        value
    }

    fn applied_identifiers(&self, conn: &Connection) -> MigrateResult<BTreeSet<Identifier>> {
        Ok(self.history.applied_identifiers(conn)?)
    }

    fn record_applied(&self, conn: &Connection, step: AppliedStep<'_>) -> MigrateResult<()> {
        Ok(self.history.record(conn, step)?)
    }

    fn remove_applied(&self, conn: &Connection, identifier: &Identifier) -> MigrateResult<()> {
        Ok(self.history.remove(conn, identifier)?)
    }
}

impl IntegrityProbe<Connection> for SqliteStore {
    fn quick_check(&self, conn: &Connection) -> MigrateResult<String> {
        SqliteProbe.quick_check(conn)
    }

    fn foreign_key_violation_count(&self, conn: &Connection) -> MigrateResult<usize> {
        SqliteProbe.foreign_key_violation_count(conn)
    }

    fn table_exists(&self, conn: &Connection, table: &str) -> MigrateResult<bool> {
        SqliteProbe.table_exists(conn, table)
    }

    fn index_exists(&self, conn: &Connection, table: &str, index: &str) -> MigrateResult<bool> {
        SqliteProbe.index_exists(conn, table, index)
    }

    fn columns(&self, conn: &Connection, table: &str) -> MigrateResult<Vec<String>> {
        SqliteProbe.columns(conn, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SqliteSchemaSnapshot;
    use strata_migrate::MigrationError;
    use tempfile::TempDir;

    fn step(id: &Identifier) -> AppliedStep<'_> {
        AppliedStep {
            identifier: id,
            source_label: "test",
            duration_ms: 1,
        }
    }

    #[test]
    fn test_write_commits() {
        let store = SqliteStore::in_memory().unwrap();
        let id = Identifier::from("0001_create_items");

        store
            .write(|conn| {
                conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY)")
                    .map_err(store_err)?;
                store.record_applied(conn, step(&id))
            })
            .unwrap();

        let applied = store.read(|conn| store.applied_identifiers(conn)).unwrap();
        assert!(applied.contains(&id));
        assert!(store.read(|conn| store.table_exists(conn, "items")).unwrap());
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let store = SqliteStore::in_memory().unwrap();
        let id = Identifier::from("0001_create_items");

        let result: MigrateResult<()> = store.write(|conn| {
            conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY)")
                .map_err(store_err)?;
            store.record_applied(conn, step(&id))?;
            Err(MigrationError::transform("boom"))
        });
        assert!(result.is_err());

        assert!(!store.read(|conn| store.table_exists(conn, "items")).unwrap());
        assert!(store.applied_records().unwrap().is_empty());
    }

    #[test]
    fn test_read_never_commits() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .read(|conn| {
                conn.execute_batch("CREATE TABLE scratch (id INTEGER)")
                    .map_err(store_err)
            })
            .unwrap();

        assert!(!store.read(|conn| store.table_exists(conn, "scratch")).unwrap());
    }

    #[test]
    fn test_open_file_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.db");
        let id = Identifier::from("0001_create_items");

        {
            let store = SqliteStore::open(SqliteConfig::file(&path)).unwrap();
            store.write(|conn| store.record_applied(conn, step(&id))).unwrap();
        }

        let store = SqliteStore::open(SqliteConfig::file(&path)).unwrap();
        let records = store.applied_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, id);
        assert_eq!(records[0].source_label, "test");
    }

    #[test]
    fn test_custom_history_table() {
        let store =
            SqliteStore::open(SqliteConfig::memory().history_table("schema_history")).unwrap();
        let id = Identifier::from("0001_a");
        store.write(|conn| store.record_applied(conn, step(&id))).unwrap();

        assert!(store.read(|conn| store.table_exists(conn, "schema_history")).unwrap());
        assert!(!store.read(|conn| store.table_exists(conn, "_strata_migrations")).unwrap());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::in_memory().unwrap();
        let enabled: i64 = store
            .with_connection(|conn| conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_schema_snapshot() {
        let store = SqliteStore::in_memory().unwrap();
        let id = Identifier::from("0001_create_items");
        store
            .write(|conn| {
                conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY)")
                    .map_err(store_err)?;
                store.record_applied(conn, step(&id))
            })
            .unwrap();

        let text = store.schema_snapshot(&SqliteSchemaSnapshot::default()).unwrap();
        assert_eq!(text, "table:items\ncol:0:id:INTEGER:0::1\n");
    }

    #[test]
    fn test_key_without_sqlcipher_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("secret.db");

        let err = SqliteStore::open(SqliteConfig::file(&path).key("hunter2")).unwrap_err();
        assert!(matches!(err, SqliteError::Config(ref msg) if msg.contains("SQLCipher")));
    }
}
