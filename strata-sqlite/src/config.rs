//! SQLite store configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{SqliteError, SqliteResult};

/// Default name of the applied-migrations bookkeeping table.
pub const DEFAULT_HISTORY_TABLE: &str = "_strata_migrations";

/// Connection settings for a [`SqliteStore`](crate::SqliteStore).
#[derive(Clone)]
pub struct SqliteConfig {
    /// Database path (or ":memory:" for in-memory).
    pub path: DatabasePath,
    /// Enable foreign keys.
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
    /// Synchronous mode.
    pub synchronous: SynchronousMode,
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// Encryption key, issued as `PRAGMA key` before anything else.
    pub key: Option<String>,
    /// Name of the bookkeeping table.
    pub history_table: String,
}

/// Database path configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Get the path string for SQLite.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Memory => ":memory:",
            Self::File(path) => path.to_str().unwrap_or(":memory:"),
        }
    }

    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

/// `PRAGMA synchronous` level. Only durable levels are offered; migration
/// commits must survive a power loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    /// `NORMAL`, durable under WAL.
    Normal,
    /// `FULL`
    #[default]
    Full,
    /// `EXTRA`
    Extra,
}

impl SynchronousMode {
    /// Pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        [Self::Normal, Self::Full, Self::Extra]
            .into_iter()
            .find(|mode| mode.as_pragma().eq_ignore_ascii_case(value))
    }
}

/// `PRAGMA journal_mode` for file databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JournalMode {
    /// Rollback journal, deleted after each transaction.
    Delete,
    /// Write-ahead log.
    #[default]
    Wal,
}

impl JournalMode {
    /// Pragma value.
    pub fn as_pragma(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Wal => "WAL",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        [Self::Delete, Self::Wal]
            .into_iter()
            .find(|mode| mode.as_pragma().eq_ignore_ascii_case(value))
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            foreign_keys: true,
            busy_timeout_ms: Some(5000),
            synchronous: SynchronousMode::Full,
            journal_mode: JournalMode::Wal,
            key: None,
            history_table: DEFAULT_HISTORY_TABLE.to_string(),
        }
    }
}

impl fmt::Debug for SqliteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConfig")
            .field("path", &self.path)
            .field("foreign_keys", &self.foreign_keys)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .field("synchronous", &self.synchronous)
            .field("journal_mode", &self.journal_mode)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("history_table", &self.history_table)
            .finish()
    }
}

impl SqliteConfig {
    /// In-memory database with default pragmas.
    pub fn memory() -> Self {
        Self {
            path: DatabasePath::Memory,
            ..Default::default()
        }
    }

    /// File database with default pragmas (WAL, `synchronous = FULL`).
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Build a configuration from a `--db-path` value.
    ///
    /// Accepts `:memory:`, `sqlite::memory:`, `sqlite://PATH`, `sqlite:PATH`,
    /// `file:PATH` and bare paths. Query parameters `mode=memory`,
    /// `foreign_keys`, `busy_timeout`, `synchronous` and `journal_mode`
    /// override the defaults; unknown parameters are ignored.
    pub fn from_url(url: impl AsRef<str>) -> SqliteResult<Self> {
        let url_str = url.as_ref();

        if url_str == "sqlite::memory:" || url_str == ":memory:" {
            return Ok(Self::memory());
        }

        let (location, query) = match url_str.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (url_str, None),
        };

        let path = if let Some(path_part) = location.strip_prefix("sqlite://") {
            path_part
        } else if let Some(path_part) = location.strip_prefix("sqlite:") {
            path_part
        } else if let Some(path_part) = location.strip_prefix("file:") {
            path_part
        } else {
            location
        };

        if path.is_empty() {
            return Err(SqliteError::config("database path is required"));
        }

        let mut config = if path == ":memory:" {
            Self::memory()
        } else {
            Self::file(path)
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "mode" if value == "memory" => config.path = DatabasePath::Memory,
                "foreign_keys" => config.foreign_keys = value == "true" || value == "1",
                "busy_timeout" => {
                    let ms = value
                        .parse()
                        .map_err(|_| SqliteError::config(format!("invalid busy_timeout: {value}")))?;
                    config.busy_timeout_ms = Some(ms);
                }
                "synchronous" => {
                    config.synchronous = SynchronousMode::parse(value)
                        .ok_or_else(|| SqliteError::config(format!("invalid synchronous mode: {value}")))?;
                }
                "journal_mode" => {
                    config.journal_mode = JournalMode::parse(value)
                        .ok_or_else(|| SqliteError::config(format!("invalid journal mode: {value}")))?;
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Get the path string for SQLite.
    pub fn path_str(&self) -> &str {
        self.path.as_str()
    }

    /// Generate the initialization SQL for this configuration.
    ///
    /// The encryption key is not part of this SQL; it is issued separately
    /// before any other statement.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        sql.push_str(&format!(
            "PRAGMA foreign_keys = {};\n",
            if self.foreign_keys { "ON" } else { "OFF" }
        ));

        if !self.path.is_memory() {
            sql.push_str(&format!(
                "PRAGMA journal_mode = {};\n",
                self.journal_mode.as_pragma()
            ));
        }

        sql.push_str(&format!(
            "PRAGMA synchronous = {};\n",
            self.synchronous.as_pragma()
        ));

        if let Some(timeout) = self.busy_timeout_ms {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout));
        }

        sql
    }

    /// Set the database path.
    pub fn path(mut self, path: DatabasePath) -> Self {
        self.path = path;
        self
    }

    /// Enable or disable foreign keys.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout in milliseconds.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Set the synchronous mode.
    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set the journal mode.
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Set the encryption key. Opening fails unless SQLite is SQLCipher.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the bookkeeping table name.
    pub fn history_table(mut self, name: impl Into<String>) -> Self {
        self.history_table = name.into();
        self
    }
}
