//! SQLite store for Strata migrations.
//!
//! This crate binds the store-agnostic engine in `strata-migrate` to SQLite
//! through `rusqlite`.
//!
//! # Features
//!
//! - Immediate write transactions and rolled-back read snapshots
//! - Bookkeeping table with source label, timestamp and duration per step
//! - Integrity probes over `PRAGMA quick_check` and `PRAGMA foreign_key_check`
//! - `NNNN_name/up.sql` + `down.sql` directory loader
//! - Canonical schema snapshots with SHA-256 fingerprints
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_migrate::Runner;
//! use strata_sqlite::{SqlMigrationDir, SqliteConfig, SqliteStore};
//!
//! let store = SqliteStore::open(SqliteConfig::from_url("sqlite://./app.db")?)?;
//! let runner = Runner::from_steps(SqlMigrationDir::load("migrations")?.into_steps())?;
//!
//! let report = runner.migrate(&store)?;
//! println!("{}", report.summary());
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod history;
pub mod integrity;
pub mod snapshot;
pub mod store;

pub use config::{DEFAULT_HISTORY_TABLE, DatabasePath, JournalMode, SqliteConfig, SynchronousMode};
pub use error::{SqliteError, SqliteResult};
pub use files::{MigrationFile, SqlMigrationDir};
pub use history::{AppliedRecord, HistoryTable};
pub use integrity::{SqliteProbe, verify_integrity, verify_required_indexes};
pub use snapshot::{SchemaSnapshot, SqliteSchemaSnapshot, fingerprint};
pub use store::SqliteStore;

/// Migration steps over a SQLite connection.
pub type SqliteStep = strata_migrate::Step<rusqlite::Connection>;

/// Runner over a SQLite connection.
pub type SqliteRunner = strata_migrate::Runner<rusqlite::Connection>;
