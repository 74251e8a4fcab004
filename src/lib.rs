//! # Strata
//!
//! Ordered, verified schema migrations for SQLite.
//!
//! Strata provides:
//! - A registry that rejects duplicate or out-of-order migration identifiers
//! - A runner that applies each pending step in its own transaction and
//!   records it atomically with the schema change
//! - Single-step rollback restricted to the latest applied migration
//! - Post-migration integrity checks (`quick_check`, foreign keys, required indexes)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open(SqliteConfig::file("app.db"))?;
//!
//!     let runner = SqliteRunner::from_steps(vec![
//!         Step::new("0001_create_items", |conn: &Connection| {
//!             conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")?;
//!             Ok(())
//!         })
//!         .with_rollback(|conn: &Connection| {
//!             conn.execute_batch("DROP TABLE items")?;
//!             Ok(())
//!         }),
//!     ])?;
//!
//!     let report = runner.migrate(&store)?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Store-agnostic migration engine.
pub mod migrate {
    pub use strata_migrate::*;
}

/// SQLite store, SQL directory loader and schema snapshots.
pub mod sqlite {
    pub use strata_sqlite::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        HostIntegration, Identifier, IndexRequirement, MigrateResult, MigrationError,
        MigrationReport, MigrationState, MigrationStatus, MigrationStore, RollbackOutcome, Runner,
        RunnerConfig, Step,
    };
    pub use crate::sqlite::{
        SqlMigrationDir, SqliteConfig, SqliteRunner, SqliteSchemaSnapshot, SqliteStep, SqliteStore,
    };
    pub use rusqlite::Connection;
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, Runner, Step};
pub use sqlite::{SqliteStore, SqliteStep};
