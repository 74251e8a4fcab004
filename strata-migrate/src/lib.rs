//! # strata-migrate
//!
//! Store-agnostic migration engine for Strata.
//!
//! This crate provides:
//! - Migration identifiers and semantic schema versions
//! - Immutable [`Step`]s pairing a forward transform with an optional rollback
//! - A [`Registry`] that validates step lists (unique, lexicographically ordered)
//! - A [`Runner`] that applies, reports and rolls back steps against a store
//! - A [`Verifier`] for post-operation structural checks
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ Vec<Step<C>> │────▶│ Registry<C>    │────▶│ Runner<C>   │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                                                    │
//!                              ┌─────────────────────┼──────────────────┐
//!                              ▼                     ▼                  ▼
//!                      ┌────────────────┐     ┌─────────────┐    ┌─────────────┐
//!                      │ MigrationStore │     │ Verifier    │    │ Host hooks  │
//!                      └────────────────┘     └─────────────┘    └─────────────┘
//! ```
//!
//! Steps and the registry are generic over the connection type `C` that
//! transforms operate on. All transaction and query logic lives behind the
//! [`MigrationStore`] and [`IntegrityProbe`] traits, implemented by a
//! concrete store crate such as `strata-sqlite`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_migrate::{Runner, Step};
//!
//! let runner = Runner::from_steps(vec![
//!     Step::new("0001_create_items", |conn: &rusqlite::Connection| {
//!         conn.execute_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")?;
//!         Ok(())
//!     })
//!     .with_rollback(|conn: &rusqlite::Connection| {
//!         conn.execute_batch("DROP TABLE items")?;
//!         Ok(())
//!     }),
//! ])?;
//!
//! let report = runner.migrate(&store)?;
//! println!("{}", report.summary());
//! ```

pub mod error;
pub mod hooks;
pub mod registry;
pub mod runner;
pub mod step;
pub mod store;
pub mod verify;
pub mod version;

#[cfg(test)]
mod testing;

// Re-exports
pub use error::{BoxError, MigrateResult, MigrationError};
pub use hooks::{BootstrapHook, HostIntegration, VerifyHook};
pub use registry::{ManifestEntry, Registry};
pub use runner::{
    MigrationReport, MigrationState, MigrationStatus, RollbackOutcome, Runner, RunnerConfig,
};
pub use step::{Step, Transform};
pub use store::{AppliedStep, IntegrityProbe, MigrationStore};
pub use verify::{IndexRequirement, QUICK_CHECK_OK, Verifier};
pub use version::{Identifier, SchemaVersion};
