//! Capabilities the runner requires from a concrete store.
//!
//! The runner never talks to a database directly. It asks the store for
//! transactions, reads the applied set through it, and records bookkeeping
//! through it, so the same orchestration logic works for any store that can
//! offer atomic write transactions and consistent reads.

use std::collections::BTreeSet;

use crate::error::MigrateResult;
use crate::version::Identifier;

/// Bookkeeping details recorded when a step commits.
#[derive(Debug, Clone, Copy)]
pub struct AppliedStep<'a> {
    /// Step identifier.
    pub identifier: &'a Identifier,
    /// Informational source label.
    pub source_label: &'a str,
    /// Time spent in the forward transform.
    pub duration_ms: i64,
}

/// Transaction and bookkeeping capabilities of a store.
pub trait MigrationStore {
    /// Connection handle passed to transforms and hooks.
    type Conn;

    /// Run `f` inside one atomic write transaction.
    ///
    /// Everything `f` does commits when it returns `Ok` and is rolled back
    /// when it returns `Err`.
    fn write<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&Self::Conn) -> MigrateResult<T>;

    /// Run `f` inside a consistent read snapshot. Nothing is committed.
    fn read<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&Self::Conn) -> MigrateResult<T>;

    /// Identifiers currently recorded as applied.
    ///
    /// Returns an empty set when the bookkeeping table does not exist yet.
    fn applied_identifiers(&self, conn: &Self::Conn) -> MigrateResult<BTreeSet<Identifier>>;

    /// Record a step as applied, creating the bookkeeping table if needed.
    fn record_applied(&self, conn: &Self::Conn, step: AppliedStep<'_>) -> MigrateResult<()>;

    /// Remove the applied record of a step.
    fn remove_applied(&self, conn: &Self::Conn, identifier: &Identifier) -> MigrateResult<()>;
}

/// Read-only structural queries used by the verifier.
pub trait IntegrityProbe<C: ?Sized> {
    /// Whole-store consistency scan; `"ok"` when healthy, diagnostics otherwise.
    fn quick_check(&self, conn: &C) -> MigrateResult<String>;

    /// Number of rows violating declared relationships.
    fn foreign_key_violation_count(&self, conn: &C) -> MigrateResult<usize>;

    /// Check if a table exists.
    fn table_exists(&self, conn: &C, table: &str) -> MigrateResult<bool>;

    /// Check if an index with exactly this name exists on the table.
    fn index_exists(&self, conn: &C, table: &str, index: &str) -> MigrateResult<bool>;

    /// Column names of a table, in declaration order.
    fn columns(&self, conn: &C, table: &str) -> MigrateResult<Vec<String>>;
}

impl<C: ?Sized, P: IntegrityProbe<C> + ?Sized> IntegrityProbe<C> for &P {
    fn quick_check(&self, conn: &C) -> MigrateResult<String> {
        (**self).quick_check(conn)
    }

    fn foreign_key_violation_count(&self, conn: &C) -> MigrateResult<usize> {
        (**self).foreign_key_violation_count(conn)
    }

    fn table_exists(&self, conn: &C, table: &str) -> MigrateResult<bool> {
        (**self).table_exists(conn, table)
    }

    fn index_exists(&self, conn: &C, table: &str, index: &str) -> MigrateResult<bool> {
        (**self).index_exists(conn, table, index)
    }

    fn columns(&self, conn: &C, table: &str) -> MigrateResult<Vec<String>> {
        (**self).columns(conn, table)
    }
}
