//! SQLite structural probes backing the verifier.

use rusqlite::{Connection, OptionalExtension};
use strata_migrate::{IndexRequirement, IntegrityProbe, MigrateResult, Verifier};

use crate::error::store_err;
use crate::history::quote_ident;

/// [`IntegrityProbe`] over a plain SQLite connection.
///
/// Uses `PRAGMA quick_check`, `PRAGMA foreign_key_check`, `sqlite_master`
/// and `PRAGMA table_info`. None of these queries write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProbe;

impl IntegrityProbe<Connection> for SqliteProbe {
    fn quick_check(&self, conn: &Connection) -> MigrateResult<String> {
        let mut stmt = conn.prepare("PRAGMA quick_check").map_err(store_err)?;
        let lines = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(store_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;
        Ok(lines.join("\n"))
    }

    fn foreign_key_violation_count(&self, conn: &Connection) -> MigrateResult<usize> {
        let mut stmt = conn.prepare("PRAGMA foreign_key_check").map_err(store_err)?;
        let mut rows = stmt.query([]).map_err(store_err)?;
        let mut count = 0;
        while rows.next().map_err(store_err)?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    fn table_exists(&self, conn: &Connection, table: &str) -> MigrateResult<bool> {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(store_err)
    }

    fn index_exists(&self, conn: &Connection, table: &str, index: &str) -> MigrateResult<bool> {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND name = ?2",
            [table, index],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(store_err)
    }

    fn columns(&self, conn: &Connection, table: &str) -> MigrateResult<Vec<String>> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
            .map_err(store_err)?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(store_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_err)?;
        Ok(columns)
    }
}

/// Run the default integrity scan on a connection.
pub fn verify_integrity(conn: &Connection) -> MigrateResult<()> {
    Verifier::new(&SqliteProbe).verify_integrity(conn)
}

/// Check that the required indexes exist on a connection.
pub fn verify_required_indexes(conn: &Connection, specs: &[IndexRequirement]) -> MigrateResult<()> {
    Verifier::new(&SqliteProbe).verify_required_indexes(conn, specs)
}
