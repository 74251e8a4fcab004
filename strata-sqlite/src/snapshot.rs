//! Canonical schema text for `schema-dump` and drift detection.

use std::fmt::Write as _;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::config::DEFAULT_HISTORY_TABLE;
use crate::error::SqliteResult;
use crate::history::quote_ident;

/// Produces a textual description of a database schema.
pub trait SchemaSnapshot: Send + Sync {
    /// Render the schema reachable through `conn`.
    fn snapshot(&self, conn: &Connection) -> SqliteResult<String>;
}

/// Canonical, order-stable rendering of a SQLite schema.
///
/// Each user table is emitted in name order followed by its columns
/// (`PRAGMA table_info` order), explicit indexes and triggers:
///
/// ```text
/// table:items
/// col:0:id:INTEGER:0::1
/// col:1:name:TEXT:1::0
/// idx:idx_items_name:CREATE INDEX idx_items_name ON items (name)
/// ```
///
/// Internal `sqlite_%` tables and the bookkeeping table are skipped, so the
/// text only changes when the application schema does.
#[derive(Debug, Clone)]
pub struct SqliteSchemaSnapshot {
    history_table: String,
}

impl Default for SqliteSchemaSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_TABLE)
    }
}

impl SqliteSchemaSnapshot {
    /// Snapshot provider that ignores the named bookkeeping table.
    pub fn new(history_table: impl Into<String>) -> Self {
        Self {
            history_table: history_table.into(),
        }
    }

    fn tables(&self, conn: &Connection) -> SqliteResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name != ?1
             ORDER BY name",
        )?;
        let tables = stmt
            .query_map([&self.history_table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }

    fn catalog_entries(
        conn: &Connection,
        kind: &str,
        table: &str,
    ) -> SqliteResult<Vec<(String, String)>> {
        let mut stmt = conn.prepare(
            "SELECT name, IFNULL(sql, '') FROM sqlite_master
             WHERE type = ?1 AND tbl_name = ?2
               AND name NOT LIKE 'sqlite\\_autoindex\\_%' ESCAPE '\\'
             ORDER BY name",
        )?;
        let entries = stmt
            .query_map([kind, table], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl SchemaSnapshot for SqliteSchemaSnapshot {
    fn snapshot(&self, conn: &Connection) -> SqliteResult<String> {
        let mut canonical = String::new();

        for table in self.tables(conn)? {
            let _ = writeln!(canonical, "table:{}", table);

            let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
            let columns = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                        row.get::<_, i64>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (cid, name, ty, not_null, default, pk) in columns {
                let _ = writeln!(
                    canonical,
                    "col:{}:{}:{}:{}:{}:{}",
                    cid, name, ty, not_null, default, pk
                );
            }

            for (name, sql) in Self::catalog_entries(conn, "index", &table)? {
                let _ = writeln!(canonical, "idx:{}:{}", name, sql);
            }
            for (name, sql) in Self::catalog_entries(conn, "trigger", &table)? {
                let _ = writeln!(canonical, "trg:{}:{}", name, sql);
            }
        }

        Ok(canonical)
    }
}

/// SHA-256 hex digest of snapshot text.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
