//! Applied-migration bookkeeping table.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use strata_migrate::{AppliedStep, Identifier};

use crate::error::{SqliteError, SqliteResult};

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRecord {
    /// Migration identifier.
    pub identifier: Identifier,
    /// Informational source label captured when the step ran.
    pub source_label: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
    /// Duration of the forward transform in milliseconds.
    pub duration_ms: i64,
}

/// SQL access to the bookkeeping table.
#[derive(Debug, Clone)]
pub struct HistoryTable {
    name: String,
}

impl HistoryTable {
    /// Create an accessor for the named table.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// SQL creating the table if it is absent.
    pub fn init_sql(&self) -> String {
        format!(
            r#"
CREATE TABLE IF NOT EXISTS {} (
    identifier TEXT PRIMARY KEY NOT NULL,
    source_label TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    duration_ms INTEGER NOT NULL DEFAULT 0
);
"#,
            quote_ident(&self.name)
        )
    }

    /// Check if the table exists.
    pub fn exists(&self, conn: &Connection) -> SqliteResult<bool> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&self.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    /// Identifiers recorded as applied; empty when the table is absent.
    pub fn applied_identifiers(&self, conn: &Connection) -> SqliteResult<BTreeSet<Identifier>> {
        if !self.exists(conn)? {
            return Ok(BTreeSet::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT identifier FROM {}",
            quote_ident(&self.name)
        ))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(Identifier::from))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(ids)
    }

    /// Full bookkeeping rows ordered by identifier; empty when the table is absent.
    pub fn records(&self, conn: &Connection) -> SqliteResult<Vec<AppliedRecord>> {
        if !self.exists(conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT identifier, source_label, applied_at, duration_ms FROM {} ORDER BY identifier",
            quote_ident(&self.name)
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(identifier, source_label, applied_at, duration_ms)| -> SqliteResult<AppliedRecord> {
                let applied_at = DateTime::parse_from_rfc3339(&applied_at)
                    .map_err(|e| {
                        SqliteError::corrupt(format!(
                            "invalid applied_at '{}' for '{}': {}",
                            applied_at, identifier, e
                        ))
                    })?
                    .with_timezone(&Utc);
                Ok(AppliedRecord {
                    identifier: identifier.into(),
                    source_label,
                    applied_at,
                    duration_ms,
                })
            })
            .collect()
    }

    /// Record a step as applied, creating the table if needed.
    pub fn record(&self, conn: &Connection, step: AppliedStep<'_>) -> SqliteResult<()> {
        conn.execute_batch(&self.init_sql())?;
        conn.execute(
            &format!(
                "INSERT INTO {} (identifier, source_label, applied_at, duration_ms) VALUES (?1, ?2, ?3, ?4)",
                quote_ident(&self.name)
            ),
            params![
                step.identifier.as_str(),
                step.source_label,
                Utc::now().to_rfc3339(),
                step.duration_ms
            ],
        )?;
        Ok(())
    }

    /// Remove the record of a step.
    pub fn remove(&self, conn: &Connection, identifier: &Identifier) -> SqliteResult<()> {
        if !self.exists(conn)? {
            return Ok(());
        }
        conn.execute(
            &format!("DELETE FROM {} WHERE identifier = ?1", quote_ident(&self.name)),
            [identifier.as_str()],
        )?;
        Ok(())
    }
}

/// Quote an SQL identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
