//! Post-operation structural checks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MigrateResult, MigrationError};
use crate::store::IntegrityProbe;

/// Canonical result of a healthy consistency scan.
pub const QUICK_CHECK_OK: &str = "ok";

/// An index that must exist once its table exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRequirement {
    /// Table name.
    pub table: String,
    /// Index name.
    pub index: String,
}

impl IndexRequirement {
    /// Create an index requirement.
    pub fn new(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: index.into(),
        }
    }
}

/// Runs read-only structural checks through an [`IntegrityProbe`].
///
/// Verification never mutates the store.
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a, P: ?Sized> {
    probe: &'a P,
}

impl<'a, P: ?Sized> Verifier<'a, P> {
    /// Create a verifier over a probe.
    pub fn new(probe: &'a P) -> Self {
        Self { probe }
    }

    /// Consistency scan followed by the referential-integrity scan.
    pub fn verify_integrity<C: ?Sized>(&self, conn: &C) -> MigrateResult<()>
    where
        P: IntegrityProbe<C>,
    {
        let result = self.probe.quick_check(conn)?;
        if result != QUICK_CHECK_OK {
            return Err(MigrationError::QuickCheckFailed(result));
        }

        let violations = self.probe.foreign_key_violation_count(conn)?;
        if violations > 0 {
            return Err(MigrationError::ForeignKeyViolations(violations));
        }

        debug!("Integrity checks passed");
        Ok(())
    }

    /// Check that every required index exists.
    ///
    /// Requirements on absent tables are skipped; the first missing index
    /// fails the check.
    pub fn verify_required_indexes<C: ?Sized>(
        &self,
        conn: &C,
        specs: &[IndexRequirement],
    ) -> MigrateResult<()>
    where
        P: IntegrityProbe<C>,
    {
        for spec in specs {
            if !self.probe.table_exists(conn, &spec.table)? {
                debug!(table = %spec.table, index = %spec.index, "Table absent, skipping index requirement");
                continue;
            }
            if !self.probe.index_exists(conn, &spec.table, &spec.index)? {
                return Err(MigrationError::missing_index(&spec.table, &spec.index));
            }
        }
        Ok(())
    }

    /// Integrity scan followed by the required index check.
    pub fn verify<C: ?Sized>(&self, conn: &C, specs: &[IndexRequirement]) -> MigrateResult<()>
    where
        P: IntegrityProbe<C>,
    {
        self.verify_integrity(conn)?;
        self.verify_required_indexes(conn, specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    #[derive(Default)]
    struct FakeProbe {
        quick_check: Option<String>,
        violations: usize,
        tables: BTreeMap<String, BTreeSet<String>>,
    }

    impl FakeProbe {
        fn with_table(mut self, table: &str, indexes: &[&str]) -> Self {
            self.tables.insert(
                table.to_string(),
                indexes.iter().map(|i| i.to_string()).collect(),
            );
            self
        }
    }

    impl IntegrityProbe<()> for FakeProbe {
        fn quick_check(&self, _: &()) -> MigrateResult<String> {
            Ok(self.quick_check.clone().unwrap_or_else(|| QUICK_CHECK_OK.to_string()))
        }

        fn foreign_key_violation_count(&self, _: &()) -> MigrateResult<usize> {
            Ok(self.violations)
        }

        fn table_exists(&self, _: &(), table: &str) -> MigrateResult<bool> {
            Ok(self.tables.contains_key(table))
        }

        fn index_exists(&self, _: &(), table: &str, index: &str) -> MigrateResult<bool> {
            Ok(self.tables.get(table).is_some_and(|i| i.contains(index)))
        }

        fn columns(&self, _: &(), _: &str) -> MigrateResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_healthy_store_passes() {
        let probe = FakeProbe::default();
        Verifier::new(&probe).verify_integrity(&()).unwrap();
    }

    #[test]
    fn test_quick_check_diagnostic_is_carried() {
        let probe = FakeProbe {
            quick_check: Some("*** in database main ***\nPage 4 is never used".into()),
            ..Default::default()
        };
        match Verifier::new(&probe).verify_integrity(&()) {
            Err(MigrationError::QuickCheckFailed(msg)) => assert!(msg.contains("Page 4")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_foreign_key_violations() {
        let probe = FakeProbe {
            violations: 3,
            ..Default::default()
        };
        assert!(matches!(
            Verifier::new(&probe).verify_integrity(&()),
            Err(MigrationError::ForeignKeyViolations(3))
        ));
    }

    #[test]
    fn test_required_indexes() {
        let probe = FakeProbe::default()
            .with_table("items", &["idx_items_name"])
            .with_table("tags", &[]);
        let verifier = Verifier::new(&probe);

        verifier
            .verify_required_indexes(&(), &[IndexRequirement::new("items", "idx_items_name")])
            .unwrap();

        // Absent tables are not a failure.
        verifier
            .verify_required_indexes(&(), &[IndexRequirement::new("notes", "idx_notes_body")])
            .unwrap();

        match verifier.verify(
            &(),
            &[
                IndexRequirement::new("items", "idx_items_name"),
                IndexRequirement::new("tags", "idx_tags_label"),
                IndexRequirement::new("tags", "idx_tags_other"),
            ],
        ) {
            Err(MigrationError::MissingIndex { table, index }) => {
                assert_eq!(table, "tags");
                assert_eq!(index, "idx_tags_label");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
