//! In-memory store used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BoxError, MigrateResult};
use crate::store::{AppliedStep, IntegrityProbe, MigrationStore};
use crate::verify::QUICK_CHECK_OK;
use crate::version::Identifier;

#[derive(Debug, Clone, Default)]
struct MemState {
    tables: BTreeMap<String, BTreeSet<String>>,
    applied: BTreeSet<Identifier>,
    tables_created: usize,
}

/// Connection handle handed to transforms.
#[derive(Debug, Default)]
pub struct MemoryConn {
    state: RefCell<MemState>,
}

impl MemoryConn {
    pub fn create_table(&self, name: &str) -> Result<(), BoxError> {
        let mut state = self.state.borrow_mut();
        if state.tables.contains_key(name) {
            return Err(format!("table {name} already exists").into());
        }
        state.tables.insert(name.to_string(), BTreeSet::new());
        state.tables_created += 1;
        Ok(())
    }

    pub fn create_index(&self, table: &str, index: &str) -> Result<(), BoxError> {
        match self.state.borrow_mut().tables.get_mut(table) {
            Some(indexes) => {
                indexes.insert(index.to_string());
                Ok(())
            }
            None => Err(format!("no such table: {table}").into()),
        }
    }

    pub fn drop_index(&self, table: &str, index: &str) -> Result<(), BoxError> {
        match self
            .state
            .borrow_mut()
            .tables
            .get_mut(table)
            .map(|indexes| indexes.remove(index))
        {
            Some(true) => Ok(()),
            _ => Err(format!("no such index: {index}").into()),
        }
    }

    pub fn drop_table(&self, name: &str) -> Result<(), BoxError> {
        match self.state.borrow_mut().tables.remove(name) {
            Some(_) => Ok(()),
            None => Err(format!("no such table: {name}").into()),
        }
    }
}

/// Store whose write transactions restore a snapshot on failure.
#[derive(Debug)]
pub struct MemoryStore {
    conn: MemoryConn,
    writes: Cell<usize>,
    reads: Cell<usize>,
    quick_check: RefCell<String>,
    violations: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            conn: MemoryConn::default(),
            writes: Cell::new(0),
            reads: Cell::new(0),
            quick_check: RefCell::new(QUICK_CHECK_OK.to_string()),
            violations: Cell::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.conn.state.borrow().tables.contains_key(name)
    }

    pub fn tables_created(&self) -> usize {
        self.conn.state.borrow().tables_created
    }

    pub fn applied(&self) -> BTreeSet<Identifier> {
        self.conn.state.borrow().applied.clone()
    }

    pub fn force_applied(&self, id: &str) {
        self.conn.state.borrow_mut().applied.insert(id.into());
    }

    pub fn set_quick_check(&self, result: &str) {
        *self.quick_check.borrow_mut() = result.to_string();
    }

    pub fn set_foreign_key_violations(&self, count: usize) {
        self.violations.set(count);
    }
}

impl MigrationStore for MemoryStore {
    type Conn = MemoryConn;

    fn write<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&MemoryConn) -> MigrateResult<T>,
    {
        self.writes.set(self.writes.get() + 1);
        let snapshot = self.conn.state.borrow().clone();
        let result = f(&self.conn);
        if result.is_err() {
            *self.conn.state.borrow_mut() = snapshot;
        }
        result
    }

    fn read<T, F>(&self, f: F) -> MigrateResult<T>
    where
        F: FnOnce(&MemoryConn) -> MigrateResult<T>,
    {
        self.reads.set(self.reads.get() + 1);
        f(&self.conn)
    }

    fn applied_identifiers(&self, conn: &MemoryConn) -> MigrateResult<BTreeSet<Identifier>> {
        Ok(conn.state.borrow().applied.clone())
    }

    fn record_applied(&self, conn: &MemoryConn, step: AppliedStep<'_>) -> MigrateResult<()> {
        conn.state.borrow_mut().applied.insert(step.identifier.clone());
        Ok(())
    }

    fn remove_applied(&self, conn: &MemoryConn, identifier: &Identifier) -> MigrateResult<()> {
        conn.state.borrow_mut().applied.remove(identifier);
        Ok(())
    }
}

impl IntegrityProbe<MemoryConn> for MemoryStore {
    fn quick_check(&self, _: &MemoryConn) -> MigrateResult<String> {
        Ok(self.quick_check.borrow().clone())
    }

    fn foreign_key_violation_count(&self, _: &MemoryConn) -> MigrateResult<usize> {
        Ok(self.violations.get())
    }

    fn table_exists(&self, conn: &MemoryConn, table: &str) -> MigrateResult<bool> {
        Ok(conn.state.borrow().tables.contains_key(table))
    }

    fn index_exists(&self, conn: &MemoryConn, table: &str, index: &str) -> MigrateResult<bool> {
        Ok(conn
            .state
            .borrow()
            .tables
            .get(table)
            .is_some_and(|indexes| indexes.contains(index)))
    }

    fn columns(&self, _: &MemoryConn, _: &str) -> MigrateResult<Vec<String>> {
        Ok(Vec::new())
    }
}
