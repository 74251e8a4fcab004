//! The migration runner.
//!
//! The runner decides which registered steps to apply, skip or roll back
//! against a live store. Every mutation (one step, one rollback, the
//! bootstrap hook) runs in exactly one write transaction of its own, and the
//! applied set is re-read from the store on every call.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::hooks::HostIntegration;
use crate::registry::Registry;
use crate::step::Step;
use crate::store::{AppliedStep, IntegrityProbe, MigrationStore};
use crate::verify::{IndexRequirement, Verifier};
use crate::version::Identifier;

/// Configuration for the runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Indexes checked by the default post-migration verification.
    pub required_indexes: Vec<IndexRequirement>,
}

impl RunnerConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an index once its table exists.
    pub fn require_index(mut self, table: impl Into<String>, index: impl Into<String>) -> Self {
        self.required_indexes.push(IndexRequirement::new(table, index));
        self
    }

    /// Replace the list of required indexes.
    pub fn required_indexes(mut self, specs: Vec<IndexRequirement>) -> Self {
        self.required_indexes = specs;
        self
    }
}

/// Whether a step is recorded as applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// Recorded as applied.
    Up,
    /// Not recorded as applied.
    Down,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
        }
    }
}

/// Status of one registered step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Step identifier.
    pub identifier: Identifier,
    /// Informational source label.
    pub source_label: String,
    /// Applied state.
    pub state: MigrationState,
}

impl MigrationStatus {
    /// Check if the step is applied.
    pub fn is_up(&self) -> bool {
        self.state == MigrationState::Up
    }
}

/// Result of a migrate operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Identifiers applied by this call, in order.
    pub applied: Vec<Identifier>,
    /// Whether the bootstrap hook reported creating a baseline schema.
    pub bootstrapped: bool,
    /// Registered steps still pending afterwards.
    pub pending_after: usize,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationReport {
    /// Check if any step was applied.
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Get a summary of the report.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.bootstrapped {
            parts.push("baseline schema created".to_string());
        }

        if self.applied.is_empty() {
            parts.push("no migrations applied".to_string());
        } else {
            parts.push(format!(
                "{} applied in {}ms",
                self.applied.len(),
                self.duration_ms
            ));
        }

        parts.push(format!("{} pending", self.pending_after));
        parts.join(", ")
    }
}

/// Result of a single-step rollback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    /// The step was rolled back.
    RolledBack(Identifier),
    /// The requested step was not applied; nothing changed.
    NotApplied(Identifier),
    /// No registered step is applied; nothing changed.
    NothingApplied,
}

impl RollbackOutcome {
    /// The identifier that was rolled back, if any.
    pub fn rolled_back(&self) -> Option<&Identifier> {
        match self {
            Self::RolledBack(id) => Some(id),
            _ => None,
        }
    }
}

/// Orchestrates apply, rollback and status against a store.
pub struct Runner<C> {
    registry: Registry<C>,
    host: HostIntegration<C>,
    config: RunnerConfig,
}

impl<C> Runner<C> {
    /// Create a runner over a validated registry.
    pub fn new(registry: Registry<C>) -> Self {
        Self {
            registry,
            host: HostIntegration::new(),
            config: RunnerConfig::default(),
        }
    }

    /// Validate `steps` and create a runner over them.
    pub fn from_steps(steps: Vec<Step<C>>) -> MigrateResult<Self> {
        Ok(Self::new(Registry::new(steps)?))
    }

    /// Install host integration hooks.
    pub fn with_host_integration(mut self, host: HostIntegration<C>) -> Self {
        self.host = host;
        self
    }

    /// Set the runner configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry this runner operates on.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// The runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Apply every pending step, then run full verification.
    pub fn migrate<S>(&self, store: &S) -> MigrateResult<MigrationReport>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        self.run_migrate(store, None)
    }

    /// Apply pending steps up to and including `target`.
    ///
    /// Fails with [`MigrationError::UnknownMigrationTarget`] before touching
    /// the store when `target` is not registered. Full verification only runs
    /// when `target` is the last registered step; otherwise the integrity scan
    /// runs alone.
    pub fn migrate_to<S>(&self, store: &S, target: &str) -> MigrateResult<MigrationReport>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        let position = self
            .registry
            .position(target)
            .ok_or_else(|| MigrationError::UnknownMigrationTarget(target.into()))?;
        self.run_migrate(store, Some(position))
    }

    fn run_migrate<S>(&self, store: &S, limit: Option<usize>) -> MigrateResult<MigrationReport>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        let start = Instant::now();

        let bootstrapped = match &self.host.bootstrap_schema {
            Some(hook) => {
                let created = store.write(|conn| hook(conn))?;
                info!(created, "Bootstrap hook completed");
                created
            }
            None => false,
        };

        let applied_before = self.applied_set(store)?;
        let end = limit.map_or(self.registry.len(), |i| i + 1);

        let mut applied = Vec::new();
        for step in &self.registry.steps()[..end] {
            if applied_before.contains(step.identifier()) {
                continue;
            }
            self.apply_step(store, step)?;
            applied.push(step.identifier().clone());
        }

        let full = limit.is_none_or(|i| i + 1 == self.registry.len());
        if full {
            self.run_post_migration_checks(store)?;
        } else {
            self.verify_integrity(store)?;
        }

        let pending_after = self.pending_migration_identifiers(store)?.len();
        let report = MigrationReport {
            applied,
            bootstrapped,
            pending_after,
            duration_ms: start.elapsed().as_millis() as i64,
        };
        info!(
            applied = report.applied.len(),
            pending = report.pending_after,
            duration_ms = report.duration_ms,
            "Migrate completed"
        );
        Ok(report)
    }

    fn apply_step<S>(&self, store: &S, step: &Step<C>) -> MigrateResult<()>
    where
        S: MigrationStore<Conn = C>,
    {
        let id = step.identifier();
        debug!(identifier = %id, "Applying migration");

        store
            .write(|conn| {
                let start = Instant::now();
                step.apply(conn).map_err(MigrationError::Transform)?;
                store.record_applied(
                    conn,
                    AppliedStep {
                        identifier: id,
                        source_label: step.source_label(),
                        duration_ms: start.elapsed().as_millis() as i64,
                    },
                )
            })
            .inspect_err(|e| warn!(identifier = %id, error = %e, "Migration failed"))?;

        info!(identifier = %id, "Applied migration");
        Ok(())
    }

    /// Status of every registered step, in registry order.
    pub fn migration_status<S>(&self, store: &S) -> MigrateResult<Vec<MigrationStatus>>
    where
        S: MigrationStore<Conn = C>,
    {
        let applied = self.applied_set(store)?;
        Ok(self
            .registry
            .steps()
            .iter()
            .map(|step| MigrationStatus {
                identifier: step.identifier().clone(),
                source_label: step.source_label().to_string(),
                state: if applied.contains(step.identifier()) {
                    MigrationState::Up
                } else {
                    MigrationState::Down
                },
            })
            .collect())
    }

    /// Identifiers of registered steps that are not applied, in registry order.
    pub fn pending_migration_identifiers<S>(&self, store: &S) -> MigrateResult<Vec<Identifier>>
    where
        S: MigrationStore<Conn = C>,
    {
        Ok(self
            .migration_status(store)?
            .into_iter()
            .filter(|s| !s.is_up())
            .map(|s| s.identifier)
            .collect())
    }

    /// Check if any registered step is not applied.
    pub fn has_pending_migrations<S>(&self, store: &S) -> MigrateResult<bool>
    where
        S: MigrationStore<Conn = C>,
    {
        Ok(!self.pending_migration_identifiers(store)?.is_empty())
    }

    /// Roll back one step, which must be the latest applied step.
    pub fn rollback_migration<S>(&self, identifier: &str, store: &S) -> MigrateResult<RollbackOutcome>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        let step = self
            .registry
            .get(identifier)
            .ok_or_else(|| MigrationError::UnknownMigrationIdentifier(identifier.into()))?;
        let id = step.identifier();

        if !step.is_reversible() {
            return Err(MigrationError::RollbackNotDefined(id.clone()));
        }

        let applied = self.applied_set(store)?;
        if !applied.contains(id) {
            info!(identifier = %id, "Migration is not applied, nothing to roll back");
            return Ok(RollbackOutcome::NotApplied(id.clone()));
        }

        if let Some(latest) = self.latest_applied(&applied) {
            if latest != id {
                return Err(MigrationError::RollbackMustTargetLatestApplied {
                    latest_applied: latest.clone(),
                    requested: id.clone(),
                });
            }
        }

        store
            .write(|conn| {
                if let Some(result) = step.rollback(conn) {
                    result.map_err(MigrationError::Transform)?;
                }
                store.remove_applied(conn, id)
            })
            .inspect_err(|e| warn!(identifier = %id, error = %e, "Rollback failed"))?;

        self.verify_integrity(store)?;
        self.run_post_migration_checks(store)?;

        info!(identifier = %id, "Rolled back migration");
        Ok(RollbackOutcome::RolledBack(id.clone()))
    }

    /// Roll back the latest applied step, if any.
    pub fn rollback_last_migration<S>(&self, store: &S) -> MigrateResult<RollbackOutcome>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        let applied = self.applied_set(store)?;
        match self.latest_applied(&applied) {
            Some(latest) => self.rollback_migration(latest.as_str(), store),
            None => {
                info!("No applied migrations, nothing to roll back");
                Ok(RollbackOutcome::NothingApplied)
            }
        }
    }

    /// Roll back up to `steps` of the most recently applied steps.
    ///
    /// The applied set is re-read before every iteration; the loop stops
    /// early without error once nothing is applied.
    pub fn rollback_migrations<S>(&self, store: &S, steps: i64) -> MigrateResult<Vec<Identifier>>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        if steps < 0 {
            return Err(MigrationError::RollbackStepCountMustBeNonNegative(steps));
        }

        let mut rolled_back = Vec::new();
        for _ in 0..steps {
            match self.rollback_last_migration(store)? {
                RollbackOutcome::RolledBack(id) => rolled_back.push(id),
                RollbackOutcome::NotApplied(_) | RollbackOutcome::NothingApplied => break,
            }
        }
        Ok(rolled_back)
    }

    /// Full verification: the host override when present, otherwise the
    /// integrity scan plus the configured required indexes.
    ///
    /// Required indexes are only checked once every registered step is
    /// applied; partial states (after `migrate_to` or a rollback) get the
    /// integrity scan alone.
    pub fn run_post_migration_checks<S>(&self, store: &S) -> MigrateResult<()>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        match &self.host.verify_post_migration {
            Some(hook) => store.read(|conn| hook(conn)),
            None => {
                self.verify_integrity(store)?;
                if self.config.required_indexes.is_empty() {
                    return Ok(());
                }
                let applied = self.applied_set(store)?;
                if !self.registry.identifiers().iter().all(|id| applied.contains(id)) {
                    debug!("Registry not fully applied, skipping required indexes");
                    return Ok(());
                }
                store.read(|conn| {
                    Verifier::new(store).verify_required_indexes(conn, &self.config.required_indexes)
                })
            }
        }
    }

    /// Integrity-only verification: the host override when present,
    /// otherwise the default consistency and referential-integrity scans.
    pub fn verify_integrity<S>(&self, store: &S) -> MigrateResult<()>
    where
        S: MigrationStore<Conn = C> + IntegrityProbe<C>,
    {
        match &self.host.verify_integrity {
            Some(hook) => store.read(|conn| hook(conn)),
            None => store.read(|conn| Verifier::new(store).verify_integrity(conn)),
        }
    }

    fn applied_set<S>(&self, store: &S) -> MigrateResult<BTreeSet<Identifier>>
    where
        S: MigrationStore<Conn = C>,
    {
        store.read(|conn| store.applied_identifiers(conn))
    }

    /// Highest-registry-order identifier in `applied`.
    fn latest_applied<'a>(&'a self, applied: &BTreeSet<Identifier>) -> Option<&'a Identifier> {
        self.registry
            .identifiers()
            .iter()
            .rev()
            .find(|id| applied.contains(*id))
    }
}

impl<C> fmt::Debug for Runner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("steps", &self.registry.len())
            .field("host", &self.host)
            .field("config", &self.config)
            .finish()
    }
}
