//! Error types for the migration engine.

use thiserror::Error;

use crate::version::Identifier;

/// Boxed error raised by step transforms and store collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The step list contains identifiers more than once.
    #[error("Duplicate migration identifiers: {}", join(.0))]
    DuplicateIdentifiers(Vec<Identifier>),

    /// The step list is not in lexicographic order.
    #[error(
        "Migration identifiers are out of order: expected [{}], got [{}]",
        join(.expected),
        join(.actual)
    )]
    IdentifiersOutOfOrder {
        /// The sorted sequence the registry expected.
        expected: Vec<Identifier>,
        /// The sequence as supplied.
        actual: Vec<Identifier>,
    },

    /// `migrate_to` was given an identifier that is not registered.
    #[error("Unknown migration target '{0}'")]
    UnknownMigrationTarget(Identifier),

    /// A rollback named an identifier that is not registered.
    #[error("Unknown migration identifier '{0}'")]
    UnknownMigrationIdentifier(Identifier),

    /// The step has no rollback transform.
    #[error("Migration '{0}' does not define a rollback")]
    RollbackNotDefined(Identifier),

    /// Only the most recently applied step may be rolled back.
    #[error(
        "Rollback must target the latest applied migration '{latest_applied}', not '{requested}'"
    )]
    RollbackMustTargetLatestApplied {
        /// Highest-registry-order applied identifier.
        latest_applied: Identifier,
        /// Identifier the caller asked for.
        requested: Identifier,
    },

    /// A negative step count was passed to `rollback_migrations`.
    #[error("Rollback step count must be non-negative, got {0}")]
    RollbackStepCountMustBeNonNegative(i64),

    /// The consistency scan did not return "ok".
    #[error("Quick check failed: {0}")]
    QuickCheckFailed(String),

    /// The referential-integrity scan found violating rows.
    #[error("Foreign key check found {0} violation(s)")]
    ForeignKeyViolations(usize),

    /// A required index is absent.
    #[error("Missing required index '{index}' on table '{table}'")]
    MissingIndex {
        /// Table the index belongs to.
        table: String,
        /// Index name.
        index: String,
    },

    /// A schema version string could not be parsed.
    #[error("Invalid schema version '{0}'")]
    InvalidVersion(String),

    /// The underlying store failed.
    #[error("Store error: {0}")]
    Store(#[source] BoxError),

    /// A step transform or host hook failed.
    #[error(transparent)]
    Transform(BoxError),
}

impl MigrationError {
    /// Create a store error from any error type.
    pub fn store(err: impl Into<BoxError>) -> Self {
        Self::Store(err.into())
    }

    /// Create a transform error from any error type.
    pub fn transform(err: impl Into<BoxError>) -> Self {
        Self::Transform(err.into())
    }

    /// Create a missing index error.
    pub fn missing_index(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self::MissingIndex {
            table: table.into(),
            index: index.into(),
        }
    }

    /// Check if this error was raised while validating a step list.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifiers(_) | Self::IdentifiersOutOfOrder { .. }
        )
    }

    /// Check if this error came from a structural check.
    pub fn is_verification(&self) -> bool {
        matches!(
            self,
            Self::QuickCheckFailed(_) | Self::ForeignKeyViolations(_) | Self::MissingIndex { .. }
        )
    }

    /// Check if this error is a rollback policy violation.
    pub fn is_rollback_policy(&self) -> bool {
        matches!(
            self,
            Self::RollbackNotDefined(_)
                | Self::RollbackMustTargetLatestApplied { .. }
                | Self::RollbackStepCountMustBeNonNegative(_)
        )
    }
}

fn join(ids: &[Identifier]) -> String {
    ids.iter()
        .map(Identifier::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
