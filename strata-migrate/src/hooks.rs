//! Host integration hooks.

use std::fmt;

use crate::error::MigrateResult;

/// Bootstrap hook: may create a baseline schema, returns whether it did.
pub type BootstrapHook<C> = Box<dyn Fn(&C) -> MigrateResult<bool> + Send + Sync>;

/// Verification hook.
pub type VerifyHook<C> = Box<dyn Fn(&C) -> MigrateResult<()> + Send + Sync>;

/// Optional overrides supplied by the embedding application.
///
/// A hook that is present fully replaces the corresponding default
/// behavior of the runner; hooks are never chained with the default.
pub struct HostIntegration<C> {
    pub(crate) bootstrap_schema: Option<BootstrapHook<C>>,
    pub(crate) verify_integrity: Option<VerifyHook<C>>,
    pub(crate) verify_post_migration: Option<VerifyHook<C>>,
}

impl<C> HostIntegration<C> {
    /// Create an empty set of hooks.
    pub fn new() -> Self {
        Self {
            bootstrap_schema: None,
            verify_integrity: None,
            verify_post_migration: None,
        }
    }

    /// Run `hook` in its own write transaction before pending steps are applied.
    pub fn bootstrap_schema<F>(mut self, hook: F) -> Self
    where
        F: Fn(&C) -> MigrateResult<bool> + Send + Sync + 'static,
    {
        self.bootstrap_schema = Some(Box::new(hook));
        self
    }

    /// Replace the default integrity scan.
    pub fn verify_integrity<F>(mut self, hook: F) -> Self
    where
        F: Fn(&C) -> MigrateResult<()> + Send + Sync + 'static,
    {
        self.verify_integrity = Some(Box::new(hook));
        self
    }

    /// Replace the default post-migration verification.
    pub fn verify_post_migration<F>(mut self, hook: F) -> Self
    where
        F: Fn(&C) -> MigrateResult<()> + Send + Sync + 'static,
    {
        self.verify_post_migration = Some(Box::new(hook));
        self
    }

    /// Check if no hook is configured.
    pub fn is_empty(&self) -> bool {
        self.bootstrap_schema.is_none()
            && self.verify_integrity.is_none()
            && self.verify_post_migration.is_none()
    }
}

impl<C> Default for HostIntegration<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for HostIntegration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostIntegration")
            .field("bootstrap_schema", &self.bootstrap_schema.is_some())
            .field("verify_integrity", &self.verify_integrity.is_some())
            .field("verify_post_migration", &self.verify_post_migration.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hooks() {
        let hooks: HostIntegration<()> = HostIntegration::default();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_hook_builders() {
        let hooks: HostIntegration<()> = HostIntegration::new()
            .bootstrap_schema(|_| Ok(true))
            .verify_post_migration(|_| Ok(()));

        assert!(!hooks.is_empty());
        assert!(hooks.verify_integrity.is_none());
        let bootstrap = hooks.bootstrap_schema.as_ref().unwrap();
        assert!(bootstrap(&()).unwrap());
        assert_eq!(
            format!("{:?}", hooks),
            "HostIntegration { bootstrap_schema: true, verify_integrity: false, verify_post_migration: true }"
        );
    }
}
