//! Migration steps.

use std::fmt;

use crate::error::BoxError;
use crate::version::Identifier;

/// A side-effecting transformation over a connection of type `C`.
///
/// Transforms do not manage transactions; the runner wraps each call in one.
pub type Transform<C> = Box<dyn Fn(&C) -> Result<(), BoxError> + Send + Sync>;

/// An immutable migration step: an identifier, a forward transform and an
/// optional reverse transform.
pub struct Step<C> {
    identifier: Identifier,
    source_label: String,
    apply: Transform<C>,
    rollback: Option<Transform<C>>,
}

impl<C> Step<C> {
    /// Create a step with a forward transform.
    pub fn new<F>(identifier: impl Into<Identifier>, apply: F) -> Self
    where
        F: Fn(&C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        Self {
            source_label: identifier.to_string(),
            identifier,
            apply: Box::new(apply),
            rollback: None,
        }
    }

    /// Attach a reverse transform.
    pub fn with_rollback<F>(mut self, rollback: F) -> Self
    where
        F: Fn(&C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.rollback = Some(Box::new(rollback));
        self
    }

    /// Set the informational source label (file name, module path, ...).
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    /// The step identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// The informational source label.
    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    /// Check if the step can be rolled back.
    pub fn is_reversible(&self) -> bool {
        self.rollback.is_some()
    }

    /// Run the forward transform.
    pub fn apply(&self, conn: &C) -> Result<(), BoxError> {
        (self.apply)(conn)
    }

    /// Run the reverse transform, if one is defined.
    pub fn rollback(&self, conn: &C) -> Option<Result<(), BoxError>> {
        self.rollback.as_ref().map(|f| f(conn))
    }
}

impl<C> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("identifier", &self.identifier)
            .field("source_label", &self.source_label)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_step_defaults() {
        let step: Step<()> = Step::new("0001_create_items", |_| Ok(()));

        assert_eq!(step.identifier(), &Identifier::from("0001_create_items"));
        assert_eq!(step.source_label(), "0001_create_items");
        assert!(!step.is_reversible());
        assert!(step.rollback(&()).is_none());
    }

    #[test]
    fn test_step_runs_transforms() {
        let step: Step<Cell<i32>> = Step::new("0001_counter", |c: &Cell<i32>| {
            c.set(c.get() + 1);
            Ok(())
        })
        .with_rollback(|c: &Cell<i32>| {
            c.set(c.get() - 1);
            Ok(())
        })
        .with_source_label("migrations/0001_counter.rs");

        let counter = Cell::new(0);
        step.apply(&counter).unwrap();
        step.apply(&counter).unwrap();
        assert_eq!(counter.get(), 2);

        step.rollback(&counter).unwrap().unwrap();
        assert_eq!(counter.get(), 1);
        assert!(step.is_reversible());
        assert_eq!(step.source_label(), "migrations/0001_counter.rs");
    }

    #[test]
    fn test_debug_omits_closures() {
        let step: Step<()> = Step::new("0001_a", |_| Ok(()));
        let debug = format!("{:?}", step);
        assert!(debug.contains("0001_a"));
        assert!(debug.contains("reversible: false"));
    }
}
