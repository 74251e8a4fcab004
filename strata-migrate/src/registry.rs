//! Validated, ordered view over a list of migration steps.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};
use crate::step::Step;
use crate::version::Identifier;

/// One line of the registry manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Step identifier.
    pub identifier: Identifier,
    /// Informational source label.
    pub source_label: String,
}

/// An immutable, validated list of steps.
///
/// Construction guarantees that identifiers are unique and, when order
/// enforcement is on, that the list is sorted lexicographically.
#[derive(Debug)]
pub struct Registry<C> {
    steps: Vec<Step<C>>,
    identifiers: Vec<Identifier>,
    positions: HashMap<Identifier, usize>,
}

impl<C> Registry<C> {
    /// Build a registry, enforcing lexicographic order.
    pub fn new(steps: Vec<Step<C>>) -> MigrateResult<Self> {
        Self::with_order_enforcement(steps, true)
    }

    /// Build a registry, optionally enforcing lexicographic order.
    pub fn with_order_enforcement(steps: Vec<Step<C>>, enforce_order: bool) -> MigrateResult<Self> {
        let identifiers: Vec<Identifier> = steps.iter().map(|s| s.identifier().clone()).collect();

        let mut counts: BTreeMap<&Identifier, usize> = BTreeMap::new();
        for id in &identifiers {
            *counts.entry(id).or_default() += 1;
        }
        let duplicates: Vec<Identifier> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, _)| id.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(MigrationError::DuplicateIdentifiers(duplicates));
        }

        if enforce_order {
            let mut expected = identifiers.clone();
            expected.sort();
            if expected != identifiers {
                return Err(MigrationError::IdentifiersOutOfOrder {
                    expected,
                    actual: identifiers,
                });
            }
        }

        let positions = identifiers
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        Ok(Self {
            steps,
            identifiers,
            positions,
        })
    }

    /// Identifiers in registry order.
    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// Steps in registry order.
    pub fn steps(&self) -> &[Step<C>] {
        &self.steps
    }

    /// `(identifier, source_label)` pairs in registry order.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.steps
            .iter()
            .map(|s| ManifestEntry {
                identifier: s.identifier().clone(),
                source_label: s.source_label().to_string(),
            })
            .collect()
    }

    /// Identifiers of steps that declare a rollback, in registry order.
    pub fn reversible_identifiers(&self) -> Vec<&Identifier> {
        self.steps
            .iter()
            .filter(|s| s.is_reversible())
            .map(Step::identifier)
            .collect()
    }

    /// Look up a step by identifier.
    pub fn get(&self, id: &str) -> Option<&Step<C>> {
        self.position(id).map(|i| &self.steps[i])
    }

    /// Registry position of an identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Check if an identifier is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// The last identifier in registry order.
    pub fn last_identifier(&self) -> Option<&Identifier> {
        self.identifiers.last()
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the registry has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
