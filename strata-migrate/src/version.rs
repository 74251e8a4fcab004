//! Migration identifiers and schema versions.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};

/// Globally unique name of a migration step.
///
/// By convention identifiers look like `NNNN_description`, so that byte-wise
/// lexicographic order is the intended chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Render an identifier for a schema version.
    ///
    /// Components are zero padded to the width of `u32::MAX`, so
    /// lexicographic order of the identifiers matches semantic order of the
    /// versions for every representable version.
    pub fn for_version(version: &SchemaVersion, description: &str) -> Self {
        Self(format!(
            "{:010}.{:010}.{:010}_{}",
            version.major, version.minor, version.patch, description
        ))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading ordering segment (text before the first `_`).
    pub fn prefix(&self) -> &str {
        self.0.split_once('_').map_or(self.0.as_str(), |(p, _)| p)
    }

    /// Human readable part after the first `_`, if any.
    pub fn description(&self) -> Option<&str> {
        self.0.split_once('_').map(|(_, d)| d)
    }

    /// Parse the schema version encoded by [`Identifier::for_version`].
    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.prefix().parse().ok()
    }

    /// Consume the identifier, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for Identifier {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl From<&Identifier> for Identifier {
    fn from(id: &Identifier) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A semantic schema version (`MAJOR.MINOR.PATCH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
    /// Patch component.
    pub patch: u32,
}

impl SchemaVersion {
    /// Create a version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string, accepting an optional leading `v`.
    pub fn parse(text: &str) -> MigrateResult<Self> {
        let trimmed = text.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let mut parts = body.split('.');
        let mut next = || -> MigrateResult<u32> {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| MigrationError::InvalidVersion(text.to_string()))
        };

        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(MigrationError::InvalidVersion(text.to_string()));
        }
        Ok(version)
    }
}

impl FromStr for SchemaVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parts() {
        let id = Identifier::new("0001_create_items");
        assert_eq!(id.prefix(), "0001");
        assert_eq!(id.description(), Some("create_items"));

        let bare = Identifier::new("baseline");
        assert_eq!(bare.prefix(), "baseline");
        assert_eq!(bare.description(), None);
    }

    #[test]
    fn test_identifier_ordering_is_lexicographic() {
        let mut ids = vec![
            Identifier::from("0010_b"),
            Identifier::from("0002_a"),
            Identifier::from("0002_A"),
        ];
        ids.sort();
        assert_eq!(ids, vec!["0002_A", "0002_a", "0010_b"]);
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(SchemaVersion::parse("1.2.3").unwrap(), SchemaVersion::new(1, 2, 3));
        assert_eq!(SchemaVersion::parse("v10.0.1").unwrap(), SchemaVersion::new(10, 0, 1));
        assert!(SchemaVersion::parse("1.2").is_err());
        assert!(SchemaVersion::parse("1.2.3.4").is_err());
        assert!(SchemaVersion::parse("1.x.3").is_err());
    }

    #[test]
    fn test_version_ordering_is_semantic() {
        let a: SchemaVersion = "1.2.0".parse().unwrap();
        let b: SchemaVersion = "1.10.0".parse().unwrap();
        assert!(a < b);
        assert_eq!(b.to_string(), "1.10.0");
    }

    #[test]
    fn test_version_identifier_round_trip_keeps_order() {
        let a = Identifier::for_version(&SchemaVersion::new(1, 2, 0), "add_tags");
        let b = Identifier::for_version(&SchemaVersion::new(1, 10, 0), "add_notes");

        assert_eq!(a.as_str(), "0000000001.0000000002.0000000000_add_tags");
        assert!(a < b);
        assert_eq!(b.schema_version(), Some(SchemaVersion::new(1, 10, 0)));
        assert_eq!(Identifier::from("0001_items").schema_version(), None);
    }

    #[test]
    fn test_version_identifiers_order_past_four_digits() {
        let versions = [
            SchemaVersion::new(9_999, 0, 0),
            SchemaVersion::new(10_000, 0, 0),
            SchemaVersion::new(10_000, 99_999, 3),
            SchemaVersion::new(u32::MAX, u32::MAX, u32::MAX),
        ];
        let ids: Vec<Identifier> = versions
            .iter()
            .map(|v| Identifier::for_version(v, "step"))
            .collect();

        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids[3].schema_version(), Some(versions[3]));
    }
}
