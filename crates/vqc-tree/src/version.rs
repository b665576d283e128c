//! Version identifiers
//!
//! [`Version`] is an opaque identifier for one variant of generated content.
//! [`KnownVersions`] is the ordered, duplicate-free set of versions a
//! compilation targets.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::{Node, Scalar};

/// Opaque version identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Create a version from its name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Version name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read a version out of a scalar node
    ///
    /// Strings and symbols name a version directly; integers use their
    /// decimal form. Any other node is not a version.
    #[must_use]
    pub fn from_node(node: &Node) -> Option<Self> {
        match node {
            Node::Scalar(Scalar::Str(s) | Scalar::Symbol(s)) => Some(Self::new(s.as_str())),
            Node::Scalar(Scalar::Int(i)) => Some(Self::new(i.to_string())),
            _ => None,
        }
    }

    /// The node form of this version (a string scalar)
    #[inline]
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::str(self.0.as_str())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered set of versions targeted by one compilation
///
/// Order matters only to conditionals that compare positions
/// (`added`, `removed`, `changed`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Version>", into = "Vec<Version>")]
pub struct KnownVersions {
    versions: IndexSet<Version>,
}

impl KnownVersions {
    /// Build from an ordered list of versions
    ///
    /// # Errors
    /// Returns [`VersionError::Duplicate`] if a version appears twice
    pub fn new<I, V>(versions: I) -> Result<Self, VersionError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Version>,
    {
        let mut set = IndexSet::new();
        for version in versions {
            let version = version.into();
            if set.contains(&version) {
                return Err(VersionError::Duplicate(version));
            }
            set.insert(version);
        }
        Ok(Self { versions: set })
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        self.versions.contains(version)
    }

    /// Position of a version in declaration order
    #[inline]
    #[must_use]
    pub fn position(&self, version: &Version) -> Option<usize> {
        self.versions.get_index_of(version)
    }

    /// Iterate in declaration order
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Version> {
        self.versions.iter()
    }

    /// Version at a position
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Version> {
        self.versions.get_index(index)
    }

    /// Number of versions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Check if there are no versions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Copy out as a plain list
    #[must_use]
    pub fn to_vec(&self) -> Vec<Version> {
        self.versions.iter().cloned().collect()
    }
}

impl fmt::Display for KnownVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, version) in self.versions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{version}")?;
        }
        f.write_str("]")
    }
}

impl<'a> IntoIterator for &'a KnownVersions {
    type Item = &'a Version;
    type IntoIter = indexmap::set::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

impl TryFrom<Vec<Version>> for KnownVersions {
    type Error = VersionError;

    fn try_from(value: Vec<Version>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IndexSet<Version>> for KnownVersions {
    fn from(versions: IndexSet<Version>) -> Self {
        Self { versions }
    }
}

impl From<KnownVersions> for Vec<Version> {
    fn from(value: KnownVersions) -> Self {
        value.versions.into_iter().collect()
    }
}

/// Errors building version sets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// A version was listed twice
    #[error("duplicate version: {0}")]
    Duplicate(Version),
}
