//! Compilation output and runtime selection
//!
//! A [`CompiledArtifact`] is either one tree shared by every version, or a
//! [`Dispatch`] table whose emitted size is bounded by the number of distinct
//! outcomes rather than the number of versions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use vqc_tree::{ContentHash, KnownVersions, Node, Version};

use crate::error::{ArtifactError, DispatchError};

/// Identifier of one group of versions sharing a resolved tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(usize);

impl GroupId {
    /// Create a group id
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Numeric index, dense from zero in first-appearance order
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// Version → group → tree selection table
///
/// Deserialization runs [`Dispatch::validate`], so a table read back from
/// storage is total over its known versions and carries no stray groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDispatch")]
pub struct Dispatch {
    selector: String,
    known_versions: KnownVersions,
    version_to_group: IndexMap<Version, GroupId>,
    group_to_tree: IndexMap<GroupId, Node>,
}

#[derive(Deserialize)]
struct RawDispatch {
    selector: String,
    known_versions: KnownVersions,
    version_to_group: IndexMap<Version, GroupId>,
    group_to_tree: IndexMap<GroupId, Node>,
}

impl TryFrom<RawDispatch> for Dispatch {
    type Error = ArtifactError;

    fn try_from(raw: RawDispatch) -> Result<Self, Self::Error> {
        let dispatch = Self::new(
            raw.selector,
            raw.known_versions,
            raw.version_to_group,
            raw.group_to_tree,
        );
        dispatch.validate()?;
        Ok(dispatch)
    }
}

impl Dispatch {
    pub(crate) fn new(
        selector: String,
        known_versions: KnownVersions,
        version_to_group: IndexMap<Version, GroupId>,
        group_to_tree: IndexMap<GroupId, Node>,
    ) -> Self {
        Self {
            selector,
            known_versions,
            version_to_group,
            group_to_tree,
        }
    }

    /// Name of the runtime value carrying the current version
    #[inline]
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Versions this table covers
    #[inline]
    #[must_use]
    pub fn known_versions(&self) -> &KnownVersions {
        &self.known_versions
    }

    /// Total map from every known version to its group
    #[inline]
    #[must_use]
    pub fn version_to_group(&self) -> &IndexMap<Version, GroupId> {
        &self.version_to_group
    }

    /// One pairwise-distinct tree per group
    #[inline]
    #[must_use]
    pub fn group_to_tree(&self) -> &IndexMap<GroupId, Node> {
        &self.group_to_tree
    }

    /// Number of distinct trees
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.group_to_tree.len()
    }

    /// Group of a version
    #[inline]
    #[must_use]
    pub fn group_of(&self, version: &Version) -> Option<GroupId> {
        self.version_to_group.get(version).copied()
    }

    /// Tree of a group
    #[inline]
    #[must_use]
    pub fn tree(&self, group: GroupId) -> Option<&Node> {
        self.group_to_tree.get(&group)
    }

    /// Versions sharing a group, in declaration order
    #[must_use]
    pub fn versions_in(&self, group: GroupId) -> Vec<&Version> {
        self.version_to_group
            .iter()
            .filter(|(_, g)| **g == group)
            .map(|(v, _)| v)
            .collect()
    }

    /// Structural fingerprint of a group's tree
    ///
    /// Stable names for shared code paths in emitted output.
    #[inline]
    #[must_use]
    pub fn group_fingerprint(&self, group: GroupId) -> Option<ContentHash> {
        self.tree(group).map(Node::fingerprint)
    }

    /// Check the table is well formed
    ///
    /// Every known version maps to a group, in declaration order; every
    /// group has exactly one tree; every tree is selected by some version;
    /// no two groups carry the same tree.
    ///
    /// # Errors
    /// The first inconsistency found
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let known = &self.known_versions;
        if let Some(version) = self.version_to_group.keys().find(|v| !known.contains(v)) {
            return Err(ArtifactError::UnknownVersion {
                version: version.clone(),
                known: known.to_vec(),
            });
        }
        if let Some(version) = known.iter().find(|v| !self.version_to_group.contains_key(*v)) {
            return Err(ArtifactError::UngroupedVersion {
                version: version.clone(),
            });
        }
        if !self.version_to_group.keys().eq(known.iter()) {
            return Err(ArtifactError::OutOfOrder {
                grouped: self.version_to_group.keys().cloned().collect(),
            });
        }

        for (version, group) in &self.version_to_group {
            if !self.group_to_tree.contains_key(group) {
                return Err(ArtifactError::MissingTree {
                    version: version.clone(),
                    group: *group,
                });
            }
        }

        let mut seen: IndexMap<&Node, GroupId> = IndexMap::with_capacity(self.group_to_tree.len());
        for (group, tree) in &self.group_to_tree {
            if !self.version_to_group.values().any(|g| g == group) {
                return Err(ArtifactError::UnusedGroup { group: *group });
            }
            if let Some(first) = seen.insert(tree, *group) {
                return Err(ArtifactError::DuplicateTree {
                    first,
                    second: *group,
                });
            }
        }
        Ok(())
    }

    /// Select the tree for the runtime-bound version
    ///
    /// # Errors
    /// [`DispatchError::UnboundOrUnknownRuntimeVersion`] if `current` is
    /// `None` or not a known version
    pub fn select(&self, current: Option<&Version>) -> Result<&Node, DispatchError> {
        current
            .and_then(|version| self.group_of(version))
            .and_then(|group| self.tree(group))
            .ok_or_else(|| DispatchError::UnboundOrUnknownRuntimeVersion {
                selector: self.selector.clone(),
                value: current.cloned(),
                known: self.known_versions.to_vec(),
            })
    }
}

/// Result of compiling a tree for every known version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompiledArtifact {
    /// Every version resolved to this tree
    Resolved(Node),
    /// Versions disagree; select at runtime
    Dispatch(Dispatch),
}

impl CompiledArtifact {
    /// Check if the dispatch table was elided
    #[inline]
    #[must_use]
    pub fn is_elided(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Number of distinct trees carried
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        match self {
            Self::Resolved(_) => 1,
            Self::Dispatch(dispatch) => dispatch.group_count(),
        }
    }

    /// Borrow the dispatch table, if any
    #[inline]
    #[must_use]
    pub fn as_dispatch(&self) -> Option<&Dispatch> {
        match self {
            Self::Resolved(_) => None,
            Self::Dispatch(dispatch) => Some(dispatch),
        }
    }

    /// Select the tree for the runtime-bound version
    ///
    /// A resolved artifact carries no version sensitivity and ignores
    /// `current`.
    ///
    /// # Errors
    /// See [`Dispatch::select`]
    pub fn select(&self, current: Option<&Version>) -> Result<&Node, DispatchError> {
        match self {
            Self::Resolved(tree) => Ok(tree),
            Self::Dispatch(dispatch) => dispatch.select(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn dispatch() -> Dispatch {
        let known = KnownVersions::new(["v0", "v1", "v2"]).unwrap();
        let version_to_group = IndexMap::from([
            (Version::new("v0"), GroupId::new(0)),
            (Version::new("v1"), GroupId::new(1)),
            (Version::new("v2"), GroupId::new(1)),
        ]);
        let group_to_tree = IndexMap::from([
            (GroupId::new(0), Node::seq([])),
            (GroupId::new(1), Node::seq([Node::str("x")])),
        ]);
        Dispatch::new("api".to_string(), known, version_to_group, group_to_tree)
    }

    #[test]
    fn select_known_version() {
        let dispatch = dispatch();
        let tree = dispatch.select(Some(&"v2".into())).unwrap();
        assert_eq!(tree, &Node::seq([Node::str("x")]));
    }

    #[test]
    fn select_unbound() {
        let err = dispatch().select(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnboundOrUnknownRuntimeVersion);
        assert!(err.to_string().contains("`api` is not bound"));
    }

    #[test]
    fn select_unknown() {
        let err = dispatch().select(Some(&"v9".into())).unwrap_err();
        let DispatchError::UnboundOrUnknownRuntimeVersion { selector, value, known } = err;
        assert_eq!(selector, "api");
        assert_eq!(value, Some(Version::new("v9")));
        assert_eq!(known.len(), 3);
    }

    #[test]
    fn versions_in_group() {
        let dispatch = dispatch();
        let names: Vec<&str> = dispatch
            .versions_in(GroupId::new(1))
            .into_iter()
            .map(Version::as_str)
            .collect();
        assert_eq!(names, vec!["v1", "v2"]);
    }

    #[test]
    fn group_fingerprints_differ() {
        let dispatch = dispatch();
        assert_ne!(
            dispatch.group_fingerprint(GroupId::new(0)),
            dispatch.group_fingerprint(GroupId::new(1))
        );
        assert!(dispatch.group_fingerprint(GroupId::new(7)).is_none());
    }

    #[test]
    fn resolved_ignores_current_version() {
        let artifact = CompiledArtifact::Resolved(Node::int(1));
        assert!(artifact.is_elided());
        assert_eq!(artifact.group_count(), 1);
        assert_eq!(artifact.select(None).unwrap(), &Node::int(1));
    }

    #[test]
    fn dispatch_json_round_trip() {
        let artifact = CompiledArtifact::Dispatch(dispatch());
        let json = serde_json::to_string(&artifact).unwrap();
        let decoded: CompiledArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(artifact, decoded);
    }

    fn decode(edit: impl FnOnce(&mut serde_json::Value)) -> Result<Dispatch, serde_json::Error> {
        let mut json = serde_json::to_value(dispatch()).unwrap();
        edit(&mut json);
        serde_json::from_value(json)
    }

    #[test]
    fn dispatch_json_rejects_partial_table() {
        let err = decode(|json| {
            json["version_to_group"].as_object_mut().unwrap().remove("v2");
        })
        .unwrap_err();
        assert!(err.to_string().contains("version v2 has no group"));

        let err = decode(|json| {
            json["group_to_tree"].as_object_mut().unwrap().remove("0");
        })
        .unwrap_err();
        assert!(err.to_string().contains("points at group-0"));
    }

    #[test]
    fn dispatch_json_rejects_stray_entries() {
        let err = decode(|json| {
            json["version_to_group"]["v9"] = serde_json::json!(0);
        })
        .unwrap_err();
        assert!(err.to_string().contains("v9 is not one of the known versions"));

        let err = decode(|json| {
            json["group_to_tree"]["2"] = serde_json::json!({"Scalar": "Nil"});
        })
        .unwrap_err();
        assert!(err.to_string().contains("group-2 is not selected"));

        let err = decode(|json| {
            let first = json["group_to_tree"]["0"].clone();
            json["group_to_tree"]["1"] = first;
        })
        .unwrap_err();
        assert!(err.to_string().contains("group-0 and group-1 carry the same tree"));
    }

    #[test]
    fn validate_accepts_compiled_table() {
        let dispatch = dispatch();
        assert_eq!(dispatch.validate(), Ok(()));

        let reordered = Dispatch::new(
            "api".to_string(),
            dispatch.known_versions().clone(),
            dispatch.version_to_group().iter().rev().map(|(v, g)| (v.clone(), *g)).collect(),
            dispatch.group_to_tree().clone(),
        );
        let err = reordered.validate().unwrap_err();
        assert!(matches!(err, ArtifactError::OutOfOrder { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArtifact);
    }
}
