//! Feature manifest: which flags each version ships

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use vqc_tree::{KnownVersions, Version};

/// Errors loading a feature manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// TOML syntax or schema error
    #[error("invalid feature manifest TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or schema error
    #[error("invalid feature manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Version → enabled feature flags
///
/// A version absent from the manifest has no flags enabled.
///
/// # Example
///
/// ```rust
/// use vqc_policies::FeatureManifest;
///
/// let manifest = FeatureManifest::from_toml(r#"
///     v0 = ["A"]
///     v1 = ["A", "B"]
/// "#).unwrap();
///
/// assert!(manifest.is_enabled(&"v1".into(), "B"));
/// assert!(!manifest.is_enabled(&"v0".into(), "B"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureManifest {
    flags: IndexMap<Version, IndexSet<String>>,
}

impl FeatureManifest {
    /// Create empty manifest
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With the flags of one version, replacing any previous entry
    #[must_use]
    pub fn with_version<I, S>(mut self, version: impl Into<Version>, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(version, flags);
        self
    }

    /// Set the flags of one version, replacing any previous entry
    pub fn insert<I, S>(&mut self, version: impl Into<Version>, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags
            .insert(version.into(), flags.into_iter().map(Into::into).collect());
    }

    /// Parse from TOML, one `version = [flags]` entry per line
    ///
    /// # Errors
    /// Returns error if TOML is invalid
    pub fn from_toml(source: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(source)?)
    }

    /// Parse from a JSON object of version → flag list
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Flags of one version
    #[must_use]
    pub fn flags_for(&self, version: &Version) -> Option<&IndexSet<String>> {
        self.flags.get(version)
    }

    /// Check if `flag` is enabled for `version`
    #[must_use]
    pub fn is_enabled(&self, version: &Version, flag: &str) -> bool {
        self.flags_for(version).is_some_and(|flags| flags.contains(flag))
    }

    /// Check if any version mentions `flag`
    #[must_use]
    pub fn is_known_flag(&self, flag: &str) -> bool {
        self.flags.values().any(|flags| flags.contains(flag))
    }

    /// Versions listed in the manifest, in declaration order
    #[must_use]
    pub fn known_versions(&self) -> KnownVersions {
        self.flags.keys().cloned().collect::<IndexSet<_>>().into()
    }

    /// Every flag mentioned, in first-appearance order
    #[must_use]
    pub fn known_flags(&self) -> IndexSet<&str> {
        self.flags
            .values()
            .flat_map(|flags| flags.iter().map(String::as_str))
            .collect()
    }

    /// Number of versions listed
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Check if no version is listed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
