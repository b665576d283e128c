//! Registration of the bundled qualifiers

use std::sync::Arc;

use vqc_engine::QualifierRegistry;

use crate::feature::{Feature, FeatureCase};
use crate::manifest::FeatureManifest;
use crate::ordered::{Added, Changed, Only, Removed};
use crate::switch::Switch;
use crate::tags;

/// The ordered-version qualifiers: `only`, `added`, `removed`, `switch`, `changed`
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionPolicies;

impl VersionPolicies {
    /// Create the bundle
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Register every qualifier, overriding existing tags of the same name
    pub fn register_into(&self, registry: &mut QualifierRegistry) {
        registry.register(tags::ONLY, Only);
        registry.register(tags::ADDED, Added);
        registry.register(tags::REMOVED, Removed);
        registry.register(tags::SWITCH, Switch);
        registry.register(tags::CHANGED, Changed);
        tracing::debug!(count = 5, "registered version policies");
    }
}

/// The feature-flag qualifiers: `feature`, `feature-case`
#[derive(Debug, Clone)]
pub struct FeaturePolicies {
    manifest: Arc<FeatureManifest>,
}

impl FeaturePolicies {
    /// Create the bundle over a manifest
    #[must_use]
    pub fn new(manifest: FeatureManifest) -> Self {
        Self {
            manifest: Arc::new(manifest),
        }
    }

    /// The captured manifest
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &FeatureManifest {
        &self.manifest
    }

    /// Register every qualifier, overriding existing tags of the same name
    pub fn register_into(&self, registry: &mut QualifierRegistry) {
        registry.register(tags::FEATURE, Feature::new(Arc::clone(&self.manifest)));
        registry.register(tags::FEATURE_CASE, FeatureCase::new(Arc::clone(&self.manifest)));
        tracing::debug!(
            versions = self.manifest.len(),
            flags = self.manifest.known_flags().len(),
            "registered feature policies"
        );
    }
}

/// Register the version policies, plus the feature policies when a manifest
/// is supplied
pub fn register_defaults(registry: &mut QualifierRegistry, manifest: Option<FeatureManifest>) {
    VersionPolicies::new().register_into(registry);
    if let Some(manifest) = manifest {
        FeaturePolicies::new(manifest).register_into(registry);
    }
}

/// Registry holding the default policies
#[must_use]
pub fn default_registry(manifest: Option<FeatureManifest>) -> QualifierRegistry {
    let mut registry = QualifierRegistry::new();
    register_defaults(&mut registry, manifest);
    registry
}
