//! Per-version resolution context

use vqc_tree::{KnownVersions, Version};

/// The version currently being resolved
///
/// Borrowed for the duration of one walk and passed explicitly to every
/// qualifier, so concurrent compilations never observe each other.
/// Carries the selector name when the walk belongs to a [`compile`] call.
///
/// [`compile`]: crate::Compiler::compile
#[derive(Debug, Clone, Copy)]
pub struct VersionContext<'a> {
    version: &'a Version,
    position: usize,
    known: &'a KnownVersions,
    selector: Option<&'a str>,
}

impl<'a> VersionContext<'a> {
    /// Bind `version` within `known`
    ///
    /// Returns `None` if the version is not known.
    #[inline]
    #[must_use]
    pub fn new(known: &'a KnownVersions, version: &'a Version) -> Option<Self> {
        let position = known.position(version)?;
        Some(Self {
            version,
            position,
            known,
            selector: None,
        })
    }

    /// Bind the version at `position`
    #[inline]
    #[must_use]
    pub fn at(known: &'a KnownVersions, position: usize) -> Option<Self> {
        let version = known.get(position)?;
        Some(Self {
            version,
            position,
            known,
            selector: None,
        })
    }

    /// With the name of the version selector being compiled for
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: &'a str) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Current version
    #[inline]
    #[must_use]
    pub fn version(&self) -> &'a Version {
        self.version
    }

    /// Position of the current version in declaration order
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// All versions of this compilation
    #[inline]
    #[must_use]
    pub fn known(&self) -> &'a KnownVersions {
        self.known
    }

    /// Selector name, `None` outside a full compilation
    #[inline]
    #[must_use]
    pub fn selector(&self) -> Option<&'a str> {
        self.selector
    }

    /// Position of another version, if known
    #[inline]
    #[must_use]
    pub fn position_of(&self, version: &Version) -> Option<usize> {
        self.known.position(version)
    }

    /// Check if the current version equals `version`
    #[inline]
    #[must_use]
    pub fn is(&self, version: &Version) -> bool {
        self.version == version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_known_version() {
        let known = KnownVersions::new(["a", "b", "c"]).unwrap();
        let b = Version::new("b");
        let ctx = VersionContext::new(&known, &b).unwrap();
        assert_eq!(ctx.position(), 1);
        assert!(ctx.is(&b));
        assert_eq!(ctx.position_of(&"c".into()), Some(2));
    }

    #[test]
    fn rejects_unknown_version() {
        let known = KnownVersions::new(["a"]).unwrap();
        let z = Version::new("z");
        assert!(VersionContext::new(&known, &z).is_none());
        assert!(VersionContext::at(&known, 1).is_none());
    }

    #[test]
    fn selector_is_carried() {
        let known = KnownVersions::new(["a", "b"]).unwrap();
        let ctx = VersionContext::at(&known, 0).unwrap();
        assert_eq!(ctx.selector(), None);

        let ctx = ctx.with_selector("api-version");
        assert_eq!(ctx.selector(), Some("api-version"));
        assert_eq!(ctx.version(), &Version::new("a"));
    }
}
