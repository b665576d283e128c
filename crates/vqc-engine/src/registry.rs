//! Qualifier registry
//!
//! Maps invocation tags to the resolvers that expand them. The registry is a
//! plain value: build it once, then share it read-only across compilations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use vqc_tree::{Node, Tag};

use crate::context::VersionContext;
use crate::error::QualifierError;

/// What a qualifier expands its invocation into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverResult {
    /// Zero or more replacement nodes, spliced in place of the invocation
    Forms(Vec<Node>),
    /// Remove the enclosing slot entirely
    Delete,
}

impl ResolverResult {
    /// A single replacement node
    #[inline]
    #[must_use]
    pub fn single(node: Node) -> Self {
        Self::Forms(vec![node])
    }

    /// Include `forms` when `condition` holds, delete otherwise
    #[inline]
    #[must_use]
    pub fn include_if(condition: bool, forms: &[Node]) -> Self {
        if condition {
            Self::Forms(forms.to_vec())
        } else {
            Self::Delete
        }
    }
}

/// A resolver bound to one tag
///
/// Implementations must be deterministic for a given context and arguments.
/// Closures with the matching signature implement this trait.
pub trait Qualifier: Send + Sync {
    /// Expand `args` for the version in `ctx`
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError>;
}

impl<F> Qualifier for F
where
    F: Fn(&VersionContext<'_>, &[Node]) -> Result<ResolverResult, QualifierError> + Send + Sync,
{
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        self(ctx, args)
    }
}

/// Tag → qualifier lookup
#[derive(Clone, Default)]
pub struct QualifierRegistry {
    qualifiers: HashMap<Tag, Arc<dyn Qualifier>>,
}

impl QualifierRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            qualifiers: HashMap::new(),
        }
    }

    /// Register a qualifier
    ///
    /// The last registration for a tag wins; the replaced qualifier is
    /// returned so callers overriding a bundled policy can keep it.
    pub fn register(
        &mut self,
        tag: impl Into<Tag>,
        qualifier: impl Qualifier + 'static,
    ) -> Option<Arc<dyn Qualifier>> {
        let tag = tag.into();
        let previous = self.qualifiers.insert(tag.clone(), Arc::new(qualifier));
        if previous.is_some() {
            tracing::debug!(%tag, "qualifier registration overrides an earlier one");
        }
        previous
    }

    /// Register a closure
    ///
    /// Same as [`register`](Self::register); the explicit `Fn` bound lets
    /// closure argument types be inferred.
    pub fn register_fn<F>(&mut self, tag: impl Into<Tag>, f: F) -> Option<Arc<dyn Qualifier>>
    where
        F: Fn(&VersionContext<'_>, &[Node]) -> Result<ResolverResult, QualifierError>
            + Send
            + Sync
            + 'static,
    {
        self.register(tag, f)
    }

    /// Look up the qualifier for a tag
    #[inline]
    #[must_use]
    pub fn lookup(&self, tag: &Tag) -> Option<&dyn Qualifier> {
        self.qualifiers.get(tag).map(|q| &**q)
    }

    /// Check if a tag is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.qualifiers.contains_key(tag)
    }

    /// Check if `node` is an invocation of a registered tag
    #[inline]
    #[must_use]
    pub fn is_invocation(&self, node: &Node) -> bool {
        node.as_invocation()
            .is_some_and(|inv| self.contains(&inv.tag))
    }

    /// Remove a tag, returning its qualifier
    #[inline]
    pub fn remove(&mut self, tag: &Tag) -> Option<Arc<dyn Qualifier>> {
        self.qualifiers.remove(tag)
    }

    /// Registered tags, sorted
    #[must_use]
    pub fn tags(&self) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self.qualifiers.keys().collect();
        tags.sort();
        tags
    }

    /// Number of registered tags
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.qualifiers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qualifiers.is_empty()
    }
}

impl fmt::Debug for QualifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifierRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
