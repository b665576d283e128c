//! Fixed-point resolution of a single node
//!
//! A qualifier may expand into further invocations (layered conditionals).
//! [`FixedPointResolver`] re-expands until a pass changes nothing, bounded by
//! a pass limit so cyclic qualifiers fail instead of spinning.

use std::fmt;

use vqc_tree::Node;

use crate::context::VersionContext;
use crate::error::{ResolveError, ResolveResult};
use crate::registry::{QualifierRegistry, ResolverResult};

/// Default bound on re-expansion passes
pub const DEFAULT_MAX_PASSES: usize = 10;

/// One element of an in-progress resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    /// A node, possibly still an invocation
    Node(Node),
    /// Placeholder for a deleted slot
    Delete,
}

impl Form {
    /// Borrow the node, if this is not a deletion
    #[inline]
    #[must_use]
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Delete => None,
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node) => write!(f, "{node}"),
            Self::Delete => f.write_str("<delete>"),
        }
    }
}

/// Expands a node against the registry until it stops changing
#[derive(Debug, Clone, Copy)]
pub struct FixedPointResolver<'r> {
    registry: &'r QualifierRegistry,
    max_passes: usize,
}

impl<'r> FixedPointResolver<'r> {
    /// Create resolver with [`DEFAULT_MAX_PASSES`]
    #[inline]
    #[must_use]
    pub fn new(registry: &'r QualifierRegistry) -> Self {
        Self {
            registry,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Override the pass limit
    #[inline]
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Configured pass limit
    #[inline]
    #[must_use]
    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Resolve `node` to its stable list of forms
    ///
    /// Non-invocations resolve to themselves. The result may contain
    /// [`Form::Delete`] placeholders; callers decide what a deletion means
    /// for the slot being resolved.
    ///
    /// # Errors
    /// - [`ResolveError::PassLimitExceeded`] if no fixed point is reached
    /// - [`ResolveError::UnknownQualifier`] for an unregistered tag
    /// - [`ResolveError::Qualifier`] if a qualifier rejects its arguments
    pub fn resolve(&self, node: &Node, ctx: &VersionContext<'_>) -> ResolveResult<Vec<Form>> {
        if !matches!(node, Node::Invocation(_)) {
            return Ok(vec![Form::Node(node.clone())]);
        }

        let mut forms = vec![Form::Node(node.clone())];
        for pass in 0..=self.max_passes {
            let next = self.expand(&forms, ctx)?;
            if next == forms {
                tracing::trace!(version = %ctx.version(), pass, forms = forms.len(), "fixed point reached");
                return Ok(forms);
            }
            forms = next;
        }

        Err(ResolveError::PassLimitExceeded {
            node: Box::new(node.clone()),
            version: ctx.version().clone(),
            max_passes: self.max_passes,
            last_forms: forms,
        })
    }

    /// One pass: expand every invocation form once
    fn expand(&self, forms: &[Form], ctx: &VersionContext<'_>) -> ResolveResult<Vec<Form>> {
        let mut next = Vec::with_capacity(forms.len());
        for form in forms {
            let Form::Node(Node::Invocation(inv)) = form else {
                next.push(form.clone());
                continue;
            };

            let qualifier =
                self.registry
                    .lookup(&inv.tag)
                    .ok_or_else(|| ResolveError::UnknownQualifier {
                        tag: inv.tag.clone(),
                        version: ctx.version().clone(),
                    })?;

            match qualifier
                .resolve(ctx, &inv.args)
                .map_err(|source| ResolveError::qualifier(&inv.tag, ctx.version(), source))?
            {
                ResolverResult::Forms(nodes) => next.extend(nodes.into_iter().map(Form::Node)),
                ResolverResult::Delete => next.push(Form::Delete),
            }
        }
        Ok(next)
    }
}
