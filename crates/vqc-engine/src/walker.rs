//! Whole-tree rewriting for one version
//!
//! Top-down: each collection's slots are resolved first, then the walker
//! descends into the surviving children. Descending after rewriting resolves
//! qualifiers at any depth, including depth introduced by an expansion.

use indexmap::IndexSet;
use vqc_tree::{Mapping, Node};

use crate::context::VersionContext;
use crate::error::{ResolveError, ResolveResult, SlotKind};
use crate::resolver::{FixedPointResolver, Form};

/// Rewrites a tree for a single version
#[derive(Debug, Clone, Copy)]
pub struct TreeWalker<'r> {
    resolver: FixedPointResolver<'r>,
}

impl<'r> TreeWalker<'r> {
    /// Create walker over a resolver
    #[inline]
    #[must_use]
    pub fn new(resolver: FixedPointResolver<'r>) -> Self {
        Self { resolver }
    }

    /// Rewrite `tree` for the version in `ctx`
    ///
    /// # Errors
    /// - [`ResolveError::RootMultiplicityViolation`] if `tree` is an
    ///   invocation that does not resolve to exactly one node
    /// - [`ResolveError::MultiFormInSlot`] if a mapping slot does not
    ///   resolve to exactly one node or a deletion
    /// - any error of [`FixedPointResolver::resolve`]
    pub fn walk(&self, tree: &Node, ctx: &VersionContext<'_>) -> ResolveResult<Node> {
        tracing::debug!(version = %ctx.version(), "walking tree");
        match tree {
            Node::Invocation(_) => {
                let root = self.resolve_root(tree, ctx)?;
                self.rewrite(&root, ctx)
            }
            _ => self.rewrite(tree, ctx),
        }
    }

    fn resolve_root(&self, tree: &Node, ctx: &VersionContext<'_>) -> ResolveResult<Node> {
        let forms = self.resolver.resolve(tree, ctx)?;
        let forms = match <[Form; 1]>::try_from(forms) {
            Ok([Form::Node(node)]) => return Ok(node),
            Ok([Form::Delete]) => vec![Form::Delete],
            Err(forms) => forms,
        };
        Err(ResolveError::RootMultiplicityViolation {
            node: Box::new(tree.clone()),
            version: ctx.version().clone(),
            forms,
        })
    }

    /// Rewrite a node that is already in its final slot
    fn rewrite(&self, node: &Node, ctx: &VersionContext<'_>) -> ResolveResult<Node> {
        match node {
            // An invocation only survives resolution as its own fixed point.
            Node::Scalar(_) | Node::Invocation(_) => Ok(node.clone()),
            Node::Sequence(items) => {
                let items = self.splice(items, ctx)?;
                let rewritten = items
                    .iter()
                    .map(|item| self.rewrite(item, ctx))
                    .collect::<ResolveResult<Vec<_>>>()?;
                Ok(Node::Sequence(rewritten))
            }
            Node::Set(items) => {
                let items = self.splice(items, ctx)?;
                let rewritten = items
                    .iter()
                    .map(|item| self.rewrite(item, ctx))
                    .collect::<ResolveResult<IndexSet<_>>>()?;
                Ok(Node::Set(rewritten))
            }
            Node::Mapping(mapping) => self.rewrite_mapping(mapping, ctx).map(Node::Mapping),
        }
    }

    /// Resolve every element and splice the results, dropping deletions
    fn splice<'n>(
        &self,
        items: impl IntoIterator<Item = &'n Node>,
        ctx: &VersionContext<'_>,
    ) -> ResolveResult<Vec<Node>> {
        let mut out = Vec::new();
        for item in items {
            for form in self.resolver.resolve(item, ctx)? {
                if let Form::Node(node) = form {
                    out.push(node);
                }
            }
        }
        Ok(out)
    }

    fn rewrite_mapping(&self, mapping: &Mapping, ctx: &VersionContext<'_>) -> ResolveResult<Mapping> {
        let mut out = Mapping::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = self.resolve_slot(key, SlotKind::Key, ctx)?;
            let value = self.resolve_slot(value, SlotKind::Value, ctx)?;
            let (Some(key), Some(value)) = (key, value) else {
                continue;
            };

            let key = self.rewrite(&key, ctx)?;
            let value = self.rewrite(&value, ctx)?;
            if out.insert(key, value).is_some() {
                tracing::warn!(
                    version = %ctx.version(),
                    "mapping keys collided after resolution; the later pair wins"
                );
            }
        }
        Ok(out)
    }

    /// Resolve a mapping slot: `Some(node)`, or `None` when deleted
    fn resolve_slot(
        &self,
        slot: &Node,
        kind: SlotKind,
        ctx: &VersionContext<'_>,
    ) -> ResolveResult<Option<Node>> {
        let forms = self.resolver.resolve(slot, ctx)?;
        match <[Form; 1]>::try_from(forms) {
            Ok([Form::Node(node)]) => Ok(Some(node)),
            Ok([Form::Delete]) => Ok(None),
            Err(forms) => Err(ResolveError::MultiFormInSlot {
                slot: kind,
                node: Box::new(slot.clone()),
                version: ctx.version().clone(),
                count: forms.len(),
            }),
        }
    }
}
