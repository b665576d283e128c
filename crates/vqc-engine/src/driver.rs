//! Version driver
//!
//! Walks the tree once per known version, groups structurally identical
//! results, and emits either a single tree or a minimal dispatch table.

use indexmap::IndexMap;
use rayon::prelude::*;

use vqc_tree::{KnownVersions, Node, Version};

use crate::artifact::{CompiledArtifact, Dispatch, GroupId};
use crate::config::CompileConfig;
use crate::context::VersionContext;
use crate::error::{CompileError, CompileResult, ResolveResult};
use crate::registry::QualifierRegistry;
use crate::resolver::FixedPointResolver;
use crate::walker::TreeWalker;

/// Compiles version-qualified trees against a registry
#[derive(Debug, Clone)]
pub struct Compiler<'r> {
    registry: &'r QualifierRegistry,
    config: CompileConfig,
}

impl<'r> Compiler<'r> {
    /// Create compiler with default configuration
    #[inline]
    #[must_use]
    pub fn new(registry: &'r QualifierRegistry) -> Self {
        Self {
            registry,
            config: CompileConfig::default(),
        }
    }

    /// Replace configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: CompileConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    fn walker(&self) -> TreeWalker<'r> {
        TreeWalker::new(FixedPointResolver::new(self.registry).with_max_passes(self.config.max_passes))
    }

    /// Resolve `tree` for one version
    ///
    /// # Errors
    /// [`CompileError::VersionNotKnown`] if `version` is not in `known`,
    /// otherwise any resolution error
    pub fn resolve_version(
        &self,
        known: &KnownVersions,
        version: &Version,
        tree: &Node,
    ) -> CompileResult<Node> {
        self.config.validate()?;
        let ctx = VersionContext::new(known, version).ok_or_else(|| CompileError::VersionNotKnown {
            version: version.clone(),
            known: known.to_vec(),
        })?;
        Ok(self.walker().walk(tree, &ctx)?)
    }

    /// Resolve `tree` for every known version, in declaration order
    ///
    /// # Errors
    /// The first resolution error encountered
    pub fn resolve_all(
        &self,
        known: &KnownVersions,
        tree: &Node,
    ) -> CompileResult<Vec<(Version, Node)>> {
        self.resolve_for(None, known, tree)
    }

    fn resolve_for(
        &self,
        selector: Option<&str>,
        known: &KnownVersions,
        tree: &Node,
    ) -> CompileResult<Vec<(Version, Node)>> {
        self.config.validate()?;
        let walker = self.walker();
        let contexts: Vec<VersionContext<'_>> = (0..known.len())
            .filter_map(|position| VersionContext::at(known, position))
            .map(|ctx| match selector {
                Some(selector) => ctx.with_selector(selector),
                None => ctx,
            })
            .collect();

        let resolved: Vec<Node> = if self.config.parallel {
            contexts
                .par_iter()
                .map(|ctx| walker.walk(tree, ctx))
                .collect::<ResolveResult<_>>()?
        } else {
            contexts
                .iter()
                .map(|ctx| walker.walk(tree, ctx))
                .collect::<ResolveResult<_>>()?
        };

        Ok(known.iter().cloned().zip(resolved).collect())
    }

    /// Compile `tree` for every known version
    ///
    /// Versions whose resolved trees are structurally equal share a group.
    /// Group ids follow first appearance in declaration order, so output is
    /// deterministic. When every version agrees the dispatch table is elided.
    ///
    /// # Errors
    /// - [`CompileError::EmptyVersionSet`] if `known` is empty
    /// - any resolution error, for any version
    pub fn compile(
        &self,
        selector: &str,
        known: &KnownVersions,
        tree: &Node,
    ) -> CompileResult<CompiledArtifact> {
        if known.is_empty() {
            return Err(CompileError::EmptyVersionSet {
                selector: selector.to_string(),
            });
        }

        tracing::info!(
            selector,
            versions = known.len(),
            parallel = self.config.parallel,
            "compiling version-qualified tree"
        );
        let resolved = self.resolve_for(Some(selector), known, tree)?;

        let mut groups: IndexMap<Node, GroupId> = IndexMap::new();
        let mut version_to_group = IndexMap::with_capacity(resolved.len());
        for (version, tree) in resolved {
            let next = GroupId::new(groups.len());
            let group = *groups.entry(tree).or_insert(next);
            version_to_group.insert(version, group);
        }

        if groups.len() == 1 {
            if let Some((tree, _)) = groups.pop() {
                tracing::info!(selector, "all versions agree; dispatch elided");
                return Ok(CompiledArtifact::Resolved(tree));
            }
        }

        tracing::info!(
            selector,
            versions = known.len(),
            groups = groups.len(),
            "built version dispatch"
        );
        let group_to_tree = groups.into_iter().map(|(tree, id)| (id, tree)).collect();
        Ok(CompiledArtifact::Dispatch(Dispatch::new(
            selector.to_string(),
            known.clone(),
            version_to_group,
            group_to_tree,
        )))
    }
}

/// Compile with default configuration
///
/// # Errors
/// See [`Compiler::compile`]
pub fn compile(
    registry: &QualifierRegistry,
    selector: &str,
    known: &KnownVersions,
    tree: &Node,
) -> CompileResult<CompiledArtifact> {
    Compiler::new(registry).compile(selector, known, tree)
}
