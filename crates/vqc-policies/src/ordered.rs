//! Ordered-version qualifiers
//!
//! `only`, `added`, `removed` and `changed` decide by membership in, or
//! position within, the declaration order of the known versions.

use vqc_engine::{Qualifier, QualifierError, ResolverResult, VersionContext};
use vqc_tree::Node;

use crate::args;

/// `only(set, forms...)`: forms iff the current version is in `set`
///
/// `set` is a set or sequence of version identifiers. Members are not
/// checked against the known versions, so an empty set never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct Only;

impl Qualifier for Only {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let (set, forms) = args::split_head(args, "only(set, forms...)")?;
        let members: Vec<&Node> = match set {
            Node::Set(items) => items.iter().collect(),
            Node::Sequence(items) => items.iter().collect(),
            other => {
                return Err(QualifierError::invalid_arguments(format!(
                    "only expects a set of versions, got `{other}`"
                )))
            }
        };

        let mut matched = false;
        for member in members {
            matched |= ctx.is(&args::version(member)?);
        }
        Ok(ResolverResult::include_if(matched, forms))
    }
}

/// `added(v, forms...)`: forms at and after `v`
#[derive(Debug, Clone, Copy, Default)]
pub struct Added;

impl Qualifier for Added {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let (since, forms) = args::split_head(args, "added(v, forms...)")?;
        let since = args::known_position(ctx, since)?;
        Ok(ResolverResult::include_if(ctx.position() >= since, forms))
    }
}

/// `removed(v, forms...)`: forms strictly before `v`
#[derive(Debug, Clone, Copy, Default)]
pub struct Removed;

impl Qualifier for Removed {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let (until, forms) = args::split_head(args, "removed(v, forms...)")?;
        let until = args::known_position(ctx, until)?;
        Ok(ResolverResult::include_if(ctx.position() < until, forms))
    }
}

/// `changed(base, v1, f1, v2, f2, ...)`: a value with a change log
///
/// The active form is the one whose breakpoint sits latest in declaration
/// order without passing the current version; before every breakpoint it
/// is `base`. Breakpoints may be listed in any order and are all
/// validated, whichever version is current.
#[derive(Debug, Clone, Copy, Default)]
pub struct Changed;

impl Qualifier for Changed {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let (base, breakpoints) = args::split_head(args, "changed(base, v1, f1, ...)")?;
        if breakpoints.len() % 2 != 0 {
            return Err(QualifierError::invalid_arguments(
                "changed expects version/form pairs after the base form",
            ));
        }

        let mut active: Option<(usize, &Node)> = None;
        for pair in breakpoints.chunks_exact(2) {
            let position = args::known_position(ctx, &pair[0])?;
            if position > ctx.position() {
                continue;
            }
            if active.map_or(true, |(best, _)| position >= best) {
                active = Some((position, &pair[1]));
            }
        }

        let form = active.map_or(base, |(_, form)| form);
        Ok(ResolverResult::single(form.clone()))
    }
}
