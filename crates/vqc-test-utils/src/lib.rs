//! Testing utilities for vqc workspace
//!
//! Shared fixtures, tree generators and tracing setup.

#![allow(missing_docs)]

use proptest::prelude::*;
use vqc_engine::{Compiler, QualifierError, QualifierRegistry, ResolverResult};
use vqc_tree::{KnownVersions, Node, Version};

/// Install a test subscriber once; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,vqc_engine=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn known(names: &[&str]) -> KnownVersions {
    KnownVersions::new(names.iter().copied()).unwrap()
}

/// `v0`, `v1`, ... `v{n-1}`
pub fn versions(n: usize) -> KnownVersions {
    KnownVersions::new((0..n).map(|i| format!("v{i}"))).unwrap()
}

/// Registry with small qualifiers that exercise the engine without any
/// bundled policy:
///
/// - `when(v, forms...)`: forms only for version `v`
/// - `since(v, forms...)`: forms for `v` and every later version
/// - `splice(forms...)`: forms, unconditionally
/// - `drop()`: always deleted
/// - `grow(n)`: never converges
pub fn test_registry() -> QualifierRegistry {
    let mut registry = QualifierRegistry::new();
    registry.register_fn("when", |ctx, args| {
        let (version, forms) = head(args)?;
        Ok(ResolverResult::include_if(ctx.is(&version), forms))
    });
    registry.register_fn("since", |ctx, args| {
        let (version, forms) = head(args)?;
        let since = ctx
            .position_of(&version)
            .ok_or_else(|| QualifierError::UnknownVersionReference {
                version,
                known: ctx.known().to_vec(),
            })?;
        Ok(ResolverResult::include_if(ctx.position() >= since, forms))
    });
    registry.register_fn("splice", |_ctx, args| Ok(ResolverResult::Forms(args.to_vec())));
    registry.register_fn("drop", |_ctx, _args| Ok(ResolverResult::Delete));
    registry.register_fn("grow", |_ctx, args| {
        Ok(ResolverResult::single(Node::invoke(
            "grow",
            args.iter().cloned().chain([Node::nil()]),
        )))
    });
    registry
}

fn head(args: &[Node]) -> Result<(Version, &[Node]), QualifierError> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| QualifierError::invalid_arguments("missing version"))?;
    let version = Version::from_node(first)
        .ok_or_else(|| QualifierError::invalid_arguments("version must be a scalar"))?;
    Ok((version, rest))
}

pub fn when(version: &str, forms: impl IntoIterator<Item = Node>) -> Node {
    Node::invoke("when", std::iter::once(Node::str(version)).chain(forms))
}

pub fn since(version: &str, forms: impl IntoIterator<Item = Node>) -> Node {
    Node::invoke("since", std::iter::once(Node::str(version)).chain(forms))
}

/// Resolve `tree` for every known version, panicking on error
pub fn resolve_each(registry: &QualifierRegistry, known: &KnownVersions, tree: &Node) -> Vec<(Version, Node)> {
    Compiler::new(registry).resolve_all(known, tree).unwrap()
}

/// Resolve `tree` for one version by name, panicking on error
pub fn resolve_at(registry: &QualifierRegistry, known: &KnownVersions, version: &str, tree: &Node) -> Node {
    Compiler::new(registry)
        .resolve_version(known, &Version::new(version), tree)
        .unwrap()
}

pub fn arb_scalar() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::nil()),
        any::<bool>().prop_map(Node::bool),
        any::<i64>().prop_map(Node::int),
        "[a-z]{0,6}".prop_map(Node::str),
        "[a-z][a-z0-9-]{0,5}".prop_map(Node::symbol),
    ]
}

/// Trees of every shape except invocations
pub fn arb_plain_node() -> impl Strategy<Value = Node> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::seq),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::set),
            prop::collection::vec((inner.clone(), inner), 0..4).prop_map(Node::map),
        ]
    })
}
