//! Argument decoding shared by the bundled qualifiers

use vqc_engine::{QualifierError, VersionContext};
use vqc_tree::{Node, Version};

/// Split `args` into a leading argument and the trailing forms
pub(crate) fn split_head<'a>(
    args: &'a [Node],
    usage: &str,
) -> Result<(&'a Node, &'a [Node]), QualifierError> {
    args.split_first()
        .ok_or_else(|| QualifierError::invalid_arguments(format!("expected {usage}")))
}

/// Decode a version argument without checking it is known
pub(crate) fn version(node: &Node) -> Result<Version, QualifierError> {
    Version::from_node(node).ok_or_else(|| {
        QualifierError::invalid_arguments(format!("`{node}` is not a version identifier"))
    })
}

/// Decode a version argument and locate it in declaration order
pub(crate) fn known_position(ctx: &VersionContext<'_>, node: &Node) -> Result<usize, QualifierError> {
    let version = version(node)?;
    ctx.position_of(&version)
        .ok_or_else(|| QualifierError::UnknownVersionReference {
            version,
            known: ctx.known().to_vec(),
        })
}

/// Decode a flag name
pub(crate) fn flag(node: &Node) -> Result<&str, QualifierError> {
    node.as_text()
        .ok_or_else(|| QualifierError::invalid_arguments(format!("`{node}` is not a feature flag")))
}
