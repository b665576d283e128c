//! Feature-flag qualifiers
//!
//! Both qualifiers read the flags of the current version from a shared
//! [`FeatureManifest`]. A flag that no version mentions is an error rather
//! than a silently false condition.

use std::sync::Arc;

use vqc_engine::{Qualifier, QualifierError, ResolverResult, VersionContext};
use vqc_tree::Node;

use crate::args;
use crate::manifest::FeatureManifest;

/// `feature(flag, forms...)`: forms iff `flag` is enabled for the current version
#[derive(Debug, Clone)]
pub struct Feature {
    manifest: Arc<FeatureManifest>,
}

impl Feature {
    /// Create over a manifest
    #[inline]
    #[must_use]
    pub fn new(manifest: Arc<FeatureManifest>) -> Self {
        Self { manifest }
    }
}

impl Qualifier for Feature {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let (flag, forms) = args::split_head(args, "feature(flag, forms...)")?;
        let flag = known_flag(&self.manifest, flag)?;
        let enabled = self.manifest.is_enabled(ctx.version(), flag);
        Ok(ResolverResult::include_if(enabled, forms))
    }
}

/// `feature-case(cond1, form1, cond2, form2, ..., [default])`
///
/// The first clause whose condition holds wins. A condition is a flag, or a
/// set of flags that holds when any one of them is enabled. A sequence of
/// flags is read the same way as a set but is deprecated. With no clause
/// active the trailing default is used when present, otherwise the slot is
/// deleted.
#[derive(Debug, Clone)]
pub struct FeatureCase {
    manifest: Arc<FeatureManifest>,
}

impl FeatureCase {
    /// Create over a manifest
    #[inline]
    #[must_use]
    pub fn new(manifest: Arc<FeatureManifest>) -> Self {
        Self { manifest }
    }

    fn condition_holds(&self, ctx: &VersionContext<'_>, condition: &Node) -> Result<bool, QualifierError> {
        let flags: Vec<&Node> = match condition {
            Node::Set(flags) => flags.iter().collect(),
            Node::Sequence(flags) => {
                tracing::warn!(
                    condition = %condition,
                    "feature-case flag lists as sequences are deprecated; use a set of flags"
                );
                flags.iter().collect()
            }
            flag => vec![flag],
        };

        let mut holds = false;
        for flag in flags {
            let flag = known_flag(&self.manifest, flag)?;
            holds |= self.manifest.is_enabled(ctx.version(), flag);
        }
        Ok(holds)
    }
}

impl Qualifier for FeatureCase {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let clauses = args.chunks_exact(2);
        let default = clauses.remainder().first();

        let mut selected = None;
        for clause in clauses {
            // Every condition is validated, even after a match.
            if self.condition_holds(ctx, &clause[0])? && selected.is_none() {
                selected = Some(&clause[1]);
            }
        }

        Ok(match selected.or(default) {
            Some(form) => ResolverResult::single(form.clone()),
            None => ResolverResult::Delete,
        })
    }
}

fn known_flag<'n>(manifest: &FeatureManifest, node: &'n Node) -> Result<&'n str, QualifierError> {
    let flag = args::flag(node)?;
    if manifest.is_known_flag(flag) {
        Ok(flag)
    } else {
        Err(QualifierError::UnknownFeatureReference {
            flag: flag.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vqc_engine::ErrorKind;
    use vqc_tree::KnownVersions;

    fn manifest() -> Arc<FeatureManifest> {
        Arc::new(
            FeatureManifest::new()
                .with_version("v0", ["A"])
                .with_version("v1", ["A", "B"])
                .with_version("v2", ["C"]),
        )
    }

    fn run(
        qualifier: &dyn Qualifier,
        position: usize,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let known = KnownVersions::new(["v0", "v1", "v2", "v3"]).unwrap();
        let ctx = VersionContext::at(&known, position).unwrap();
        qualifier.resolve(&ctx, args)
    }

    #[test]
    fn feature_follows_manifest() {
        let feature = Feature::new(manifest());
        let args = [Node::str("B"), Node::str("x")];
        assert_eq!(run(&feature, 0, &args).unwrap(), ResolverResult::Delete);
        assert_eq!(
            run(&feature, 1, &args).unwrap(),
            ResolverResult::Forms(vec![Node::str("x")])
        );
        // v3 is not in the manifest
        assert_eq!(run(&feature, 3, &args).unwrap(), ResolverResult::Delete);
    }

    #[test]
    fn feature_rejects_unknown_flag() {
        let err = run(&Feature::new(manifest()), 0, &[Node::str("Z")]).unwrap_err();
        assert_eq!(
            err,
            QualifierError::UnknownFeatureReference {
                flag: "Z".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::UnknownFeatureReference);
    }

    #[test]
    fn feature_case_first_active_clause_wins() {
        let case = FeatureCase::new(manifest());
        let args = [
            Node::str("B"),
            Node::str("b"),
            Node::str("A"),
            Node::str("a"),
            Node::str("fallback"),
        ];
        assert_eq!(run(&case, 0, &args).unwrap(), ResolverResult::single(Node::str("a")));
        assert_eq!(run(&case, 1, &args).unwrap(), ResolverResult::single(Node::str("b")));
        assert_eq!(
            run(&case, 2, &args).unwrap(),
            ResolverResult::single(Node::str("fallback"))
        );
    }

    #[test]
    fn feature_case_without_default_deletes() {
        let case = FeatureCase::new(manifest());
        let args = [Node::str("B"), Node::str("b")];
        assert_eq!(run(&case, 0, &args).unwrap(), ResolverResult::Delete);
    }

    #[test]
    fn feature_case_flag_set_is_any_of() {
        let case = FeatureCase::new(manifest());
        let args = [Node::set([Node::str("B"), Node::str("C")]), Node::str("bc")];
        let active: Vec<bool> = (0..4)
            .map(|p| run(&case, p, &args).unwrap() != ResolverResult::Delete)
            .collect();
        assert_eq!(active, vec![false, true, true, false]);
    }

    #[test]
    fn feature_case_flag_sequence_is_any_of() {
        let case = FeatureCase::new(manifest());
        let args = [Node::seq([Node::str("B"), Node::str("C")]), Node::str("bc")];
        assert_eq!(run(&case, 2, &args).unwrap(), ResolverResult::single(Node::str("bc")));
    }

    #[test]
    fn feature_case_validates_later_clauses() {
        let case = FeatureCase::new(manifest());
        let args = [Node::str("A"), Node::str("a"), Node::str("Z"), Node::str("z")];
        let err = run(&case, 0, &args).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFeatureReference);
    }
}
