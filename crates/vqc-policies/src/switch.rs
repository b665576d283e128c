//! Exhaustive per-version choice

use indexmap::IndexSet;
use vqc_engine::{Qualifier, QualifierError, ResolverResult, VersionContext};
use vqc_tree::{Node, Version};

use crate::args;

/// `switch({v0: f0, v1: f1, ...})`: the form keyed by the current version
///
/// The keys must be exactly the known versions, each named once. Keys that
/// spell the same version differently (`"v1"` and `v1`) count as a repeat.
/// A mismatch fails for every version, including versions that do have a
/// clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct Switch;

impl Qualifier for Switch {
    fn resolve(
        &self,
        ctx: &VersionContext<'_>,
        args: &[Node],
    ) -> Result<ResolverResult, QualifierError> {
        let clauses = match args {
            [Node::Mapping(clauses)] => clauses,
            _ => {
                return Err(QualifierError::invalid_arguments(
                    "switch expects a single mapping of version to form",
                ))
            }
        };

        let mut selected = None;
        let mut unexpected = Vec::new();
        let mut repeated = Vec::new();
        let mut covered = IndexSet::with_capacity(clauses.len());
        for (key, form) in clauses {
            let version = args::version(key)?;
            if !ctx.known().contains(&version) {
                unexpected.push(version);
                continue;
            }
            if ctx.is(&version) {
                selected = Some(form);
            }
            if !covered.insert(version.clone()) && !repeated.contains(&version) {
                repeated.push(version);
            }
        }

        let missing: Vec<Version> = ctx
            .known()
            .iter()
            .filter(|v| !covered.contains(*v))
            .cloned()
            .collect();

        match selected {
            Some(form) if missing.is_empty() && unexpected.is_empty() && repeated.is_empty() => {
                Ok(ResolverResult::single(form.clone()))
            }
            _ => Err(QualifierError::IncompleteOrMismatchedSwitch {
                missing,
                unexpected,
                repeated,
            }),
        }
    }
}
