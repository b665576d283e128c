//! Bundled qualifier policies
//!
//! Conditionals plugged into a [`QualifierRegistry`](vqc_engine::QualifierRegistry):
//!
//! | Tag | Expands to |
//! |---|---|
//! | `only(set, forms...)` | `forms` iff the current version is in `set` |
//! | `added(v, forms...)` | `forms` at and after `v` |
//! | `removed(v, forms...)` | `forms` strictly before `v` |
//! | `switch({v: form, ...})` | the form for the current version; keys must be exactly the known versions |
//! | `changed(base, v1, f1, ...)` | the form of the latest breakpoint not after the current version, else `base` |
//! | `feature(flag, forms...)` | `forms` iff `flag` is enabled for the current version |
//! | `feature-case(cond, form, ..., [default])` | the first form whose condition holds, else `default` |
//!
//! # Example
//!
//! ```rust
//! use vqc_engine::Compiler;
//! use vqc_policies::{default_registry, tags};
//! use vqc_tree::{KnownVersions, Node, Version};
//!
//! let registry = default_registry(None);
//! let known = KnownVersions::new(["v0", "v1", "v2"]).unwrap();
//! let tree = Node::seq([Node::invoke(tags::ADDED, [Node::str("v1"), Node::str("x")])]);
//!
//! let artifact = Compiler::new(&registry).compile("api-version", &known, &tree).unwrap();
//! assert_eq!(artifact.group_count(), 2);
//! assert_eq!(artifact.select(Some(&Version::new("v0"))).unwrap(), &Node::seq([]));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod args;
mod bundle;
mod feature;
mod manifest;
mod ordered;
mod switch;

pub use bundle::{default_registry, register_defaults, FeaturePolicies, VersionPolicies};
pub use feature::{Feature, FeatureCase};
pub use manifest::{FeatureManifest, ManifestError};
pub use ordered::{Added, Changed, Only, Removed};
pub use switch::Switch;

/// Tags the bundled qualifiers register under
pub mod tags {
    /// `only(set, forms...)`
    pub const ONLY: &str = "only";
    /// `added(v, forms...)`
    pub const ADDED: &str = "added";
    /// `removed(v, forms...)`
    pub const REMOVED: &str = "removed";
    /// `switch({v: form, ...})`
    pub const SWITCH: &str = "switch";
    /// `changed(base, v1, f1, ...)`
    pub const CHANGED: &str = "changed";
    /// `feature(flag, forms...)`
    pub const FEATURE: &str = "feature";
    /// `feature-case(cond, form, ..., [default])`
    pub const FEATURE_CASE: &str = "feature-case";
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
