//! Version-qualified tree compiler
//!
//! Resolves qualifier invocations in a [`Node`](vqc_tree::Node) tree for
//! every known version and compiles the results into a single tree or a
//! minimal dispatch table.
//!
//! # Architecture
//!
//! ```text
//! tree + KnownVersions → Compiler ─┬─ per version: TreeWalker → FixedPointResolver → QualifierRegistry
//!                                  └─ group by structure → CompiledArtifact (Resolved | Dispatch)
//! ```
//!
//! # Example
//!
//! ```rust
//! use vqc_engine::{Compiler, QualifierRegistry, ResolverResult};
//! use vqc_tree::{KnownVersions, Node, Version};
//!
//! let mut registry = QualifierRegistry::new();
//! registry.register_fn("beta", |ctx, args| {
//!     Ok(ResolverResult::include_if(ctx.is(&Version::new("beta")), args))
//! });
//!
//! let known = KnownVersions::new(["stable", "beta"]).unwrap();
//! let tree = Node::seq([Node::str("core"), Node::invoke("beta", [Node::str("preview")])]);
//!
//! let artifact = Compiler::new(&registry).compile("channel", &known, &tree).unwrap();
//! let beta = artifact.select(Some(&Version::new("beta"))).unwrap();
//! assert_eq!(beta, &Node::seq([Node::str("core"), Node::str("preview")]));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod artifact;
mod config;
mod context;
mod driver;
mod error;
mod registry;
mod resolver;
mod walker;

pub use artifact::{CompiledArtifact, Dispatch, GroupId};
pub use config::CompileConfig;
pub use context::VersionContext;
pub use driver::{compile, Compiler};
pub use error::{
    ArtifactError, CompileError, CompileResult, ConfigError, DispatchError, ErrorKind, QualifierError,
    ResolveError, ResolveResult, SlotKind,
};
pub use registry::{Qualifier, QualifierRegistry, ResolverResult};
pub use resolver::{FixedPointResolver, Form, DEFAULT_MAX_PASSES};
pub use walker::TreeWalker;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for writing qualifiers and driving compilation
pub mod prelude {
    pub use crate::{
        CompileConfig, CompiledArtifact, Compiler, Qualifier, QualifierError, QualifierRegistry,
        ResolverResult, VersionContext,
    };
    pub use vqc_tree::{KnownVersions, Node, Tag, Version};
}
