//! Version-qualified tree model
//!
//! The shared vocabulary of the compiler.
//!
//! # Core Concepts
//!
//! - [`Node`]: generic value tree with qualifier [`Invocation`]s
//! - [`Mapping`]: insertion-ordered map with order-insensitive equality
//! - [`Version`] / [`KnownVersions`]: the versions a compilation targets
//! - [`ContentHash`]: structural fingerprint, equal for equal trees
//!
//! # Example
//!
//! ```rust
//! use vqc_tree::{KnownVersions, Node};
//!
//! let known = KnownVersions::new(["v0", "v1"]).unwrap();
//! let tree = Node::seq([Node::invoke("added", [Node::str("v1"), Node::str("x")])]);
//!
//! assert_eq!(known.len(), 2);
//! assert!(tree.contains_invocation());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod hash;
mod node;
mod version;

pub use hash::{ContentHash, Fingerprinter, HashError};
pub use node::{Invocation, Mapping, Node, Scalar, Tag};
pub use version::{KnownVersions, Version, VersionError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
