//! Error types for the compiler
//!
//! Every failure is fatal to the compilation (or runtime selection) in
//! progress. Callers branch on [`ErrorKind`] rather than on message text.
//!
//! - [`QualifierError`]: returned by resolvers
//! - [`ResolveError`]: fixed-point resolution and tree walking
//! - [`CompileError`]: the version driver
//! - [`DispatchError`]: runtime version selection
//! - [`ArtifactError`]: loading a serialized dispatch table
//! - [`ConfigError`]: configuration loading

use std::fmt::Display;

use vqc_tree::{Node, Tag, Version, VersionError};

use crate::artifact::GroupId;
use crate::resolver::Form;

/// Closed classification of every failure the compiler reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mapping key or value did not resolve to exactly one form
    MultiFormInSlot,
    /// A root invocation did not resolve to exactly one form
    RootMultiplicityViolation,
    /// Fixed-point resolution did not stabilize
    PassLimitExceeded,
    /// A `switch` key set differs from the known versions
    IncompleteOrMismatchedSwitch,
    /// A version argument is not a known version
    UnknownVersionReference,
    /// A feature flag is not in the manifest
    UnknownFeatureReference,
    /// Runtime selector unbound or bound to an unknown version
    UnboundOrUnknownRuntimeVersion,
    /// An invocation tag has no registered qualifier
    UnknownQualifier,
    /// A qualifier received malformed arguments
    InvalidArguments,
    /// Compilation was asked to target no versions
    EmptyVersionSet,
    /// A version was listed twice when building the known versions
    DuplicateVersion,
    /// Configuration failed to load or validate
    InvalidConfig,
    /// A deserialized dispatch table is inconsistent
    InvalidArtifact,
}

impl From<&VersionError> for ErrorKind {
    fn from(err: &VersionError) -> Self {
        match err {
            VersionError::Duplicate(_) => Self::DuplicateVersion,
        }
    }
}

/// Errors returned by qualifier resolvers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualifierError {
    /// `switch` keys are not exactly the known versions
    #[error(
        "switch must cover exactly the known versions (missing: {}, unexpected: {}, repeated: {})",
        join(.missing),
        join(.unexpected),
        join(.repeated)
    )]
    IncompleteOrMismatchedSwitch {
        /// Known versions without a clause
        missing: Vec<Version>,
        /// Clauses naming versions outside the known set
        unexpected: Vec<Version>,
        /// Known versions with more than one clause
        repeated: Vec<Version>,
    },

    /// A version argument names a version outside the known set
    #[error("unknown version referenced: {version} (known: {})", join(.known))]
    UnknownVersionReference {
        /// Offending version
        version: Version,
        /// The known versions
        known: Vec<Version>,
    },

    /// A feature flag absent from the manifest
    #[error("unknown feature flag: {flag}")]
    UnknownFeatureReference {
        /// Offending flag
        flag: String,
    },

    /// Arity or shape error in the invocation arguments
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

impl QualifierError {
    /// Create an invalid-arguments error
    #[inline]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// Classify
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IncompleteOrMismatchedSwitch { .. } => ErrorKind::IncompleteOrMismatchedSwitch,
            Self::UnknownVersionReference { .. } => ErrorKind::UnknownVersionReference,
            Self::UnknownFeatureReference { .. } => ErrorKind::UnknownFeatureReference,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
        }
    }
}

/// Which side of a mapping pair failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Mapping key
    Key,
    /// Mapping value
    Value,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Value => f.write_str("value"),
        }
    }
}

/// Errors during resolution of one version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A mapping slot resolved to zero or several forms
    #[error(
        "mapping {slot} `{node}` resolved to {count} forms for version {version}, expected exactly one"
    )]
    MultiFormInSlot {
        /// Key or value
        slot: SlotKind,
        /// The slot as written
        node: Box<Node>,
        /// Version being resolved
        version: Version,
        /// Number of forms produced
        count: usize,
    },

    /// The root invocation did not resolve to exactly one node
    #[error(
        "root `{node}` must resolve to exactly one form for version {version}, got [{}]",
        join(.forms)
    )]
    RootMultiplicityViolation {
        /// The root as written
        node: Box<Node>,
        /// Version being resolved
        version: Version,
        /// What it resolved to
        forms: Vec<Form>,
    },

    /// Resolution kept changing past the pass limit
    #[error(
        "`{node}` did not reach a fixed point within {max_passes} passes for version {version} (last forms: [{}])",
        join(.last_forms)
    )]
    PassLimitExceeded {
        /// The node resolution started from
        node: Box<Node>,
        /// Version being resolved
        version: Version,
        /// Configured limit
        max_passes: usize,
        /// Forms after the final pass
        last_forms: Vec<Form>,
    },

    /// No qualifier registered for the invocation tag
    #[error("no qualifier registered for `{tag}` (version {version})")]
    UnknownQualifier {
        /// Unregistered tag
        tag: Tag,
        /// Version being resolved
        version: Version,
    },

    /// A qualifier rejected its invocation
    #[error("qualifier `{tag}` failed for version {version}: {source}")]
    Qualifier {
        /// Tag of the failing qualifier
        tag: Tag,
        /// Version being resolved
        version: Version,
        /// Underlying error
        #[source]
        source: QualifierError,
    },
}

impl ResolveError {
    /// Wrap a qualifier failure with its tag and version
    #[inline]
    pub fn qualifier(tag: &Tag, version: &Version, source: QualifierError) -> Self {
        Self::Qualifier {
            tag: tag.clone(),
            version: version.clone(),
            source,
        }
    }

    /// Classify; qualifier failures report the underlying kind
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MultiFormInSlot { .. } => ErrorKind::MultiFormInSlot,
            Self::RootMultiplicityViolation { .. } => ErrorKind::RootMultiplicityViolation,
            Self::PassLimitExceeded { .. } => ErrorKind::PassLimitExceeded,
            Self::UnknownQualifier { .. } => ErrorKind::UnknownQualifier,
            Self::Qualifier { source, .. } => source.kind(),
        }
    }

    /// The version whose resolution failed
    #[must_use]
    pub fn version(&self) -> &Version {
        match self {
            Self::MultiFormInSlot { version, .. }
            | Self::RootMultiplicityViolation { version, .. }
            | Self::PassLimitExceeded { version, .. }
            | Self::UnknownQualifier { version, .. }
            | Self::Qualifier { version, .. } => version,
        }
    }
}

/// Errors from the version driver
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// No versions to compile for
    #[error("selector `{selector}` has no known versions")]
    EmptyVersionSet {
        /// Version selector name
        selector: String,
    },

    /// A single-version request named a version outside the known set
    #[error("version {version} is not one of the known versions {}", join(.known))]
    VersionNotKnown {
        /// Requested version
        version: Version,
        /// The known versions
        known: Vec<Version>,
    },

    /// Resolution failed for some version
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Configuration is unusable
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CompileError {
    /// Classify
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyVersionSet { .. } => ErrorKind::EmptyVersionSet,
            Self::VersionNotKnown { .. } => ErrorKind::UnknownVersionReference,
            Self::Resolve(e) => e.kind(),
            Self::Config(_) => ErrorKind::InvalidConfig,
        }
    }
}

/// Errors selecting a tree at runtime
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Selector unbound, or bound to a version outside the known set
    #[error("{}", describe_runtime_version(.selector, .value.as_ref(), .known))]
    UnboundOrUnknownRuntimeVersion {
        /// Version selector name
        selector: String,
        /// Bound value, `None` if never bound
        value: Option<Version>,
        /// The known versions
        known: Vec<Version>,
    },
}

impl DispatchError {
    /// Classify
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnboundOrUnknownRuntimeVersion { .. } => ErrorKind::UnboundOrUnknownRuntimeVersion,
        }
    }
}

/// Inconsistencies in a dispatch table read back from storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// A known version has no group
    #[error("version {version} has no group")]
    UngroupedVersion {
        /// Version without an entry
        version: Version,
    },

    /// A grouped version is not a known version
    #[error("grouped version {version} is not one of the known versions {}", join(.known))]
    UnknownVersion {
        /// Offending version
        version: Version,
        /// The known versions
        known: Vec<Version>,
    },

    /// Versions are grouped out of declaration order
    #[error("grouped versions [{}] are not in declaration order", join(.grouped))]
    OutOfOrder {
        /// Grouped versions as stored
        grouped: Vec<Version>,
    },

    /// A version points at a group with no tree
    #[error("version {version} points at {group}, which has no tree")]
    MissingTree {
        /// Version referencing the group
        version: Version,
        /// Group without a tree
        group: GroupId,
    },

    /// A tree no version selects
    #[error("{group} is not selected by any version")]
    UnusedGroup {
        /// Unreferenced group
        group: GroupId,
    },

    /// Two groups carry the same tree
    #[error("{first} and {second} carry the same tree")]
    DuplicateTree {
        /// Earlier group
        first: GroupId,
        /// Later group
        second: GroupId,
    },
}

impl ArtifactError {
    /// Classify
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UngroupedVersion { .. }
            | Self::UnknownVersion { .. }
            | Self::OutOfOrder { .. }
            | Self::MissingTree { .. }
            | Self::UnusedGroup { .. }
            | Self::DuplicateTree { .. } => ErrorKind::InvalidArtifact,
        }
    }
}

/// Errors loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or schema error
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or schema error
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// Value out of range
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result alias for compilation
pub type CompileResult<T> = Result<T, CompileError>;

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_runtime_version(selector: &str, value: Option<&Version>, known: &[Version]) -> String {
    match value {
        None => format!(
            "version selector `{selector}` is not bound; expected one of [{}]",
            join(known)
        ),
        Some(value) => format!(
            "version selector `{selector}` is bound to unrecognized version `{value}`; expected one of [{}]",
            join(known)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<Version> {
        vec!["v0".into(), "v1".into()]
    }

    #[test]
    fn unbound_message_lists_versions() {
        let err = DispatchError::UnboundOrUnknownRuntimeVersion {
            selector: "api-version".to_string(),
            value: None,
            known: known(),
        };
        assert_eq!(
            err.to_string(),
            "version selector `api-version` is not bound; expected one of [v0, v1]"
        );
    }

    #[test]
    fn unrecognized_message_names_value() {
        let err = DispatchError::UnboundOrUnknownRuntimeVersion {
            selector: "api-version".to_string(),
            value: Some("v9".into()),
            known: known(),
        };
        let message = err.to_string();
        assert!(message.contains("unrecognized version `v9`"));
        assert!(message.contains("[v0, v1]"));
        assert_eq!(err.kind(), ErrorKind::UnboundOrUnknownRuntimeVersion);
    }

    #[test]
    fn duplicate_version_kind() {
        let err = vqc_tree::KnownVersions::new(["v0", "v0"]).unwrap_err();
        assert_eq!(ErrorKind::from(&err), ErrorKind::DuplicateVersion);
    }

    #[test]
    fn qualifier_error_kind_passes_through() {
        let err = ResolveError::qualifier(
            &Tag::new("switch"),
            &"v0".into(),
            QualifierError::IncompleteOrMismatchedSwitch {
                missing: vec!["v1".into()],
                unexpected: vec![],
                repeated: vec![],
            },
        );
        assert_eq!(err.kind(), ErrorKind::IncompleteOrMismatchedSwitch);
        assert!(err.to_string().contains("missing: v1"));

        let compile: CompileError = err.into();
        assert_eq!(compile.kind(), ErrorKind::IncompleteOrMismatchedSwitch);
    }

    #[test]
    fn multi_form_message() {
        let err = ResolveError::MultiFormInSlot {
            slot: SlotKind::Key,
            node: Box::new(Node::invoke("splice", [Node::int(1), Node::int(2)])),
            version: "v1".into(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "mapping key `splice(1, 2)` resolved to 2 forms for version v1, expected exactly one"
        );
        assert_eq!(err.version(), &Version::new("v1"));
    }

    #[test]
    fn config_error_conversion() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::Json(_)));
        let compile: CompileError = err.into();
        assert_eq!(compile.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn config_error_keeps_parser_source() {
        use std::error::Error as _;

        let err: ConfigError = toml::from_str::<toml::Table>("max_passes = ").unwrap_err().into();
        let source = err.source().expect("parser error is kept as source");
        assert!(source.downcast_ref::<toml::de::Error>().is_some());

        let compile = CompileError::from(err);
        assert!(compile.source().is_some());
    }
}
