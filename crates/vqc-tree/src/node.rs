//! Generic value tree
//!
//! [`Node`] is the vocabulary every stage of the compiler works on: scalars,
//! ordered sequences, unordered sets, mappings, and qualifier invocations.
//! Nodes are immutable values; rewriting always builds new nodes.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hash::{ContentHash, Fingerprinter};

// Fingerprint kind bytes. Stable across releases: emitted artifacts may
// persist group fingerprints.
const KIND_NIL: u8 = 0;
const KIND_BOOL: u8 = 1;
const KIND_INT: u8 = 2;
const KIND_STR: u8 = 3;
const KIND_SYMBOL: u8 = 4;
const KIND_SEQUENCE: u8 = 5;
const KIND_SET: u8 = 6;
const KIND_MAPPING: u8 = 7;
const KIND_INVOCATION: u8 = 8;

/// Leaf value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scalar {
    /// Absent value
    Nil,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Text
    Str(String),
    /// Identifier (keyword, flag or version name)
    Symbol(String),
}

impl Scalar {
    fn fingerprint(&self) -> ContentHash {
        match self {
            Self::Nil => Fingerprinter::new(KIND_NIL).finish(),
            Self::Bool(b) => Fingerprinter::new(KIND_BOOL).write_bytes(&[u8::from(*b)]).finish(),
            Self::Int(i) => Fingerprinter::new(KIND_INT).write_bytes(&i.to_le_bytes()).finish(),
            Self::Str(s) => Fingerprinter::new(KIND_STR).write_bytes(s.as_bytes()).finish(),
            Self::Symbol(s) => Fingerprinter::new(KIND_SYMBOL).write_bytes(s.as_bytes()).finish(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => f.write_str(s),
        }
    }
}

/// Qualifier tag naming the resolver an invocation is dispatched to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Create a tag
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Tag name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A conditional expansion request: a tag and its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Registry key
    pub tag: Tag,
    /// Arguments, unresolved
    pub args: Vec<Node>,
}

impl Invocation {
    /// Create an invocation
    #[inline]
    #[must_use]
    pub fn new(tag: impl Into<Tag>, args: Vec<Node>) -> Self {
        Self {
            tag: tag.into(),
            args,
        }
    }
}

/// Insertion-ordered map with unique node keys
///
/// Equality and hashing ignore insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping(IndexMap<Node, Node>);

impl Mapping {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Create with room for `capacity` pairs
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    /// Insert a pair, returning the value previously bound to the key
    ///
    /// A replaced key keeps its original position.
    #[inline]
    pub fn insert(&mut self, key: Node, value: Node) -> Option<Node> {
        self.0.insert(key, value)
    }

    /// Look up a value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &Node) -> Option<&Node> {
        self.0.get(key)
    }

    /// Check for a key
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &Node) -> bool {
        self.0.contains_key(key)
    }

    /// Number of pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate pairs in insertion order
    #[inline]
    pub fn iter(&self) -> indexmap::map::Iter<'_, Node, Node> {
        self.0.iter()
    }

    /// Iterate keys in insertion order
    #[inline]
    pub fn keys(&self) -> indexmap::map::Keys<'_, Node, Node> {
        self.0.keys()
    }

    /// Iterate values in insertion order
    #[inline]
    pub fn values(&self) -> indexmap::map::Values<'_, Node, Node> {
        self.0.values()
    }

    fn fingerprint(&self) -> ContentHash {
        let mut entries: Vec<(ContentHash, ContentHash)> = self
            .0
            .iter()
            .map(|(k, v)| (k.fingerprint(), v.fingerprint()))
            .collect();
        entries.sort_unstable();

        let mut fp = Fingerprinter::new(KIND_MAPPING);
        fp.write_len(entries.len());
        for (k, v) in &entries {
            fp.write_hash(k).write_hash(v);
        }
        fp.finish()
    }
}

impl FromIterator<(Node, Node)> for Mapping {
    /// Later pairs overwrite earlier pairs with an equal key
    fn from_iter<T: IntoIterator<Item = (Node, Node)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Mapping {
    type Item = (Node, Node);
    type IntoIter = indexmap::map::IntoIter<Node, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a Node, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, Node, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Serialized as a list of `[key, value]` pairs so non-string keys survive
// formats like JSON.
impl Serialize for Mapping {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for Mapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let pairs = Vec::<(Node, Node)>::deserialize(deserializer)?;
        let len = pairs.len();
        let mapping: Mapping = pairs.into_iter().collect();
        if mapping.len() != len {
            return Err(serde::de::Error::custom("mapping contains duplicate keys"));
        }
        Ok(mapping)
    }
}

fn deserialize_set<'de, D>(deserializer: D) -> Result<IndexSet<Node>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let members = Vec::<Node>::deserialize(deserializer)?;
    let len = members.len();
    let set: IndexSet<Node> = members.into_iter().collect();
    if set.len() != len {
        return Err(serde::de::Error::custom("set contains duplicate members"));
    }
    Ok(set)
}

/// A node in a version-qualified tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Leaf value
    Scalar(Scalar),
    /// Ordered list
    Sequence(Vec<Node>),
    /// Unordered list with unique members
    Set(#[serde(deserialize_with = "deserialize_set")] IndexSet<Node>),
    /// Key/value pairs
    Mapping(Mapping),
    /// Qualifier invocation
    Invocation(Invocation),
}

impl Node {
    /// Nil scalar
    #[inline]
    #[must_use]
    pub fn nil() -> Self {
        Self::Scalar(Scalar::Nil)
    }

    /// Boolean scalar
    #[inline]
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }

    /// Integer scalar
    #[inline]
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }

    /// String scalar
    #[inline]
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Str(value.into()))
    }

    /// Symbol scalar
    #[inline]
    #[must_use]
    pub fn symbol(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Symbol(value.into()))
    }

    /// Ordered sequence
    #[inline]
    #[must_use]
    pub fn seq(items: impl IntoIterator<Item = Node>) -> Self {
        Self::Sequence(items.into_iter().collect())
    }

    /// Unordered set; duplicates collapse
    #[inline]
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Node>) -> Self {
        Self::Set(items.into_iter().collect())
    }

    /// Mapping from pairs; later pairs win on equal keys
    #[inline]
    #[must_use]
    pub fn map(pairs: impl IntoIterator<Item = (Node, Node)>) -> Self {
        Self::Mapping(pairs.into_iter().collect())
    }

    /// Qualifier invocation
    #[inline]
    #[must_use]
    pub fn invoke(tag: impl Into<Tag>, args: impl IntoIterator<Item = Node>) -> Self {
        Self::Invocation(Invocation::new(tag, args.into_iter().collect()))
    }

    /// Borrow as invocation
    #[inline]
    #[must_use]
    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self {
            Self::Invocation(inv) => Some(inv),
            _ => None,
        }
    }

    /// Borrow as mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the text of a string or symbol scalar
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Str(s) | Scalar::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    /// Check if any invocation occurs anywhere in this tree
    #[must_use]
    pub fn contains_invocation(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Invocation(_) => true,
            Self::Sequence(items) => items.iter().any(Node::contains_invocation),
            Self::Set(items) => items.iter().any(Node::contains_invocation),
            Self::Mapping(m) => m
                .iter()
                .any(|(k, v)| k.contains_invocation() || v.contains_invocation()),
        }
    }

    /// Structural fingerprint
    ///
    /// Sets and mappings are order-independent, matching `==`.
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        match self {
            Self::Scalar(s) => s.fingerprint(),
            Self::Sequence(items) => {
                let mut fp = Fingerprinter::new(KIND_SEQUENCE);
                fp.write_len(items.len());
                for item in items {
                    fp.write_hash(&item.fingerprint());
                }
                fp.finish()
            }
            Self::Set(items) => {
                let mut members: Vec<ContentHash> = items.iter().map(Node::fingerprint).collect();
                members.sort_unstable();
                let mut fp = Fingerprinter::new(KIND_SET);
                fp.write_len(members.len());
                for member in &members {
                    fp.write_hash(member);
                }
                fp.finish()
            }
            Self::Mapping(m) => m.fingerprint(),
            Self::Invocation(inv) => {
                let mut fp = Fingerprinter::new(KIND_INVOCATION);
                fp.write_bytes(inv.tag.as_str().as_bytes());
                fp.write_len(inv.args.len());
                for arg in &inv.args {
                    fp.write_hash(&arg.fingerprint());
                }
                fp.finish()
            }
        }
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.fingerprint().as_bytes());
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Invocation> for Node {
    fn from(value: Invocation) -> Self {
        Self::Invocation(value)
    }
}

impl From<Mapping> for Node {
    fn from(value: Mapping) -> Self {
        Self::Mapping(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::str(value)
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Node>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Compact rendering for diagnostics
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Sequence(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Set(items) => {
                f.write_str("set[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Self::Mapping(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Self::Invocation(inv) => {
                write!(f, "{}(", inv.tag)?;
                write_joined(f, &inv.args)?;
                f.write_str(")")
            }
        }
    }
}
