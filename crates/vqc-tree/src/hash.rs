//! Structural fingerprints
//!
//! Provides [`ContentHash`], a 32-byte blake3 digest identifying a tree by
//! structure, and [`Fingerprinter`], the canonical encoder that produces it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte structural fingerprint (blake3)
///
/// Two structurally equal nodes always share a fingerprint. Serializes as a
/// lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a fingerprint from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create fingerprint from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, HashError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Digest arbitrary bytes
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Abbreviated hex form for log lines
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Canonical encoder feeding a blake3 hasher
///
/// Every write is length- or tag-prefixed so distinct shapes never encode to
/// the same byte stream.
#[derive(Debug, Clone, Default)]
pub struct Fingerprinter {
    hasher: blake3::Hasher,
}

impl Fingerprinter {
    /// Start a fingerprint for a value of the given kind
    #[inline]
    #[must_use]
    pub fn new(kind: u8) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[kind]);
        Self { hasher }
    }

    /// Append a length or count
    #[inline]
    pub fn write_len(&mut self, len: usize) -> &mut Self {
        self.hasher.update(&(len as u64).to_le_bytes());
        self
    }

    /// Append raw bytes, prefixed by their length
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len(bytes.len());
        self.hasher.update(bytes);
        self
    }

    /// Append a child fingerprint
    #[inline]
    pub fn write_hash(&mut self, hash: &ContentHash) -> &mut Self {
        self.hasher.update(hash.as_bytes());
        self
    }

    /// Finish and produce the fingerprint
    #[inline]
    #[must_use]
    pub fn finish(&self) -> ContentHash {
        ContentHash::new(*self.hasher.finalize().as_bytes())
    }
}

/// Errors decoding a fingerprint
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Wrong number of bytes
    #[error("fingerprint must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Not valid hex
    #[error("fingerprint is not valid hex: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_rejects_wrong_length() {
        let result = ContentHash::from_slice(&[1u8; 31]);
        assert!(matches!(
            result,
            Err(HashError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn display_and_parse() {
        let hash = ContentHash::compute(b"tree");
        let parsed: ContentHash = hash.to_string().parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn short_is_prefix() {
        let hash = ContentHash::compute(b"tree");
        let short = hash.short();
        assert_eq!(short.len(), 16);
        assert!(hash.to_string().starts_with(&short));
    }

    #[test]
    fn fingerprinter_separates_kinds() {
        let a = Fingerprinter::new(1).write_bytes(b"x").finish();
        let b = Fingerprinter::new(2).write_bytes(b"x").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprinter_length_prefix_prevents_concatenation_clash() {
        let a = Fingerprinter::new(0).write_bytes(b"ab").write_bytes(b"c").finish();
        let b = Fingerprinter::new(0).write_bytes(b"a").write_bytes(b"bc").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_rejects_non_hex() {
        let err = "zz".parse::<ContentHash>().unwrap_err();
        assert!(matches!(err, HashError::HexDecode(_)));
    }

    #[test]
    fn serde_json_uses_hex() {
        let hash = ContentHash::compute(b"tree");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{hash}\""));
        let decoded: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }
}
