//! # Hashing Utilities
//!
//! BLAKE3, and nothing else. Strongbox has no external system it must stay
//! hash-compatible with, so there is no SHA-256 here.
//!
//! Two shapes cover every caller:
//!
//! - [`blake3_hash`] for plain content hashing.
//! - [`domain_separated_hash`] whenever the output is bound to a purpose
//!   (authorization digests, derived contract addresses). It uses BLAKE3's
//!   `derive_key` mode, which swaps the internal IV based on the context
//!   string, so two contexts can never collide on the same input.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::DIGEST_LENGTH;

/// A 32-byte hash output.
///
/// Rendered and serialized as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses hex, with or without a `0x` prefix. `None` on any malformed input.
    pub fn from_hex(s: &str) -> Option<Self> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed).ok()?;
        let arr: [u8; DIGEST_LENGTH] = bytes.as_slice().try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid digest hex"))
    }
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use strongbox_protocol::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"strongbox");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// `domain_separated_hash("a", x)` and `domain_separated_hash("b", x)` never
/// collide. Don't prepend tags manually; `derive_key` does it properly.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Domain-separated hash over several parts fed sequentially.
///
/// Callers are responsible for making the encoding unambiguous: every part
/// in this crate is fixed-width, so concatenation is canonical.
pub fn domain_separated_hash_multi(context: &str, parts: &[&[u8]]) -> Digest {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    Digest(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_deterministic() {
        assert_eq!(blake3_hash(b"same"), blake3_hash(b"same"));
        assert_ne!(blake3_hash(b"same"), blake3_hash(b"different"));
    }

    #[test]
    fn test_domain_separation() {
        let data = b"identical payload";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
        assert_ne!(a, blake3_hash(data));
    }

    #[test]
    fn test_multi_matches_concatenation() {
        let joined = domain_separated_hash("ctx", b"helloworld");
        let parts = domain_separated_hash_multi("ctx", &[b"hello", b"world"]);
        assert_eq!(parts.as_bytes(), &joined);
    }

    #[test]
    fn test_digest_hex_roundtrip() {
        let digest = Digest::from_bytes(blake3_hash(b"roundtrip"));
        assert_eq!(Digest::from_hex(&digest.to_hex()), Some(digest));
        assert_eq!(Digest::from_hex(&digest.to_string()), Some(digest));
        assert_eq!(Digest::from_hex("0x1234"), None);
    }
}
