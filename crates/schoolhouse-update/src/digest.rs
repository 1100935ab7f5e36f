//! SHA-256 content digests used for change detection.
//!
//! A digest tells whether two contents differ. It says nothing about who
//! produced them.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of an artifact's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Hash the given content.
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(hasher.finalize().into())
    }

    /// Parse a 64-character hex digest (either case).
    pub fn from_hex(text: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(text.trim(), &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Returns `true` when `remote` differs from `local` byte-for-byte.
pub fn is_update(local: &[u8], remote: &[u8]) -> bool {
    ContentDigest::of(local) != ContentDigest::of(remote)
}
