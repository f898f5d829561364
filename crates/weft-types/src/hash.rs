//! Block-level hash identifiers.
//!
//! All three hashes are opaque 32-byte digests. [`BlockHash`] carries the
//! total (lexicographic) order used for tree-entry and ref-name sorting, and
//! a base64url codec because it appears verbatim in on-disk ref names.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

fn bytes32(data: &[u8]) -> Result<[u8; 32], TypeError> {
    if data.len() != 32 {
        return Err(TypeError::InvalidLength {
            expected: 32,
            actual: data.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(data);
    Ok(arr)
}

/// Content digest identifying a block header.
///
/// Ordered lexicographically on the raw bytes. Together with the height
/// this forms the total order on header keys used for tree-entry and
/// leaf sorting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockHash([u8; 32]);

impl BlockHash {
    /// Wrap a pre-computed digest.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Unpadded base64url encoding (RFC 4648), 43 characters.
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parse from unpadded base64url.
    pub fn from_base64url(s: &str) -> Result<Self, TypeError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| TypeError::InvalidBase64(e.to_string()))?;
        Ok(Self(bytes32(&bytes)?))
    }

    /// Short hex form for logs (first 4 bytes).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.short_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64url())
    }
}

/// Digest of a block's payload (transaction set and outputs).
///
/// The store never dereferences this; it is carried opaquely in the header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadHash({})", hex::encode(&self.0[..4]))
    }
}

/// Digest identifying a single transaction.
///
/// Used only by fork reconciliation, which shuttles sets of these between
/// the abandoned and adopted branches.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}
