//! The proof-of-work block header and its canonical byte codec.
//!
//! The codec is the durability format: header blobs in the object store are
//! exactly [`BlockHeader::encode`] output. Encoding is deterministic
//! (fixed field order, fixed widths, little-endian integers) and
//! `decode(encode(h)) == h` is a tested invariant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::{ChainId, ChainVersion};
use crate::error::TypeError;
use crate::hash::{BlockHash, PayloadHash};
use crate::work::{Target, Weight};

/// Domain context for the header content hash.
const HEADER_HASH_DOMAIN: &str = "weft-header-v1";

/// A mined block header.
///
/// Headers are immutable once stored. The `hash` field is the content digest
/// of every other field (see [`compute_hash`]); the store verifies this at
/// insertion time.
///
/// [`compute_hash`]: BlockHeader::compute_hash
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Protocol version of the network this header belongs to.
    pub version: ChainVersion,
    /// The chain this header extends.
    pub chain: ChainId,
    /// Distance from the genesis block.
    pub height: u64,
    /// Creation time in microseconds since the epoch.
    pub creation_time: u64,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Feature flags (reserved, zero on current networks).
    pub flags: u64,
    /// Creation time of the block that started the current difficulty epoch.
    pub epoch_start: u64,
    /// Hash of the parent header (`height - 1` on the same chain).
    pub parent: BlockHash,
    /// Digest of the block payload; the store never dereferences it.
    pub payload_hash: PayloadHash,
    /// Difficulty target this header's PoW hash must satisfy.
    pub target: Target,
    /// Accumulated work from genesis through this header.
    pub weight: Weight,
    /// Content digest of all preceding fields.
    pub hash: BlockHash,
}

impl BlockHeader {
    /// Size of the canonical encoding in bytes.
    pub const ENCODED_SIZE: usize = 208;

    /// Byte offset where the `hash` field begins (everything before it is
    /// covered by the content hash).
    const HASH_OFFSET: usize = Self::ENCODED_SIZE - 32;

    /// Returns `true` for a height-0 header.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Canonical byte encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::ENCODED_SIZE);
        out.extend_from_slice(&self.version.get().to_le_bytes());
        out.extend_from_slice(&self.chain.get().to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.creation_time.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.epoch_start.to_le_bytes());
        out.extend_from_slice(self.parent.as_bytes());
        out.extend_from_slice(self.payload_hash.as_bytes());
        out.extend_from_slice(self.target.as_bytes());
        out.extend_from_slice(self.weight.as_bytes());
        out.extend_from_slice(self.hash.as_bytes());
        debug_assert_eq!(out.len(), Self::ENCODED_SIZE);
        out
    }

    /// Decode from the canonical byte encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != Self::ENCODED_SIZE {
            return Err(TypeError::InvalidLength {
                expected: Self::ENCODED_SIZE,
                actual: bytes.len(),
            });
        }
        let mut r = FieldReader::new(bytes);
        Ok(Self {
            version: ChainVersion::new(r.u32()),
            chain: ChainId::new(r.u32()),
            height: r.u64(),
            creation_time: r.u64(),
            nonce: r.u64(),
            flags: r.u64(),
            epoch_start: r.u64(),
            parent: BlockHash::from_bytes(r.bytes32()),
            payload_hash: PayloadHash::from_bytes(r.bytes32()),
            target: Target::from_bytes(r.bytes32()),
            weight: Weight::from_bytes(r.bytes32()),
            hash: BlockHash::from_bytes(r.bytes32()),
        })
    }

    /// Content digest of the header: a domain-tagged BLAKE3 hash over the
    /// canonical encoding of every field except `hash` itself.
    pub fn compute_hash(&self) -> BlockHash {
        let encoded = self.encode();
        let mut hasher = blake3::Hasher::new_derive_key(HEADER_HASH_DOMAIN);
        hasher.update(&encoded[..Self::HASH_OFFSET]);
        BlockHash::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Returns `true` if the stored `hash` matches the recomputed digest.
    pub fn hash_is_valid(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header {}:{} {}",
            self.chain,
            self.height,
            self.hash.short_hex()
        )
    }
}

/// Cursor over a fixed-size encoded header.
///
/// All reads are bounds-checked up front by the caller's length check;
/// offsets here can never overrun.
struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u32(&mut self) -> u32 {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        u32::from_le_bytes(arr)
    }

    fn u64(&mut self) -> u64 {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        u64::from_le_bytes(arr)
    }

    fn bytes32(&mut self) -> [u8; 32] {
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&self.buf[self.pos..self.pos + 32]);
        self.pos += 32;
        arr
    }
}
