use weft_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher derives its key from a domain context string, so a blob
/// and a tree object with identical bytes produce different ids. Domain
/// strings are part of the on-disk format; changing one changes every
/// object id.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects (encoded headers).
    pub const BLOB: Self = Self {
        domain: "weft-blob-v1",
    };
    /// Hasher for tree objects (header nodes with ancestor pointers).
    pub const TREE: Self = Self {
        domain: "weft-tree-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new_derive_key(self.domain);
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object id.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
