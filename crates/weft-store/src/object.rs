use std::fmt;

use serde::{Deserialize, Serialize};
use weft_crypto::ContentHasher;
use weft_types::ObjectId;

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (an encoded block header).
    Blob,
    /// Listing of named entries referencing other objects.
    Tree,
}

impl ObjectKind {
    /// Single-byte tag used by the filesystem backend.
    pub fn tag(self) -> u8 {
        match self {
            Self::Blob => b'B',
            Self::Tree => b'T',
        }
    }

    /// Parse the single-byte tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'B' => Some(Self::Blob),
            b'T' => Some(Self::Tree),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// The store never interprets the data; it is a pure key-value store keyed
/// by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed id for this object.
    ///
    /// Uses the domain-separated hasher for each object kind, so a blob and
    /// a tree with identical bytes get distinct ids.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Blob => &ContentHasher::BLOB,
            ObjectKind::Tree => &ContentHasher::TREE,
        };
        hasher.hash(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Blob {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected blob, got {}", obj.kind),
            });
        }
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Storage mode of a tree entry: what kind of object it points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Entry points at a blob.
    Blob,
    /// Entry points at another tree.
    Tree,
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Storage mode of the referenced object.
    pub mode: EntryMode,
    /// Entry name. Names sort bytewise; the tree keeps them sorted.
    pub name: String,
    /// Content-addressed id of the referenced object.
    pub object_id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Position of an entry within a tree's sorted entry list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeIndex {
    /// Offset from the first (smallest-name) entry.
    FromStart(usize),
    /// Offset from the last entry; `FromEnd(0)` is the last entry.
    FromEnd(usize),
}

impl fmt::Display for TreeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromStart(i) => write!(f, "{i}"),
            Self::FromEnd(i) => write!(f, "-{}", i + 1),
        }
    }
}

/// Tree object: a sorted list of named pointers to other objects.
///
/// A tree object must never be empty. The hash of a tree is a deterministic
/// function of its entries, so equal entry lists dedup on write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted bytewise by name.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name for deterministic hashing.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Convert into a `StoredObject` for storage.
    ///
    /// Fails with [`StoreError::EmptyTree`] for a tree with no entries.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        if self.entries.is_empty() {
            return Err(StoreError::EmptyTree);
        }
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    /// Decode from a `StoredObject`.
    ///
    /// An empty entry list in the stored bytes is treated as corruption.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Tree {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected tree, got {}", obj.kind),
            });
        }
        let tree: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if tree.entries.is_empty() {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: "tree object has no entries".into(),
            });
        }
        Ok(tree)
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Random-access read of a single entry.
    pub fn entry(&self, index: TreeIndex) -> Option<&TreeEntry> {
        match index {
            TreeIndex::FromStart(i) => self.entries.get(i),
            TreeIndex::FromEnd(i) => {
                let len = self.entries.len();
                if i < len {
                    self.entries.get(len - 1 - i)
                } else {
                    None
                }
            }
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new(b"header bytes".to_vec());
        let stored = blob.to_stored_object();
        let decoded = Blob::from_stored_object(&stored).unwrap();
        assert_eq!(blob, decoded);
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Tree, "cc", oid(3)),
            TreeEntry::new(EntryMode::Tree, "aa", oid(1)),
            TreeEntry::new(EntryMode::Blob, "bb", oid(2)),
        ]);
        let names: Vec<_> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn tree_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Tree, "ancestor", oid(1)),
            TreeEntry::new(EntryMode::Blob, "self", oid(2)),
        ]);
        let stored = tree.to_stored_object().unwrap();
        let decoded = Tree::from_stored_object(&stored).unwrap();
        assert_eq!(tree, decoded);
    }

    #[test]
    fn empty_tree_rejected_on_write() {
        let tree = Tree::new(vec![]);
        assert!(matches!(
            tree.to_stored_object().unwrap_err(),
            StoreError::EmptyTree
        ));
    }

    #[test]
    fn empty_tree_rejected_on_read() {
        let data = serde_json::to_vec(&Tree { entries: vec![] }).unwrap();
        let stored = StoredObject::new(ObjectKind::Tree, data);
        let err = Tree::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn entry_indexing() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Tree, "a", oid(1)),
            TreeEntry::new(EntryMode::Tree, "b", oid(2)),
            TreeEntry::new(EntryMode::Blob, "c", oid(3)),
        ]);
        assert_eq!(tree.entry(TreeIndex::FromStart(0)).unwrap().name, "a");
        assert_eq!(tree.entry(TreeIndex::FromEnd(0)).unwrap().name, "c");
        assert_eq!(tree.entry(TreeIndex::FromEnd(2)).unwrap().name, "a");
        assert!(tree.entry(TreeIndex::FromStart(3)).is_none());
        assert!(tree.entry(TreeIndex::FromEnd(3)).is_none());
    }

    #[test]
    fn stored_object_id_deterministic() {
        let obj = StoredObject::new(ObjectKind::Blob, b"deterministic".to_vec());
        assert_eq!(obj.compute_id(), obj.compute_id());
    }

    #[test]
    fn different_kinds_produce_different_ids() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
    }

    #[test]
    fn kind_tag_roundtrip() {
        for kind in [ObjectKind::Blob, ObjectKind::Tree] {
            assert_eq!(ObjectKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ObjectKind::from_tag(b'x'), None);
    }
}
