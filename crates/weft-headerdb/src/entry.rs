use weft_refs::{encode_key, parse_key, RefError};
use weft_store::{EntryMode, TreeEntry};
use weft_types::{BlockHash, ObjectId};

/// A decoded pointer from a header node to another node in the DAG.
///
/// Tree objects store these as [`TreeEntry`] records whose name encodes
/// `(height, hash)`; decoding recovers the key alongside the object id.
/// Ordered by `(height, hash)`. Encoded names agree on the height-major
/// part of that order, which is why the header blob entry (the node's own
/// height) always sorts last in its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeaderTreeEntry {
    /// Height of the referenced header.
    pub height: u64,
    /// Hash of the referenced header.
    pub hash: BlockHash,
    /// Object id of the referenced node (tree object for ancestors, blob
    /// for the self entry).
    pub object_id: ObjectId,
}

impl HeaderTreeEntry {
    /// The tree-entry name for this pointer.
    pub fn name(&self) -> String {
        encode_key(self.height, &self.hash)
    }

    /// Encode as a stored tree entry with the given mode.
    pub fn to_tree_entry(&self, mode: EntryMode) -> TreeEntry {
        TreeEntry::new(mode, self.name(), self.object_id)
    }

    /// Decode a stored tree entry back into a header pointer.
    pub fn from_tree_entry(entry: &TreeEntry) -> Result<Self, RefError> {
        let (height, hash) = parse_key(&entry.name)?;
        Ok(Self {
            height,
            hash,
            object_id: entry.object_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(height: u64, hash_byte: u8) -> HeaderTreeEntry {
        HeaderTreeEntry {
            height,
            hash: BlockHash::from_bytes([hash_byte; 32]),
            object_id: ObjectId::from_hash([0xaa; 32]),
        }
    }

    #[test]
    fn tree_entry_roundtrip() {
        let e = entry(42, 0x11);
        let stored = e.to_tree_entry(EntryMode::Tree);
        assert_eq!(stored.mode, EntryMode::Tree);
        let decoded = HeaderTreeEntry::from_tree_entry(&stored).unwrap();
        assert_eq!(decoded, e);
    }

    #[test]
    fn malformed_name_fails() {
        let bad = TreeEntry::new(EntryMode::Tree, "garbage", ObjectId::from_hash([0; 32]));
        assert!(HeaderTreeEntry::from_tree_entry(&bad).is_err());
    }

    #[test]
    fn order_is_height_then_hash() {
        let a = entry(1, 0xff);
        let b = entry(2, 0x00);
        let c = entry(2, 0x01);
        assert!(a < b && b < c);
    }

    #[test]
    fn name_order_matches_entry_order() {
        let a = entry(9, 0x80);
        let b = entry(16, 0x10);
        assert!(a < b);
        assert!(a.name() < b.name());
    }
}
