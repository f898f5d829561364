//! In-memory object store for tests and embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use weft_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// All objects are held behind a `RwLock` for safe concurrent access.
/// Objects are cloned on read and write. Data is lost on drop.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(id).or_insert_with(|| object.clone());
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::{Blob, EntryMode, ObjectKind, Tree, TreeEntry, TreeIndex};

    fn make_blob(content: &[u8]) -> StoredObject {
        Blob::new(content.to_vec()).to_stored_object()
    }

    fn make_tree() -> Tree {
        Tree::new(vec![
            TreeEntry::new(EntryMode::Tree, "parent", ObjectId::from_hash([1; 32])),
            TreeEntry::new(EntryMode::Blob, "self", ObjectId::from_hash([2; 32])),
        ])
    }

    // -----------------------------------------------------------------------
    // Core read/write
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello");
        let id = store.write(&obj).unwrap();
        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn write_and_read_tree() {
        let store = InMemoryObjectStore::new();
        let id = store.write_tree(&make_tree()).unwrap();
        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back.kind, ObjectKind::Tree);
        let tree = Tree::from_stored_object(&read_back).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn read_missing_returns_none() {
        let store = InMemoryObjectStore::new();
        assert!(store.read(&ObjectId::from_hash([9; 32])).unwrap().is_none());
    }

    #[test]
    fn read_blob_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        let err = store.read_blob(&ObjectId::from_hash([9; 32])).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // -----------------------------------------------------------------------
    // Content addressing
    // -----------------------------------------------------------------------

    #[test]
    fn same_content_same_id() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"identical")).unwrap();
        let id2 = store.write(&make_blob(b"identical")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_different_id() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"aaa")).unwrap();
        let id2 = store.write(&make_blob(b"bbb")).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn write_is_idempotent() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"once");
        store.write(&obj).unwrap();
        store.write(&obj).unwrap();
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    #[test]
    fn blob_helper_roundtrip() {
        let store = InMemoryObjectStore::new();
        let id = store.write_blob(b"payload").unwrap();
        assert_eq!(store.read_blob(&id).unwrap(), b"payload");
    }

    #[test]
    fn tree_helper_roundtrip() {
        let store = InMemoryObjectStore::new();
        let tree = make_tree();
        let id = store.write_tree(&tree).unwrap();
        assert_eq!(store.read_tree(&id).unwrap(), tree);
    }

    #[test]
    fn tree_entry_by_index() {
        let store = InMemoryObjectStore::new();
        let id = store.write_tree(&make_tree()).unwrap();
        let last = store.read_tree_entry(&id, TreeIndex::FromEnd(0)).unwrap();
        assert_eq!(last.name, "self");
        let first = store.read_tree_entry(&id, TreeIndex::FromStart(0)).unwrap();
        assert_eq!(first.name, "parent");
    }

    #[test]
    fn tree_entry_out_of_bounds() {
        let store = InMemoryObjectStore::new();
        let id = store.write_tree(&make_tree()).unwrap();
        let err = store
            .read_tree_entry(&id, TreeIndex::FromStart(5))
            .unwrap_err();
        assert!(matches!(err, StoreError::OutOfBounds { len: 2, .. }));
    }

    #[test]
    fn exists_reflects_writes() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"x")).unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(!store.exists(&ObjectId::from_hash([0xee; 32])).unwrap());
    }

    // -----------------------------------------------------------------------
    // Concurrent reads
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write(&make_blob(b"shared")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.read(&id).unwrap().unwrap();
                    assert_eq!(obj.compute_id(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }
}
