use weft_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, StoredObject, Tree, TreeEntry, TreeIndex};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same data always produces the
///   same id, and re-writing it is a no-op on disk.
/// - Concurrent reads are always safe (objects are immutable).
/// - The store never interprets object contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed id.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed id.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Write raw bytes as a blob object.
    fn write_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write(&Blob::new(data.to_vec()).to_stored_object())
    }

    /// Write a tree object.
    fn write_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    /// Read a blob's bytes. Fails with [`StoreError::NotFound`] if absent.
    fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let obj = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        Ok(Blob::from_stored_object(&obj)?.data)
    }

    /// Read and decode a tree object. Fails with [`StoreError::NotFound`]
    /// if absent.
    fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        let obj = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        Tree::from_stored_object(&obj)
    }

    /// Random-access read of a single tree entry.
    ///
    /// Fails with [`StoreError::OutOfBounds`] when the index does not name
    /// an entry of the tree.
    fn read_tree_entry(&self, id: &ObjectId, index: TreeIndex) -> StoreResult<TreeEntry> {
        let tree = self.read_tree(id)?;
        let len = tree.len();
        tree.entry(index)
            .cloned()
            .ok_or(StoreError::OutOfBounds {
                id: *id,
                index,
                len,
            })
    }
}
