use weft_types::ObjectId;

use crate::error::RefResult;

/// Mutable name → object-id index.
///
/// Implementations must make `set_ref` atomic with respect to readers: a
/// concurrent `lookup_ref` observes either the old binding or the new one,
/// never a torn value. Ref writes are the store's durability boundary.
pub trait RefStore: Send + Sync {
    /// Create or replace a ref.
    ///
    /// Fails with [`RefError::AlreadyExists`] if the ref exists and
    /// `overwrite` is `false`.
    ///
    /// [`RefError::AlreadyExists`]: crate::error::RefError::AlreadyExists
    fn set_ref(&self, name: &str, id: ObjectId, overwrite: bool) -> RefResult<()>;

    /// Delete a ref. Fails with [`RefError::NotFound`] if absent.
    ///
    /// [`RefError::NotFound`]: crate::error::RefError::NotFound
    fn delete_ref(&self, name: &str) -> RefResult<()>;

    /// Look up a ref. Returns `Ok(None)` if absent.
    fn lookup_ref(&self, name: &str) -> RefResult<Option<ObjectId>>;

    /// Enumerate refs whose name matches a glob pattern (`*` wildcard
    /// anywhere). Ordering is unspecified; callers sort.
    fn list_refs(&self, pattern: &str) -> RefResult<Vec<String>>;
}
