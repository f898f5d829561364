//! In-memory reference store for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::RwLock;

use weft_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::{glob_match, validate_ref_name};
use crate::traits::RefStore;

/// An in-memory implementation of [`RefStore`].
///
/// All refs live in a `HashMap` behind a `RwLock`. Data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, ObjectId>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refs currently stored.
    pub fn len(&self) -> usize {
        self.refs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no refs are stored.
    pub fn is_empty(&self) -> bool {
        self.refs.read().expect("lock poisoned").is_empty()
    }
}

impl RefStore for InMemoryRefStore {
    fn set_ref(&self, name: &str, id: ObjectId, overwrite: bool) -> RefResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().expect("lock poisoned");
        if !overwrite && refs.contains_key(name) {
            return Err(RefError::AlreadyExists(name.to_string()));
        }
        refs.insert(name.to_string(), id);
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> RefResult<()> {
        let mut refs = self.refs.write().expect("lock poisoned");
        refs.remove(name)
            .map(|_| ())
            .ok_or_else(|| RefError::NotFound(name.to_string()))
    }

    fn lookup_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs.get(name).copied())
    }

    fn list_refs(&self, pattern: &str) -> RefResult<Vec<String>> {
        let refs = self.refs.read().expect("lock poisoned");
        Ok(refs
            .keys()
            .filter(|name| glob_match(pattern, name))
            .cloned()
            .collect())
    }
}
