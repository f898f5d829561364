//! Directory-backed reference store.
//!
//! Each ref is a small file under the ref root whose path is the ref name
//! and whose content is the hex-encoded object id:
//!
//! ```text
//! refs/
//!   bh/<hexheight>.<base64urlhash>
//!   leaf/<hexheight>.<base64urlhash>
//! ```
//!
//! Writes go through a temp file followed by a rename; a ref file is either
//! absent or holds a complete binding. This is what makes refs safe to use
//! as the store's durability boundary.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use weft_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::{glob_match, validate_ref_name};
use crate::traits::RefStore;

/// Filesystem-backed ref store.
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open (or create) a ref directory at the given root.
    pub fn open(root: &Path) -> RefResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ref_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl RefStore for FsRefStore {
    fn set_ref(&self, name: &str, id: ObjectId, overwrite: bool) -> RefResult<()> {
        validate_ref_name(name)?;
        let path = self.ref_path(name);
        if !overwrite && path.exists() {
            return Err(RefError::AlreadyExists(name.to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // The ref name already contains the mandatory `.` separator, so the
        // temp name must extend the full file name; truncating at the last
        // `.` would collide across hashes at the same height.
        let tmp = self.root.join(format!("{name}.tmp"));
        fs::write(&tmp, id.to_hex())?;
        fs::rename(&tmp, &path)?;
        debug!(name, id = %id.short_hex(), "set ref");
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> RefResult<()> {
        match fs::remove_file(self.ref_path(name)) {
            Ok(()) => {
                debug!(name, "deleted ref");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RefError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lookup_ref(&self, name: &str) -> RefResult<Option<ObjectId>> {
        let content = match fs::read_to_string(self.ref_path(name)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let id = ObjectId::from_hex(content.trim()).map_err(|e| RefError::CorruptRef {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(id))
    }

    fn list_refs(&self, pattern: &str) -> RefResult<Vec<String>> {
        let mut out = Vec::new();
        let namespaces = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };

        for ns_entry in namespaces {
            let ns_entry = ns_entry?;
            if !ns_entry.file_type()?.is_dir() {
                continue;
            }
            let ns_name = ns_entry.file_name().to_string_lossy().into_owned();
            for file in fs::read_dir(ns_entry.path())? {
                let file = file?;
                if !file.file_type()?.is_file() {
                    continue;
                }
                let file_name = file.file_name().to_string_lossy().into_owned();
                // Skip in-flight temp files from interrupted writes.
                if file_name.ends_with(".tmp") {
                    continue;
                }
                let name = format!("{ns_name}/{file_name}");
                if glob_match(pattern, &name) {
                    out.push(name);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn open_store(dir: &tempfile::TempDir) -> FsRefStore {
        FsRefStore::open(&dir.path().join("refs")).unwrap()
    }

    #[test]
    fn set_and_lookup() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("bh/0001.abc", oid(1), false).unwrap();
        assert_eq!(store.lookup_ref("bh/0001.abc").unwrap(), Some(oid(1)));
    }

    #[test]
    fn lookup_missing_returns_none() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.lookup_ref("bh/none").unwrap(), None);
    }

    #[test]
    fn already_exists_without_overwrite() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("leaf/0001.a", oid(1), false).unwrap();
        let err = store.set_ref("leaf/0001.a", oid(2), false).unwrap_err();
        assert!(matches!(err, RefError::AlreadyExists(_)));
    }

    #[test]
    fn overwrite_replaces_binding() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("bh/0001.a", oid(1), false).unwrap();
        store.set_ref("bh/0001.a", oid(2), true).unwrap();
        assert_eq!(store.lookup_ref("bh/0001.a").unwrap(), Some(oid(2)));
    }

    #[test]
    fn delete_and_not_found() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("leaf/0001.a", oid(1), false).unwrap();
        store.delete_ref("leaf/0001.a").unwrap();
        assert!(matches!(
            store.delete_ref("leaf/0001.a").unwrap_err(),
            RefError::NotFound(_)
        ));
    }

    #[test]
    fn list_refs_by_glob() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("bh/0001.a", oid(1), false).unwrap();
        store.set_ref("bh/0002.b", oid(2), false).unwrap();
        store.set_ref("leaf/0002.b", oid(2), false).unwrap();

        let mut bh = store.list_refs("bh/*").unwrap();
        bh.sort();
        assert_eq!(bh, vec!["bh/0001.a", "bh/0002.b"]);

        let all = store.list_refs("*").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(&dir);
            store.set_ref("bh/0005.x", oid(5), false).unwrap();
        }
        let store = open_store(&dir);
        assert_eq!(store.lookup_ref("bh/0005.x").unwrap(), Some(oid(5)));
    }

    #[test]
    fn corrupt_ref_content_surfaces() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set_ref("bh/0001.a", oid(1), false).unwrap();
        fs::write(dir.path().join("refs/bh/0001.a"), "not hex").unwrap();
        let err = store.lookup_ref("bh/0001.a").unwrap_err();
        assert!(matches!(err, RefError::CorruptRef { .. }));
    }

    #[test]
    fn traversal_names_rejected() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let err = store.set_ref("bh/../../escape", oid(1), false).unwrap_err();
        assert!(matches!(err, RefError::InvalidRefName { .. }));
    }

    #[test]
    fn concurrent_writes_at_one_height_stay_distinct() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let store = Arc::new(open_store(&dir));

        // Forked headers share a height, so their ref names differ only in
        // the hash part after the separator. Writers must never share a
        // temp file.
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let name = format!("bh/0000000000000005.fork{i}");
                    for _ in 0..50 {
                        store.set_ref(&name, oid(i), true).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8u8 {
            let name = format!("bh/0000000000000005.fork{i}");
            assert_eq!(store.lookup_ref(&name).unwrap(), Some(oid(i)));
        }
    }
}
