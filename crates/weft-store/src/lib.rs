//! Content-addressed object store (CAOS) for the weft header store.
//!
//! Two object kinds exist: *blobs* (opaque byte strings, used for encoded
//! headers) and *trees* (ordered lists of named entries pointing at other
//! objects). Object identity is the domain-separated BLAKE3 hash of the
//! content, so writes are idempotent and reads by id are unambiguous.
//!
//! # Modules
//!
//! - [`error`] — [`StoreError`] and the [`StoreResult`] alias
//! - [`object`] — [`StoredObject`], [`Blob`], [`Tree`], [`TreeEntry`]
//! - [`traits`] — The [`ObjectStore`] trait with typed read helpers
//! - [`memory`] — In-memory [`InMemoryObjectStore`] for tests and embedding
//! - [`fs`] — Directory-backed [`FsObjectStore`] (`objects/` fanout layout)

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry, TreeIndex};
pub use traits::ObjectStore;
