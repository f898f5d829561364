//! Named references for the weft header store.
//!
//! A ref is a mutable name → object-id binding. The header store keeps two
//! namespaces: `bh/` holds one ref per stored header, `leaf/` one ref per
//! current branch tip. Ref names encode the header key as
//! `<namespace>/<hexheight>.<base64urlhash>`, chosen so that lexicographic
//! name order within a namespace equals `(height, hash)` order.
//!
//! Refs are the durability boundary of the store: an object write that is
//! never referenced is garbage, but a ref must never point at a missing or
//! partially written object.
//!
//! # Modules
//!
//! - [`error`] — [`RefError`] and the [`RefResult`] alias
//! - [`names`] — Ref-name codec, validation, and glob matching
//! - [`traits`] — The [`RefStore`] trait defining the storage interface
//! - [`memory`] — In-memory [`InMemoryRefStore`] for tests
//! - [`fs`] — Directory-backed [`FsRefStore`] (`refs/<namespace>/` layout)

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{RefError, RefResult};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{
    encode_key, format_ref, glob_match, height_glob, parse_key, parse_ref, validate_ref_name,
    Namespace,
};
pub use traits::RefStore;
