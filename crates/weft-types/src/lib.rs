//! Foundation types for the weft header store.
//!
//! This crate provides the identity, hash, and header types used throughout
//! the weft system. Every other weft crate depends on `weft-types`.
//!
//! # Key Types
//!
//! - [`BlockHash`] — 32-byte block identifier with lexicographic ordering
//! - [`ObjectId`] — Content-addressed identifier for stored objects
//! - [`BlockHeader`] — Proof-of-work block header with its canonical codec
//! - [`ChainId`] / [`ChainVersion`] — Chain and protocol identifiers
//! - [`Target`] / [`Weight`] — Proof-of-work difficulty and accumulated work

pub mod chain;
pub mod error;
pub mod hash;
pub mod header;
pub mod object;
pub mod work;

pub use chain::{ChainId, ChainVersion};
pub use error::TypeError;
pub use hash::{BlockHash, PayloadHash, TxHash};
pub use header::BlockHeader;
pub use object::ObjectId;
pub use work::{Target, Weight};
