//! Content-addressed block-header database with O(log h) ancestor lookup.
//!
//! Each chain's mined headers form a DAG growing monotonically from
//! genesis. This crate indexes that DAG over a content-addressed object
//! store and a named-reference index: every header becomes a tree object
//! pointing at its parent, at a spectrum of geometrically spaced
//! ancestors, and at its own encoded bytes. The spectrum is what makes
//! height-indexed ancestor lookup logarithmic in chain length.
//!
//! # Architecture
//!
//! - [`spectrum`](spectrum::spectrum) — which ancestor heights a new node
//!   references (pure function)
//! - [`HeaderDb`] — insert, key lookup, ancestor walk, leaf and rank
//!   enumeration, all behind one read-write gate
//! - [`RankIter`] / [`AncestorIter`] — lazy header sequences
//!
//! Consensus-side concerns (fork choice, header validation beyond
//! self-consistency, payload storage) live with the callers.
//!
//! # Modules
//!
//! - [`error`] — [`HeaderDbError`] and the [`HeaderDbResult`] alias
//! - [`spectrum`] — Spectrum computation and its tuning constants
//! - [`entry`] — [`HeaderTreeEntry`], the decoded ancestor pointer
//! - [`db`] — The [`HeaderDb`] handle
//! - [`iter`] — Lazy enumeration types

pub mod db;
pub mod entry;
pub mod error;
pub mod iter;
pub mod spectrum;

pub use db::{HeaderDb, HeaderDbConfig, Insertion};
pub use entry::HeaderTreeEntry;
pub use error::{HeaderDbError, HeaderDbResult};
pub use iter::{AncestorIter, RankIter};
