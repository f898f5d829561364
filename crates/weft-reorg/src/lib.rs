//! Fork reconciliation for the weft header store.
//!
//! When consensus abandons one branch for another, the transactions that
//! were mined only on the abandoned branch must go back to the mempool.
//! [`reconcile`] walks both branches down to their least common ancestor
//! and returns exactly that set: every transaction present on the old
//! branch and absent from the new one.
//!
//! Payload contents are not stored here; a lookup function mapping a
//! header to its transaction set is injected by the caller.

pub mod error;
pub mod reconcile;

pub use error::{ReorgError, ReorgResult};
pub use reconcile::{reconcile, reconcile_with_limit, DEFAULT_DEPTH_LIMIT};
