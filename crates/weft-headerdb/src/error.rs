use weft_types::{BlockHash, ChainId, ObjectId};

/// Errors from header database operations.
#[derive(Debug, thiserror::Error)]
pub enum HeaderDbError {
    /// Insert of a header whose parent is not stored.
    #[error("missing parent {parent:?} at height {height}")]
    MissingParent { height: u64, parent: BlockHash },

    /// Genesis headers cannot pass through the normal insert path, and
    /// only genesis headers may be injected at initialization.
    #[error("invalid genesis insertion at height {height}")]
    InvalidGenesis { height: u64 },

    /// The header belongs to a different chain than this database.
    #[error("chain mismatch: database holds chain {expected}, header is for chain {actual}")]
    ChainMismatch { expected: ChainId, actual: ChainId },

    /// The header failed self-consistency checks at insertion.
    #[error("invalid header {hash:?}: {reason}")]
    InvalidHeader { hash: BlockHash, reason: String },

    /// No ancestor at the requested height is reachable from the start node.
    #[error("no ancestor at height {target} reachable from {start}")]
    AncestorNotFound { start: ObjectId, target: u64 },

    /// Stored data violates a database invariant. Fatal for the operation.
    #[error("corruption in {op} at {id}: {reason}")]
    Corruption {
        op: &'static str,
        id: String,
        reason: String,
    },

    /// The store gate was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// Failure from the object store backend.
    #[error(transparent)]
    Store(#[from] weft_store::StoreError),

    /// Failure from the ref index backend.
    #[error(transparent)]
    Refs(#[from] weft_refs::RefError),
}

/// Result alias for header database operations.
pub type HeaderDbResult<T> = Result<T, HeaderDbError>;
