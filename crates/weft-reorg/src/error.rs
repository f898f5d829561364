use weft_types::BlockHash;

/// Errors from fork reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReorgError {
    /// One of the two heads is not present in the store.
    #[error("head {hash:?} at height {height} is not stored")]
    MissingHead { height: u64, hash: BlockHash },

    /// No common ancestor was found within the depth bound.
    #[error("no common ancestor within {limit} headers")]
    ForkTooDeep { limit: u64 },

    /// Failure from the header database.
    #[error(transparent)]
    Db(#[from] weft_headerdb::HeaderDbError),
}

/// Result alias for reconciliation.
pub type ReorgResult<T> = Result<T, ReorgError>;
