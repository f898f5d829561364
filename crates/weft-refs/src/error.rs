/// Errors from ref operations.
#[derive(Debug, thiserror::Error)]
pub enum RefError {
    /// A ref with this name already exists and overwrite was not requested.
    #[error("ref already exists: {0}")]
    AlreadyExists(String),

    /// The named ref does not exist.
    #[error("ref not found: {0}")]
    NotFound(String),

    /// The ref name is malformed.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// The stored ref value could not be decoded.
    #[error("corrupt ref {name}: {reason}")]
    CorruptRef { name: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for ref operations.
pub type RefResult<T> = Result<T, RefError>;
