/// Errors from entity store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The requested key is not in the store.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A writer panicked while holding the store lock.
    #[error("{kind} store lock poisoned")]
    LockPoisoned { kind: &'static str },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
