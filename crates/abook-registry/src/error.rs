use std::fmt::Display;

use abook_store::StoreError;

/// Errors produced by registry operations.
///
/// Callers can tell the four kinds apart and decide on retries themselves;
/// the registry never retries internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A referenced id is absent, or is not a member of the stated parent.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The entity or relation already exists.
    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },

    /// The request violates an entity rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Two indexes disagree. This is a broken invariant, not a user error.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl RegistryError {
    pub fn not_found(kind: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn duplicate(kind: &'static str, id: impl Display) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Build an inconsistency error and log it at error level.
    pub fn inconsistency(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(%reason, "registry invariant broken");
        Self::InternalInconsistency(reason)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_inconsistency(&self) -> bool {
        matches!(self, Self::InternalInconsistency(_))
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::LockPoisoned { .. } => Self::inconsistency(err.to_string()),
        }
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Reinterpret a store failure on an id the registry itself just read from
/// another index: a miss there means the indexes disagree.
pub(crate) fn expect_indexed(context: impl Display) -> impl FnOnce(StoreError) -> RegistryError {
    move |err| RegistryError::inconsistency(format!("{context}: {err}"))
}
