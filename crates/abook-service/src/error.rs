use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Registry(#[from] abook_registry::RegistryError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] abook_snapshot::SnapshotError),

    #[error("service lock poisoned")]
    LockPoisoned,
}

impl ServiceError {
    /// The registry error, if this is one.
    pub fn registry(&self) -> Option<&abook_registry::RegistryError> {
        match self {
            Self::Registry(err) => Some(err),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
