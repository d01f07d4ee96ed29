use std::io;
use std::path::PathBuf;

/// Errors produced while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// I/O error on a snapshot file.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot could not be encoded or decoded.
    #[error("malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory backend's lock was poisoned.
    #[error("snapshot lock poisoned")]
    LockPoisoned,
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the snapshot crate.
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;
