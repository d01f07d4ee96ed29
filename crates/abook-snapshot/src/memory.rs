use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::document::AddressbookDocument;
use crate::error::{SnapshotError, SnapshotResult};
use crate::traits::SnapshotStore;

/// In-memory snapshot store for tests and embedding.
///
/// Holds the last exported snapshot and counts exports. Data is lost when
/// the store is dropped.
#[derive(Debug, Default)]
pub struct InMemorySnapshot {
    documents: RwLock<Vec<AddressbookDocument>>,
    exports: AtomicUsize,
}

impl InMemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose first import returns `documents`.
    pub fn with_documents(documents: Vec<AddressbookDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
            exports: AtomicUsize::new(0),
        }
    }

    /// Number of exports performed so far.
    pub fn export_count(&self) -> usize {
        self.exports.load(Ordering::SeqCst)
    }

    /// The currently held snapshot.
    pub fn documents(&self) -> SnapshotResult<Vec<AddressbookDocument>> {
        self.import()
    }
}

impl SnapshotStore for InMemorySnapshot {
    fn import(&self) -> SnapshotResult<Vec<AddressbookDocument>> {
        let documents = self
            .documents
            .read()
            .map_err(|_| SnapshotError::LockPoisoned)?;
        Ok(documents.clone())
    }

    fn export(&self, documents: &[AddressbookDocument]) -> SnapshotResult<()> {
        let mut held = self
            .documents
            .write()
            .map_err(|_| SnapshotError::LockPoisoned)?;
        *held = documents.to_vec();
        self.exports.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
