use crate::document::AddressbookDocument;
use crate::error::SnapshotResult;

/// Persistence collaborator of the registry.
///
/// Implementations must round-trip the full document graph: whatever
/// `export` is given, a later `import` returns an equivalent list.
pub trait SnapshotStore: Send + Sync {
    /// Read the most recent snapshot. An empty list means "no data yet".
    fn import(&self) -> SnapshotResult<Vec<AddressbookDocument>>;

    /// Replace the stored snapshot with `documents`.
    fn export(&self, documents: &[AddressbookDocument]) -> SnapshotResult<()>;
}
