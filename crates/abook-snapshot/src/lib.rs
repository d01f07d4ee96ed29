//! Whole-registry snapshots for the addressbook registry.
//!
//! The registry persists write-through: after every successful mutation the
//! complete addressbook collection is handed to a [`SnapshotStore`], and at
//! startup the collection is read back from it. This crate owns the
//! document shape of that collection and the backends that store it.
//!
//! # Document Shape
//!
//! A snapshot is an ordered list of [`AddressbookDocument`]s. Each one nests
//! the addressbook model, its member contacts and orgs, and each member's
//! addresses. A member of several addressbooks is repeated under each of
//! them; readers rebuild membership sets from the nesting.
//!
//! # Backends
//!
//! - [`JsonFileSnapshot`] -- `data.json` with a `seed.json` fallback,
//!   written atomically via a temporary file and rename
//! - [`InMemorySnapshot`] -- for tests and embedding

pub mod config;
pub mod document;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::SnapshotConfig;
pub use document::{AddressbookDocument, MemberDocument};
pub use error::{SnapshotError, SnapshotResult};
pub use file::JsonFileSnapshot;
pub use memory::InMemorySnapshot;
pub use traits::SnapshotStore;
