//! Id-keyed entity stores for the addressbook registry.
//!
//! Each entity kind (addressbooks, contacts, orgs, addresses) lives in its
//! own store. A store is a pure key-value map: it never interprets
//! membership lists or address references, and it never reaches into
//! another store. Cross-store consistency is enforced one layer up, by the
//! registry's membership coordinator.
//!
//! # Storage Backends
//!
//! All backends implement the [`EntityStore`] trait:
//!
//! - [`InMemoryStore`] -- `HashMap`-based store behind an `RwLock`
//!
//! # Design Rules
//!
//! 1. Every put/get/remove is atomic per key.
//! 2. Reads return clones; callers never hold references into the map.
//! 3. A missing key on read is [`StoreError::NotFound`]; a missing key on
//!    remove is `Ok(false)` and left to the caller to judge.
//! 4. Lock poisoning is reported as an error, never unwrapped.

pub mod error;
pub mod keyed;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use keyed::Keyed;
pub use memory::InMemoryStore;
pub use traits::EntityStore;

use abook_types::{Address, Addressbook, Contact, Org};

pub type AddressbookStore = InMemoryStore<Addressbook>;
pub type ContactStore = InMemoryStore<Contact>;
pub type OrgStore = InMemoryStore<Org>;
pub type AddressStore = InMemoryStore<Address>;
