//! Service facade over the addressbook registry.
//!
//! [`AddressbookService`] is the entry point for applications: it restores
//! a [`Registry`](abook_registry::Registry) from a snapshot store at
//! startup, runs every operation family against it, and writes the whole
//! registry back after each successful mutation.

pub mod error;
pub mod paging;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use paging::{DefaultOrder, ListQuery, DEFAULT_PAGE_SIZE};
pub use service::AddressbookService;

pub use abook_registry::{ConsistencyReport, DetachOutcome, RegistryError, RegistryStats};
pub use abook_types::{
    Address, AddressId, Addressbook, AddressbookId, Contact, ContactId, Org, OrgId, Principal,
};
