//! Foundation types for the addressbook registry.
//!
//! This crate provides the identity, audit, and entity types used throughout
//! the workspace. Every other `abook` crate depends on `abook-types`.
//!
//! # Key Types
//!
//! - [`AddressbookId`], [`ContactId`], [`OrgId`], [`AddressId`]: opaque
//!   string identifiers, one newtype per entity kind
//! - [`Principal`]: the caller identity stamped into audit metadata
//! - [`Audit`]: created/modified timestamps and principals
//! - [`Addressbook`]: a named grouping holding member id lists
//! - [`Contact`] / [`Org`]: shared entities with a membership set
//! - [`Address`]: a phone/email/web/messaging/postal value owned by one
//!   contact or org
//!
//! Entities reference each other by id only. The membership set on a
//! contact or org and the member-id lists on an addressbook are two views of
//! the same relation; keeping them in agreement is the job of
//! `abook-registry`, not of these types.

pub mod address;
pub mod addressbook;
pub mod audit;
pub mod contact;
pub mod id;
pub mod org;
pub mod principal;

pub use address::{Address, AddressType, AttributeType, MessageType};
pub use addressbook::{Addressbook, ALL_ADDRESSBOOK_NAME};
pub use audit::Audit;
pub use contact::Contact;
pub use id::{AddressId, AddressbookId, ContactId, OrgId};
pub use org::{Org, OrgType};
pub use principal::Principal;
