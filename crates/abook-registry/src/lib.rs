//! Membership-indexed entity registry for addressbooks.
//!
//! This crate is the heart of the workspace. It provides:
//! - [`Registry`], which owns the addressbook, contact, org, and address
//!   stores and keeps them mutually consistent
//! - the membership coordinator: attach, detach, full destroy, and
//!   addressbook cascade delete
//! - the implicit "all" addressbook, created at bootstrap when absent
//! - entity validation rules ([`validation`])
//! - a [`ConsistencyValidator`] that audits every cross-index invariant
//!
//! # Membership Model
//!
//! Contacts and orgs are top-level entities that can belong to any number
//! of addressbooks. The relation is stored twice: as the entity's
//! membership set and as the addressbook's member-id list. For every
//! addressbook `A` and entity `E`, `E.memberships ∋ A.id` exactly when
//! `A`'s member list contains `E.id`.
//!
//! Detaching an entity from a custom addressbook only removes that one
//! relation. Detaching it from "all" destroys it everywhere, including its
//! addresses.
//!
//! # Concurrency
//!
//! Each store guards its own map. On top of that, every multi-index
//! mutation runs under the registry's exclusive gate and every read under
//! the shared gate, so no reader ever sees half of a membership change.

pub mod consistency;
mod coordinator;
mod entities;
pub mod error;
pub mod member;
pub mod registry;
pub mod validation;

pub use consistency::{ConsistencyReport, ConsistencyValidator, Violation, ViolationKind};
pub use coordinator::DetachOutcome;
pub use error::{RegistryError, RegistryResult};
pub use member::Member;
pub use registry::{Registry, RegistryStats};
