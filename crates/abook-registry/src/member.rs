//! The two entity kinds that can be addressbook members.

use std::fmt;

use abook_store::{InMemoryStore, Keyed};
use abook_types::{AddressId, Addressbook, AddressbookId, Audit, Contact, ContactId, Org, OrgId};

use crate::error::RegistryResult;
use crate::registry::Registry;
use crate::validation;

/// A contact or an org: an entity with a membership set and owned
/// addresses.
///
/// The membership coordinator is written once against this trait, so
/// contacts and orgs share every rule about attach, detach, destroy, and
/// address ownership.
pub trait Member: Keyed + Default + fmt::Debug {
    fn memberships(&self) -> &[AddressbookId];
    fn memberships_mut(&mut self) -> &mut Vec<AddressbookId>;

    fn address_ids(&self) -> &[AddressId];
    fn address_ids_mut(&mut self) -> &mut Vec<AddressId>;

    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;

    fn has_assigned_key(&self) -> bool;
    fn assign_new_key(&mut self);

    /// This kind's member-id list on an addressbook.
    fn member_ids(addressbook: &Addressbook) -> &[Self::Key];
    fn member_ids_mut(addressbook: &mut Addressbook) -> &mut Vec<Self::Key>;

    /// This kind's store inside the registry.
    fn store(registry: &Registry) -> &InMemoryStore<Self>;

    /// Copy client-mutable fields from `input`.
    fn copy_mutable_fields(&mut self, input: &Self);

    /// Check entity rules and fill derived fields.
    fn normalize(&mut self) -> RegistryResult<()>;
}

impl Member for Contact {
    fn memberships(&self) -> &[AddressbookId] {
        &self.memberships
    }

    fn memberships_mut(&mut self) -> &mut Vec<AddressbookId> {
        &mut self.memberships
    }

    fn address_ids(&self) -> &[AddressId] {
        &self.address_ids
    }

    fn address_ids_mut(&mut self) -> &mut Vec<AddressId> {
        &mut self.address_ids
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn has_assigned_key(&self) -> bool {
        !self.id.is_unassigned()
    }

    fn assign_new_key(&mut self) {
        self.id = ContactId::generate();
    }

    fn member_ids(addressbook: &Addressbook) -> &[ContactId] {
        &addressbook.contact_ids
    }

    fn member_ids_mut(addressbook: &mut Addressbook) -> &mut Vec<ContactId> {
        &mut addressbook.contact_ids
    }

    fn store(registry: &Registry) -> &InMemoryStore<Self> {
        &registry.contacts
    }

    fn copy_mutable_fields(&mut self, input: &Self) {
        Contact::copy_mutable_fields(self, input);
    }

    fn normalize(&mut self) -> RegistryResult<()> {
        validation::contact(self)
    }
}

impl Member for Org {
    fn memberships(&self) -> &[AddressbookId] {
        &self.memberships
    }

    fn memberships_mut(&mut self) -> &mut Vec<AddressbookId> {
        &mut self.memberships
    }

    fn address_ids(&self) -> &[AddressId] {
        &self.address_ids
    }

    fn address_ids_mut(&mut self) -> &mut Vec<AddressId> {
        &mut self.address_ids
    }

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }

    fn has_assigned_key(&self) -> bool {
        !self.id.is_unassigned()
    }

    fn assign_new_key(&mut self) {
        self.id = OrgId::generate();
    }

    fn member_ids(addressbook: &Addressbook) -> &[OrgId] {
        &addressbook.org_ids
    }

    fn member_ids_mut(addressbook: &mut Addressbook) -> &mut Vec<OrgId> {
        &mut addressbook.org_ids
    }

    fn store(registry: &Registry) -> &InMemoryStore<Self> {
        &registry.orgs
    }

    fn copy_mutable_fields(&mut self, input: &Self) {
        Org::copy_mutable_fields(self, input);
    }

    fn normalize(&mut self) -> RegistryResult<()> {
        validation::org(self)
    }
}
